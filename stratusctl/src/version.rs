use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;

#[derive(Args)]
pub struct Arg {
    /// Client version only (no server required)
    #[clap(short, long)]
    client: bool,
}

impl Arg {
    pub async fn handle(&self) -> Result<()> {
        println!("Stratus CLI version: {}", env!("CARGO_PKG_VERSION"));

        if !self.client {
            let client = ApiClient::new()?;
            match client.installation().await {
                Ok(installation) => {
                    println!("Stratus cluster version: {}", installation.spec.version)
                },
                Err(e) => println!(
                    "Unable to get the cluster version: {}. Check if your cluster is available and has the platform installed",
                    e
                ),
            }
        }

        Ok(())
    }
}
