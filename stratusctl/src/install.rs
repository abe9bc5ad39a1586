use std::time::Duration;

use anyhow::Result;
use clap::Args;
use termion::style;

use crate::{
    client::ApiClient,
    step::{ProgressSink, TermStep},
    wait::InstallationWatcher,
    CONFIG,
};

#[derive(Args)]
pub struct Arg {
    /// Time in seconds after which the CLI stops watching the installation progress
    #[clap(long, default_value_t = 1800)]
    timeout: u64,
    /// Do not wait for the installation to complete
    #[clap(short = 'n', long)]
    no_wait: bool,
}

impl Arg {
    pub async fn handle(&self) -> Result<()> {
        let client = ApiClient::new()?;

        let mut step = TermStep::begin("Requesting the installer to install the platform");
        if let Err(e) = client.activate_installation().await {
            step.failure();
            return Err(e);
        }
        step.success();

        if !self.no_wait {
            let mut sink = TermStep::begin("Waiting for installation to start");
            let mut source = client.status_source();
            InstallationWatcher::new(Some(Duration::from_secs(self.timeout)))
                .wait(&mut source, &mut sink)
                .await?;
        }

        print_summary(&client).await
    }
}

async fn print_summary(client: &ApiClient) -> Result<()> {
    let installation = client.installation().await?;
    let status = installation.status.unwrap_or_default();
    let console_url = status
        .console_url
        .unwrap_or_else(|| "not installed".to_owned());
    let admin = client.admin_credentials().await?;

    println!();
    println!(
        "Stratus is installed in version:\t{}{}{}",
        style::Bold,
        installation.spec.version,
        style::Reset
    );
    println!(
        "Stratus is running at:\t\t\t{}{}{}",
        style::Bold,
        CONFIG.base_url,
        style::Reset
    );
    println!(
        "Stratus console:\t\t\t{}{}{}",
        style::Bold,
        console_url,
        style::Reset
    );
    println!(
        "Stratus admin email:\t\t\t{}{}{}",
        style::Bold,
        admin.email,
        style::Reset
    );
    println!(
        "Stratus admin password:\t\t\t{}{}{}",
        style::Bold,
        admin.password,
        style::Reset
    );
    println!("\nHappy Stratus-ing! :)\n");
    Ok(())
}
