#[macro_use]
extern crate lazy_static;

use std::env;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::Url;

mod client;
mod install;
mod step;
mod test;
mod utils;
mod version;
mod wait;

struct AppConfig {
    base_url: Url,
}

lazy_static! {
    static ref CONFIG: AppConfig = AppConfig {
        base_url: match env::var("API_SERVER_URL") {
            Ok(url) => Url::parse(url.as_str()).unwrap(),
            Err(_) => Url::parse("http://127.0.0.1:8080/").unwrap(),
        }
    };
}

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the platform on the cluster the CLI points to.
    Install(install::Arg),
    /// Display the version of the CLI and of the connected cluster.
    Version(version::Arg),
    /// Run tests on the cluster and inspect their logs.
    Test(test::Arg),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Install(arg) => arg.handle().await?,
        Commands::Version(arg) => arg.handle().await?,
        Commands::Test(arg) => arg.handle().await?,
    }

    Ok(())
}
