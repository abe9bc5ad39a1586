use anyhow::Result;
use clap::{Args, Subcommand};
use resources::objects::{
    test_suite::{TestSuite, TestSuiteSpec},
    Metadata,
};


#[derive(Args)]
pub struct Arg {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tests on the cluster.
    Run(run::Arg),
    /// Show the logs of test executions.
    Logs(logs::Arg),
}

impl Arg {
    pub async fn handle(&self) -> Result<()> {
        match &self.command {
            Commands::Run(arg) => arg.handle().await,
            Commands::Logs(arg) => arg.handle().await,
        }
    }
}

pub(crate) fn new_test_suite(name: &str) -> TestSuite {
    TestSuite {
        metadata: Metadata {
            name: name.to_owned(),
            ..Metadata::default()
        },
        spec: TestSuiteSpec::default(),
        status: None,
    }
}
