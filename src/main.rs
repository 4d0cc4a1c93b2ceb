use anyhow::Result;
use archviz::{cli, logging, shell};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init_tracing(args.verbose)?;
    let config = args.into_config()?;

    shell::launch(&config).await
}
