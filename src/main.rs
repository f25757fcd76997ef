use clap::Parser;
use draftboard::{config::PipelineArgs, logging, pipeline};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = PipelineArgs::parse();
    logging::init();
    info!("=== NFL draft board update ===");

    let result = match args.into_config() {
        Ok(cfg) => pipeline::run(&cfg).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(rows) => info!(rows, "=== success ==="),
        Err(e) => {
            error!("!!! Error occurred: {:#} !!!", e);
            process::exit(1);
        }
    }
}
