use anyhow::Result;
use draftboard::{
    config::EnrichConfig,
    enrich::{enrich_file, EspnClient},
    fetch::build_client,
    logging,
};
use std::{env, path::Path, process};
use tracing::{error, info};

async fn run() -> Result<()> {
    let cfg = EnrichConfig::from_args(env::args().skip(1)).resolve_input(Path::new("."))?;
    let espn = EspnClient::new(build_client(cfg.timeout)?);
    enrich_file(&espn, &cfg.input, &cfg.output, cfg.delay).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init();
    info!("=== NFL mock draft enrichment ===");

    if let Err(e) = run().await {
        error!("!!! Error occurred: {:#} !!!", e);
        process::exit(1);
    }
}
