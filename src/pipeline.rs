// src/pipeline.rs

use anyhow::Result;
use tracing::info;

use crate::config::PipelineConfig;
use crate::fetch::{build_client, fetch_table};
use crate::process::{normalize, rank_board, write_board};

/// Fetch → normalize → rank → write, once. Returns the rows written.
pub async fn run(cfg: &PipelineConfig) -> Result<usize> {
    info!(source = %cfg.source, year = ?cfg.target_year, "starting pipeline");

    let client = build_client(cfg.timeout)?;
    let table = fetch_table(&client, &cfg.source).await?;

    let mut board = normalize(&table, cfg.target_year)?;
    rank_board(&mut board);

    let written = write_board(&board, &cfg.output, &cfg.write)?;
    info!(
        "Saved {} fantasy-relevant prospects to {}",
        written,
        cfg.output.display()
    );
    Ok(written)
}
