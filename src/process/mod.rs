// src/process/mod.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::{debug, trace};

use crate::model::RawTable;

pub mod normalize;
pub mod rank;
pub mod utils;
pub mod write;

pub use normalize::normalize;
pub use rank::rank_board;
pub use write::{write_board, WriteOptions};

/// Parse CSV text with a header row into a `RawTable`.
/// Ragged rows are accepted; a UTF-8 BOM on the first header is dropped.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    trace!(?headers, "csv headers");

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV record {}", i + 1))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(columns = headers.len(), rows = rows.len(), "parsed csv");

    Ok(RawTable::new(headers, rows))
}

/// Read and parse a CSV file from disk.
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    parse_csv(&text).with_context(|| format!("parsing {:?}", path))
}
