// src/enrich/mod.rs

use anyhow::{bail, Context, Result};
use std::{fs, future::Future, path::Path, time::Duration};
use tokio::time::sleep;
use tracing::{info, instrument};

use crate::model::{EnrichedPlayerRow, Enrichment, RawTable};
use crate::process::utils::clean_str;

pub mod espn;

pub use espn::EspnClient;

pub const NAME_ALIASES: &[&str] = &["name", "Player Name", "player_name", "Name"];
pub const SCHOOL_ALIASES: &[&str] = &["school", "College", "college", "School"];
pub const POSITION_ALIASES: &[&str] = &["pos", "Position", "position", "Pos"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub found: usize,
    pub total: usize,
}

impl EnrichSummary {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.found as f64 / self.total as f64
        }
    }
}

/// Look up every row in order, pausing `delay` after each one.
///
/// `lookup` gets (player name, school) and must not fail; rows it cannot
/// resolve come back with empty fields.
pub async fn enrich_rows<F, Fut>(
    table: &RawTable,
    delay: Duration,
    mut lookup: F,
) -> Result<(Vec<EnrichedPlayerRow>, EnrichSummary)>
where
    F: FnMut(String, String) -> Fut,
    Fut: Future<Output = Enrichment>,
{
    let (Some(name_col), Some(school_col)) = (
        table.find_column(NAME_ALIASES),
        table.find_column(SCHOOL_ALIASES),
    ) else {
        bail!(
            "Could not find name/school columns. Available: {:?}",
            table.headers
        );
    };
    let pos_col = table.find_column(POSITION_ALIASES);
    info!(
        name = %table.headers[name_col],
        school = %table.headers[school_col],
        position = ?pos_col.map(|i| table.headers[i].as_str()),
        players = table.len(),
        "found columns"
    );

    let total = table.len();
    let mut out = Vec::with_capacity(total);
    let mut summary = EnrichSummary {
        found: 0,
        total,
    };

    for (i, row) in table.rows.iter().enumerate() {
        let name = clean_str(RawTable::cell(row, name_col));
        let school = clean_str(RawTable::cell(row, school_col));

        let enrichment = lookup(name.clone(), school.clone()).await;
        match (&enrichment.espn_id, enrichment.has_profile()) {
            (Some(id), true) => {
                summary.found += 1;
                info!("[{}/{}] {} ({}): found, ID {}", i + 1, total, name, school, id);
            }
            (Some(id), false) => {
                info!("[{}/{}] {} ({}): ID found ({}) but no details", i + 1, total, name, school, id)
            }
            (None, _) => info!("[{}/{}] {} ({}): not found (YouTube fallback added)", i + 1, total, name, school),
        }

        out.push(EnrichedPlayerRow {
            cells: row.clone(),
            enrichment,
        });
        sleep(delay).await;
    }

    Ok((out, summary))
}

/// Header plus rows with enrichment columns. A column the input already
/// carries (from an earlier run) is overwritten in place.
pub fn enriched_table(headers: &[String], rows: &[EnrichedPlayerRow]) -> RawTable {
    let mut out_headers = headers.to_vec();
    let slots: Vec<usize> = Enrichment::COLUMNS
        .iter()
        .map(|col| match out_headers.iter().position(|h| h == col) {
            Some(i) => i,
            None => {
                out_headers.push(col.to_string());
                out_headers.len() - 1
            }
        })
        .collect();

    let out_rows = rows
        .iter()
        .map(|r| {
            let mut cells = r.cells.clone();
            cells.resize(out_headers.len(), String::new());
            for (slot, value) in slots.iter().zip(r.enrichment.cells()) {
                cells[*slot] = value;
            }
            cells
        })
        .collect();

    RawTable::new(out_headers, out_rows)
}

pub fn write_table<P: AsRef<Path>>(table: &RawTable, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {:?}", path))?;
    w.write_record(&table.headers).context("writing header")?;
    for row in &table.rows {
        w.write_record(row).context("writing row")?;
    }
    w.flush().with_context(|| format!("flushing {:?}", path))?;
    Ok(())
}

/// Read `input`, enrich every row through ESPN, write `output`.
#[instrument(level = "info", skip(espn, delay))]
pub async fn enrich_file(
    espn: &EspnClient,
    input: &Path,
    output: &Path,
    delay: Duration,
) -> Result<EnrichSummary> {
    info!("Loading players from {}", input.display());
    let table = crate::process::read_csv_file(input)?;

    let (rows, summary) = enrich_rows(&table, delay, |name, school| async move {
        espn.enrich(&name, &school).await
    })
    .await?;

    write_table(&enriched_table(&table.headers, &rows), output)?;
    info!(
        "Done! Found ESPN data for {}/{} players ({:.1}%)",
        summary.found,
        summary.total,
        summary.percent()
    );
    info!("Saved to: {}", output.display());
    Ok(summary)
}
