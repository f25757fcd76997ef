// src/config.rs

use anyhow::{anyhow, bail, Result};
use clap::{Parser, ValueEnum};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::fetch::{
    consensus::{CONSENSUS_PAGE_URL, CONSENSUS_UPLOADS_URL},
    html::DEFAULT_TABLE_SELECTOR,
    Source, REQUEST_TIMEOUT,
};
use crate::process::WriteOptions;

/// Consolidated historical prospects CSV.
pub const DEFAULT_PROSPECTS_URL: &str =
    "https://raw.githubusercontent.com/JackLich10/nfl-draft-data/main/nfl_draft_prospects.csv";
pub const DEFAULT_TARGET_YEAR: i32 = 2025;
pub const DEFAULT_OUTPUT: &str = "data/prospects.csv";
pub const DEFAULT_BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: Source,
    pub output: PathBuf,
    /// Keep only this draft class; `None` keeps everything.
    pub target_year: Option<i32>,
    pub write: WriteOptions,
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: Source::Csv(DEFAULT_PROSPECTS_URL.to_string()),
            output: PathBuf::from(DEFAULT_OUTPUT),
            target_year: Some(DEFAULT_TARGET_YEAR),
            write: WriteOptions::default(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// CSV download or local file
    Csv,
    /// Dated industry-consensus JSON
    Consensus,
    /// First matching table on a web page
    Html,
}

/// `--year` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearArg {
    Any,
    Year(i32),
}

fn parse_year(s: &str) -> Result<YearArg, String> {
    if s.eq_ignore_ascii_case("any") {
        return Ok(YearArg::Any);
    }
    s.parse()
        .map(YearArg::Year)
        .map_err(|_| format!("expected a year such as 2025 or `any`, got {:?}", s))
}

#[derive(Debug, Parser)]
#[command(name = "draftboard")]
#[command(about = "Fetch NFL draft prospect rankings and write the fantasy board CSV")]
pub struct PipelineArgs {
    /// Where the raw rankings come from
    #[arg(long, value_enum, default_value_t = SourceKind::Csv)]
    pub source: SourceKind,

    /// CSV path or URL, consensus page URL, or HTML page URL
    #[arg(long)]
    pub input: Option<String>,

    /// Board CSV to write
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Draft class to keep, or `any`
    #[arg(long, value_parser = parse_year)]
    pub year: Option<YearArg>,

    /// CSS selector for the scraped table
    #[arg(long, default_value = DEFAULT_TABLE_SELECTOR)]
    pub selector: String,

    /// Directory holding the dated consensus files
    #[arg(long, default_value = CONSENSUS_UPLOADS_URL)]
    pub uploads: String,

    /// Write a `<stem>_timestamp.txt` sidecar next to the board
    #[arg(long)]
    pub stamp: bool,

    /// Snapshot the previous board here before replacing it
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,
}

impl PipelineArgs {
    /// The year filter defaults on only for the default CSV; other sources
    /// publish class labels rather than draft years in their year column.
    pub fn into_config(self) -> Result<PipelineConfig> {
        let source = match self.source {
            SourceKind::Csv => {
                Source::Csv(self.input.unwrap_or_else(|| DEFAULT_PROSPECTS_URL.to_string()))
            }
            SourceKind::Consensus => Source::Consensus {
                page_url: self.input.unwrap_or_else(|| CONSENSUS_PAGE_URL.to_string()),
                uploads_url: self.uploads,
            },
            SourceKind::Html => Source::Html {
                url: self
                    .input
                    .ok_or_else(|| anyhow!("--source html needs --input <url>"))?,
                selector: self.selector,
            },
        };

        let default_csv = source == Source::Csv(DEFAULT_PROSPECTS_URL.to_string());
        let target_year = match self.year {
            Some(YearArg::Any) => None,
            Some(YearArg::Year(y)) => Some(y),
            None if default_csv => Some(DEFAULT_TARGET_YEAR),
            None => None,
        };

        Ok(PipelineConfig {
            source,
            output: self.output,
            target_year,
            write: WriteOptions {
                stamp: self.stamp,
                backup_dir: self.backup_dir,
            },
            timeout: REQUEST_TIMEOUT,
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "restore_backup")]
#[command(about = "Copy a board snapshot back into place")]
pub struct RestoreArgs {
    /// Snapshot number (1 = newest) or timestamp; newest when omitted
    pub choice: Option<String>,

    /// Root holding the timestamped snapshots
    #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
    pub backup_dir: PathBuf,

    /// Directory the files are copied back into
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,
}

pub const DEFAULT_ENRICH_INPUT: &str = "data/mock_draft_db.csv";
pub const DEFAULT_ENRICH_OUTPUT: &str = "data/mock_draft_db_enriched.csv";
pub const FALLBACK_ENRICH_INPUT: &str = "players.csv";
pub const FALLBACK_ENRICH_OUTPUT: &str = "players_enriched.csv";

/// Pause between rows so the lookup service isn't hammered.
pub const ENRICH_DELAY: Duration = Duration::from_millis(300);
pub const ENRICH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub delay: Duration,
    pub timeout: Duration,
}

impl EnrichConfig {
    /// `enrich_players [input_csv] [output_csv]`
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut args = args.into_iter();
        let input = args.next().unwrap_or_else(|| DEFAULT_ENRICH_INPUT.to_string());
        let output = args.next().unwrap_or_else(|| DEFAULT_ENRICH_OUTPUT.to_string());
        Self {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            delay: ENRICH_DELAY,
            timeout: ENRICH_TIMEOUT,
        }
    }

    /// Swap to `players.csv` when the configured input is missing and
    /// that file exists; otherwise a missing input is fatal.
    pub fn resolve_input(mut self, base: &Path) -> Result<Self> {
        if base.join(&self.input).exists() {
            self.input = base.join(&self.input);
            self.output = base.join(&self.output);
            return Ok(self);
        }
        let fallback = base.join(FALLBACK_ENRICH_INPUT);
        if fallback.exists() {
            self.input = fallback;
            self.output = base.join(FALLBACK_ENRICH_OUTPUT);
            return Ok(self);
        }
        bail!(
            "Input file not found: {}\nUsage: enrich_players <input_csv> [output_csv]",
            self.input.display()
        )
    }
}
