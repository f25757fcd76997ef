// src/process/normalize.rs

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::utils::{clean_str, parse_number, round_to};
use crate::model::{Board, ProspectRow, RawTable};

pub const PLAYER_ALIASES: &[&str] = &[
    "player_name",
    "Player Name",
    "player",
    "Player",
    "name",
    "Name",
];
pub const POSITION_ALIASES: &[&str] = &["pos", "Position", "position", "Pos", "POS"];
pub const SCHOOL_ALIASES: &[&str] = &["school", "School", "college", "College"];
pub const RANK_ALIASES: &[&str] = &["rank", "Rank", "RK", "#", "ovr_rank", "overall"];
pub const CONSENSUS_ALIASES: &[&str] = &["consensus_rank", "Consensus", "Average", "avg_rank"];
pub const YEAR_ALIASES: &[&str] = &["year", "Year", "draft_year", "season"];

/// Offensive-line codes. Compared against the uppercased position verbatim.
pub const EXCLUDED_POSITIONS: &[&str] = &["OT", "OG", "C", "OL", "G", "LS", "T", "IOL"];

/// Rank columns published by individual outlets.
pub const SOURCE_COLUMNS: &[&str] = &[
    "PFF",
    "CBS",
    "ESPN",
    "NFL",
    "Athletic",
    "NFL Draft Buzz",
    "PFN",
    "TANKATHON",
    "Drafttech",
    "Mel Kiper",
    "Field Yates",
    "Matt Miller",
    "Daniel Jeremiah",
    "Charlie Campbell",
];

/// Rank assigned to prospects no source ranked.
pub const MISSING_RANK: f64 = 999.0;

/// Consensus weight for a source column. Only these outlets feed the
/// computed consensus; other source columns are carried through as-is.
pub fn source_weight(source: &str) -> Option<f64> {
    match source {
        "PFF" => Some(1.2),
        "ESPN" | "NFL" => Some(1.1),
        "Athletic" | "CBS" => Some(1.0),
        _ => None,
    }
}

pub fn is_excluded(position: &str) -> bool {
    EXCLUDED_POSITIONS.contains(&position)
}

/// Column indices resolved once per table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub player: Option<usize>,
    pub position: usize,
    pub school: Option<usize>,
    pub rank: Option<usize>,
    pub consensus: Option<usize>,
    pub year: Option<usize>,
    /// (source name, column index) in header order.
    pub sources: Vec<(String, usize)>,
}

impl ColumnMap {
    /// Probe each alias list; fails only when no position column exists.
    pub fn resolve(table: &RawTable) -> Result<Self> {
        let Some(position) = table.find_column(POSITION_ALIASES) else {
            bail!(
                "could not find a position column; available columns: {:?}",
                table.headers
            );
        };

        let sources = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| SOURCE_COLUMNS.contains(&h.as_str()))
            .map(|(i, h)| (h.clone(), i))
            .collect();

        let map = Self {
            player: table.find_column(PLAYER_ALIASES),
            position,
            school: table.find_column(SCHOOL_ALIASES),
            rank: table.find_column(RANK_ALIASES),
            consensus: table.find_column(CONSENSUS_ALIASES),
            year: table.find_column(YEAR_ALIASES),
            sources,
        };
        debug!(?map, "resolved columns");
        Ok(map)
    }
}

/// Mean of `rank / weight` over the weighted sources, rounded to one decimal.
pub fn weighted_consensus(source_ranks: &BTreeMap<String, f64>) -> Option<f64> {
    let adjusted: Vec<f64> = source_ranks
        .iter()
        .filter_map(|(source, rank)| source_weight(source).map(|w| rank / w))
        .collect();
    if adjusted.is_empty() {
        return None;
    }
    let sum: f64 = adjusted.iter().sum();
    Some(round_to(sum / adjusted.len() as f64, 1))
}

/// Turn a raw table into prospects: locate columns, uppercase positions,
/// drop offensive linemen (and other years when `target_year` is set),
/// and settle each row's effective rank.
///
/// `fantasy_rank` and `tier` are left at their defaults for the ranker.
pub fn normalize(table: &RawTable, target_year: Option<i32>) -> Result<Board> {
    let cols = ColumnMap::resolve(table)?;
    let year_filter = match (target_year, cols.year) {
        (Some(y), Some(idx)) => Some((y, idx)),
        (Some(y), None) => {
            warn!(year = y, "no year column; year filter skipped");
            None
        }
        _ => None,
    };

    let text = |row: &[String], idx: Option<usize>| -> String {
        idx.map(|i| clean_str(RawTable::cell(row, i)))
            .unwrap_or_default()
    };

    let mut rows = Vec::with_capacity(table.len());
    let mut excluded = 0usize;
    let mut off_year = 0usize;

    for row in &table.rows {
        let position = clean_str(RawTable::cell(row, cols.position)).to_uppercase();
        if is_excluded(&position) {
            excluded += 1;
            continue;
        }

        let year = cols
            .year
            .map(|i| clean_str(RawTable::cell(row, i)))
            .filter(|y| !y.is_empty());
        if let Some((target, _)) = year_filter {
            let matches = year
                .as_deref()
                .and_then(parse_number)
                .map_or(false, |y| y == target as f64);
            if !matches {
                off_year += 1;
                continue;
            }
        }

        let source_ranks: BTreeMap<String, f64> = cols
            .sources
            .iter()
            .filter_map(|(name, i)| parse_number(RawTable::cell(row, *i)).map(|r| (name.clone(), r)))
            .collect();

        let consensus_rank = cols
            .consensus
            .and_then(|i| parse_number(RawTable::cell(row, i)))
            .or_else(|| weighted_consensus(&source_ranks));

        let rank = cols
            .rank
            .and_then(|i| parse_number(RawTable::cell(row, i)))
            .or(consensus_rank)
            .unwrap_or(MISSING_RANK);

        rows.push(ProspectRow {
            player_name: text(row, cols.player),
            position,
            school: text(row, cols.school),
            year,
            rank,
            consensus_rank,
            source_ranks,
            fantasy_rank: rank,
            tier: 3,
        });
    }

    info!(
        input = table.len(),
        kept = rows.len(),
        excluded,
        off_year,
        "normalized"
    );

    Ok(Board {
        sources: cols.sources.into_iter().map(|(name, _)| name).collect(),
        rows,
    })
}
