// src/model.rs

use std::collections::BTreeMap;

/// A table of whatever columns the source happened to publish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names as the source spelled them.
    pub headers: Vec<String>,
    /// One `Vec` of cells per data row. Rows may be shorter than `headers`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of the first header in `aliases` that is present.
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
    }

    /// Cell at (`row`, `col`), or `""` for short rows.
    pub fn cell<'a>(row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// One normalized prospect.
#[derive(Debug, Clone, PartialEq)]
pub struct ProspectRow {
    pub player_name: String,
    pub position: String,
    pub school: String,
    pub year: Option<String>,
    /// Effective rank; 999 when the source had none.
    pub rank: f64,
    pub consensus_rank: Option<f64>,
    pub source_ranks: BTreeMap<String, f64>,
    pub fantasy_rank: f64,
    pub tier: u8,
}

/// The normalized frame handed from the normalizer to the ranker and writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    /// Per-source rank columns, in the order the input listed them.
    pub sources: Vec<String>,
    pub rows: Vec<ProspectRow>,
}

/// ESPN fields appended to an input row by the enricher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub espn_id: Option<String>,
    pub photo_url: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub hometown: Option<String>,
    pub highlight_url: Option<String>,
    pub espn_profile_url: Option<String>,
}

impl Enrichment {
    /// Output column names, in write order.
    pub const COLUMNS: [&'static str; 7] = [
        "espn_id",
        "photo_url",
        "espn_height",
        "espn_weight",
        "hometown",
        "highlight_url",
        "espn_profile_url",
    ];

    pub fn cells(&self) -> [String; 7] {
        [
            &self.espn_id,
            &self.photo_url,
            &self.height,
            &self.weight,
            &self.hometown,
            &self.highlight_url,
            &self.espn_profile_url,
        ]
        .map(|v| v.clone().unwrap_or_default())
    }

    /// True once a profile lookup succeeded.
    pub fn has_profile(&self) -> bool {
        self.espn_profile_url.is_some()
    }
}

/// An input row with its enrichment columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPlayerRow {
    pub cells: Vec<String>,
    pub enrichment: Enrichment,
}
