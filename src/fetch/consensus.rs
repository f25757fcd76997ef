// src/fetch/consensus.rs

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};
use url::Url;

use super::get_text;
use crate::model::RawTable;

pub const CONSENSUS_PAGE_URL: &str =
    "https://www.profootballnetwork.com/nfl-draft-hq/industry-consensus-big-board/";
pub const CONSENSUS_UPLOADS_URL: &str =
    "https://www.profootballnetwork.com/wp-content/uploads/consensus/";

/// Days probed, today included, when the page doesn't name the file.
pub const LOOKBACK_DAYS: i64 = 7;

static CONSENSUS_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"industry-consensus-\d{4}-\d{2}-\d{2}\.json").expect("consensus regex should parse")
});

/// Analyst key in the feed → dashboard column.
pub const ANALYST_COLUMNS: &[(&str, &str)] = &[
    ("B/R", "Drafttech"),
    ("CBS", "CBS"),
    ("ESPN", "Mel Kiper"),
    ("PFF", "PFF"),
    ("PFSN", "PFN"),
    ("The Athletic", "NFL Draft Buzz"),
];

/// Dashboard column layout the consensus board is reshaped into.
pub const BOARD_HEADERS: &[&str] = &[
    "Player Name",
    "Position",
    "School",
    "Year",
    "Height",
    "Weight",
    "40 Time",
    "PFF",
    "NFL Draft Buzz",
    "PFN",
    "TANKATHON",
    "Drafttech",
    "CBS",
    "Mel Kiper",
    "Field Yates",
    "Matt Miller",
    "Daniel Jeremiah",
    "Charlie Campbell",
    "Average",
    "Remarks",
];

#[derive(Debug, Deserialize)]
pub struct ConsensusPlayer {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub position: Value,
    #[serde(default)]
    pub school: Value,
    #[serde(default)]
    pub year: Value,
    #[serde(default)]
    pub height: Value,
    #[serde(default)]
    pub weight: Value,
    #[serde(default, rename = "analystRanks")]
    pub analyst_ranks: BTreeMap<String, Value>,
}

/// Feed values arrive as strings or numbers; render either, null as empty.
fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// First `industry-consensus-YYYY-MM-DD.json` named anywhere in the page.
pub fn find_consensus_file(html: &str) -> Option<String> {
    CONSENSUS_FILE.find(html).map(|m| m.as_str().to_string())
}

/// Dated filenames to probe, newest first.
pub fn candidate_files(today: NaiveDate, days: i64) -> Vec<String> {
    (0..days)
        .map(|back| today - Duration::days(back))
        .map(|d| format!("industry-consensus-{}.json", d.format("%Y-%m-%d")))
        .collect()
}

/// Reshape the feed into the dashboard's column layout.
pub fn consensus_to_table(players: &[ConsensusPlayer]) -> RawTable {
    let col = |name: &str| BOARD_HEADERS.iter().position(|h| *h == name);
    let rows = players
        .iter()
        .map(|p| {
            let mut row = vec![String::new(); BOARD_HEADERS.len()];
            row[0] = value_text(&p.name);
            row[1] = value_text(&p.position);
            row[2] = value_text(&p.school);
            row[3] = value_text(&p.year);
            row[4] = value_text(&p.height);
            row[5] = value_text(&p.weight);
            for (key, column) in ANALYST_COLUMNS {
                if let (Some(rank), Some(i)) = (p.analyst_ranks.get(*key), col(*column)) {
                    row[i] = value_text(rank);
                }
            }
            row
        })
        .collect();

    RawTable::new(BOARD_HEADERS.iter().map(|h| h.to_string()).collect(), rows)
}

pub fn parse_consensus(body: &str) -> Result<Vec<ConsensusPlayer>> {
    serde_json::from_str(body).context("parsing consensus JSON")
}

/// Uploads directory as a base URL. Without a trailing slash `Url::join`
/// would replace the last segment instead of appending to it.
pub fn uploads_base(uploads_url: &str) -> Result<Url> {
    let dir = if uploads_url.ends_with('/') {
        uploads_url.to_string()
    } else {
        format!("{}/", uploads_url)
    };
    Url::parse(&dir).with_context(|| format!("parsing uploads URL {}", uploads_url))
}

async fn fetch_players(client: &Client, url: &Url) -> Result<Vec<ConsensusPlayer>> {
    let body = get_text(client, url).await?;
    parse_consensus(&body).with_context(|| format!("decoding {}", url))
}

/// Locate and download the newest consensus board.
///
/// The page is searched for the dated JSON filename first. When that fails
/// each of the last `LOOKBACK_DAYS` days is probed and the first hit wins.
pub async fn fetch_consensus(client: &Client, page_url: &str, uploads_url: &str) -> Result<RawTable> {
    let uploads = uploads_base(uploads_url)?;

    match discover(client, page_url, &uploads).await {
        Ok(players) => return Ok(consensus_to_table(&players)),
        Err(e) => warn!(error = %e, "consensus page lookup failed; probing recent dates"),
    }

    for file in candidate_files(Local::now().date_naive(), LOOKBACK_DAYS) {
        let url = uploads.join(&file)?;
        match fetch_players(client, &url).await {
            Ok(players) => {
                info!(%url, players = players.len(), "found consensus file");
                return Ok(consensus_to_table(&players));
            }
            Err(e) => info!(%url, error = %e, "no consensus file"),
        }
    }

    Err(anyhow!(
        "could not find a consensus JSON file for any of the last {} days",
        LOOKBACK_DAYS
    ))
}

async fn discover(client: &Client, page_url: &str, uploads: &Url) -> Result<Vec<ConsensusPlayer>> {
    let page = Url::parse(page_url).with_context(|| format!("parsing page URL {}", page_url))?;
    info!(%page, "fetching consensus page");
    let html = get_text(client, &page).await?;
    let file = find_consensus_file(&html)
        .ok_or_else(|| anyhow!("no consensus filename in {}", page))?;
    let url = uploads.join(&file)?;
    info!(%url, "found consensus file");
    fetch_players(client, &url).await
}
