// src/fetch/mod.rs

use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::{fmt, time::Duration};
use tracing::{debug, info, instrument};
use url::Url;

use crate::model::RawTable;

pub mod consensus;
pub mod download;
pub mod html;

/// Browser-like agent; several of the sources refuse the reqwest default.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the raw rankings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// CSV at an `http(s)://` URL or a local path.
    Csv(String),
    /// Industry-consensus big board published as a dated JSON file.
    Consensus { page_url: String, uploads_url: String },
    /// First element matching `selector` on an HTML page.
    Html { url: String, selector: String },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Csv(loc) => write!(f, "csv {}", loc),
            Source::Consensus { page_url, .. } => write!(f, "consensus {}", page_url),
            Source::Html { url, selector } => write!(f, "html {} ({})", url, selector),
        }
    }
}

/// HTTP client shared by every fetch in a run.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("building HTTP client")
}

/// GET `url` and return the body; any non-success status is an error.
pub async fn get_text(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))
}

/// Fetch one source into a raw table. An empty table is an error.
#[instrument(level = "info", skip(client, source), fields(source = %source))]
pub async fn fetch_table(client: &Client, source: &Source) -> Result<RawTable> {
    let table = match source {
        Source::Csv(location) => download::fetch_csv(client, location).await?,
        Source::Consensus {
            page_url,
            uploads_url,
        } => consensus::fetch_consensus(client, page_url, uploads_url).await?,
        Source::Html { url, selector } => {
            let url = Url::parse(url).with_context(|| format!("parsing URL {}", url))?;
            let body = get_text(client, &url).await?;
            html::scrape_table(&body, selector)?
        }
    };

    if table.is_empty() {
        bail!("{} returned no rows", source);
    }
    info!(
        rows = table.len(),
        columns = table.headers.len(),
        "fetched table"
    );
    Ok(table)
}
