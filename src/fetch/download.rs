use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;
use url::Url;

use super::get_text;
use crate::model::RawTable;
use crate::process::{parse_csv, read_csv_file};

/// True for locations that should go over the network.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Load a CSV from a URL or, failing the scheme check, from disk.
pub async fn fetch_csv(client: &Client, location: &str) -> Result<RawTable> {
    if is_remote(location) {
        let url = Url::parse(location).with_context(|| format!("parsing URL {}", location))?;
        info!(%url, "downloading csv");
        let text = get_text(client, &url).await?;
        parse_csv(&text).with_context(|| format!("parsing CSV from {}", url))
    } else {
        info!(path = location, "reading csv");
        read_csv_file(location)
    }
}
