// src/enrich/espn.rs

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::model::Enrichment;

pub const SEARCH_URL: &str = "https://site.web.api.espn.com/apis/common/v3/search";
pub const ATHLETES_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/football/college-football/athletes";
pub const PROFILE_URL: &str = "https://www.espn.com/college-football/player/_/id/";
pub const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results";

/// ESPN sends explicit `null` for absent strings and lists; read it as the default.
fn nullable<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default, rename = "type", deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub contents: Vec<SearchItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default)]
    pub league: Option<League>,
}

#[derive(Debug, Default, Deserialize)]
pub struct League {
    #[serde(default, deserialize_with = "nullable")]
    pub abbreviation: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AthletesResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub athletes: Vec<AthleteHit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AthleteHit {
    #[serde(default)]
    pub id: Value,
    #[serde(default, rename = "fullName", deserialize_with = "nullable")]
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Athlete {
    #[serde(default)]
    pub headshot: Option<Link>,
    #[serde(default, rename = "displayHeight")]
    pub display_height: Option<String>,
    #[serde(default, rename = "displayWeight")]
    pub display_weight: Option<String>,
    #[serde(default, rename = "birthPlace")]
    pub birth_place: Option<BirthPlace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BirthPlace {
    #[serde(default, deserialize_with = "nullable")]
    pub city: String,
    #[serde(default, deserialize_with = "nullable")]
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideosResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub videos: Vec<Video>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Video {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub links: Option<VideoLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoLinks {
    #[serde(default)]
    pub web: Option<Link>,
}

impl Video {
    fn web_href(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .web
            .as_ref()?
            .href
            .as_deref()
            .filter(|h| !h.is_empty())
    }
}

/// ESPN ids come back as strings or numbers.
fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Drop the state qualifiers some boards append, e.g. `Miami (FL)`.
pub fn clean_school(school: &str) -> String {
    school.replace("(FL)", "").replace("(OH)", "").trim().to_string()
}

/// First college-football hit whose description mentions the school.
pub fn pick_search_hit(resp: &SearchResponse, school: &str) -> Option<String> {
    let cleaned = clean_school(school).to_lowercase();
    let raw = school.to_lowercase();
    resp.results
        .iter()
        .filter(|r| r.kind == "player")
        .flat_map(|r| r.contents.iter())
        .filter(|item| {
            let league = item.league.as_ref().map(|l| l.abbreviation.as_str());
            league == Some("NCAAF") || item.description.to_lowercase().contains("college")
        })
        .filter(|item| {
            let desc = item.description.to_lowercase();
            desc.contains(&cleaned) || desc.contains(&raw)
        })
        .find_map(|item| id_text(&item.id))
}

/// First athlete whose full name contains the player name, or the reverse.
pub fn pick_athlete(resp: &AthletesResponse, player_name: &str) -> Option<String> {
    let wanted = player_name.to_lowercase();
    resp.athletes
        .iter()
        .filter(|a| {
            let name = a.full_name.to_lowercase();
            !name.is_empty() && (wanted.contains(&name) || name.contains(&wanted))
        })
        .find_map(|a| id_text(&a.id))
}

/// A highlight or draft video if one exists, else the first video.
pub fn pick_highlight(resp: &VideosResponse) -> Option<String> {
    resp.videos
        .iter()
        .filter(|v| {
            let title = v.title.to_lowercase();
            title.contains("highlight") || title.contains("draft")
        })
        .find_map(Video::web_href)
        .or_else(|| resp.videos.first().and_then(Video::web_href))
        .map(str::to_string)
}

pub fn headshot_url(espn_id: &str) -> String {
    format!(
        "https://a.espncdn.com/combiner/i?img=/i/headshots/college-football/players/full/{}.png&w=350&h=254",
        espn_id
    )
}

pub fn profile_url(espn_id: &str) -> String {
    format!("{}{}", PROFILE_URL, espn_id)
}

pub fn youtube_search_url(player_name: &str, school: &str) -> String {
    let query = format!("{} {} football highlights 2025", player_name, school);
    match Url::parse_with_params(YOUTUBE_SEARCH_URL, &[("search_query", query.as_str())]) {
        Ok(url) => url.to_string(),
        Err(_) => YOUTUBE_SEARCH_URL.to_string(),
    }
}

/// Profile fields from an athlete payload; the athlete may be wrapped in
/// an `athlete` key or be the root object.
pub fn parse_profile(espn_id: &str, body: Value) -> Result<Enrichment> {
    let athlete_value = match body {
        Value::Object(mut map) if map.contains_key("athlete") => {
            map.remove("athlete").unwrap_or(Value::Null)
        }
        other => other,
    };
    let athlete: Athlete =
        serde_json::from_value(athlete_value).context("decoding athlete profile")?;

    let photo_url = athlete
        .headshot
        .and_then(|h| h.href)
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| headshot_url(espn_id));

    let hometown = athlete
        .birth_place
        .map(|b| {
            format!("{}, {}", b.city, b.state)
                .trim_matches(|c| c == ',' || c == ' ')
                .to_string()
        })
        .filter(|h| !h.is_empty());

    Ok(Enrichment {
        espn_id: Some(espn_id.to_string()),
        photo_url: Some(photo_url),
        height: athlete.display_height,
        weight: athlete.display_weight,
        hometown,
        highlight_url: None,
        espn_profile_url: Some(profile_url(espn_id)),
    })
}

/// Thin wrapper over the ESPN endpoints; base URLs are swappable for tests.
pub struct EspnClient {
    client: Client,
    search_url: String,
    athletes_url: String,
}

impl EspnClient {
    pub fn new(client: Client) -> Self {
        Self::with_urls(client, SEARCH_URL, ATHLETES_URL)
    }

    pub fn with_urls(client: Client, search_url: &str, athletes_url: &str) -> Self {
        Self {
            client,
            search_url: search_url.trim_end_matches('/').to_string(),
            athletes_url: athletes_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .json::<T>()
            .await
            .with_context(|| format!("decoding JSON from {}", url))
    }

    fn athlete_url(&self, tail: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.athletes_url, tail);
        Url::parse(&raw).with_context(|| format!("parsing {}", raw))
    }

    /// Player id via the global search, falling back to the athlete search.
    pub async fn search_player(&self, player_name: &str, school: &str) -> Result<Option<String>> {
        let url = Url::parse_with_params(
            &self.search_url,
            &[("query", player_name), ("limit", "10"), ("type", "player")],
        )?;
        let resp: SearchResponse = self.get_json(url).await?;
        if let Some(id) = pick_search_hit(&resp, school) {
            return Ok(Some(id));
        }
        self.search_athletes(player_name, &clean_school(school)).await
    }

    /// College-football athlete search by "name school".
    pub async fn search_athletes(&self, player_name: &str, school: &str) -> Result<Option<String>> {
        let query = format!("{} {}", player_name, school);
        let url = Url::parse_with_params(&self.athletes_url, &[("search", query.as_str())])?;
        let resp: AthletesResponse = self.get_json(url).await?;
        Ok(pick_athlete(&resp, player_name))
    }

    pub async fn player_profile(&self, espn_id: &str) -> Result<Enrichment> {
        let body: Value = self.get_json(self.athlete_url(espn_id)?).await?;
        parse_profile(espn_id, body)
    }

    pub async fn highlight(&self, espn_id: &str) -> Result<Option<String>> {
        let resp: VideosResponse = self
            .get_json(self.athlete_url(&format!("{}/videos", espn_id))?)
            .await?;
        Ok(pick_highlight(&resp))
    }

    /// Full lookup for one player. Never fails: each failed step leaves its
    /// fields empty, and a missing highlight falls back to a YouTube search.
    pub async fn enrich(&self, player_name: &str, school: &str) -> Enrichment {
        let espn_id = match self.search_player(player_name, school).await {
            Ok(id) => id,
            Err(e) => {
                warn!(player = player_name, error = %e, "search failed");
                None
            }
        };

        let Some(espn_id) = espn_id else {
            return Enrichment {
                highlight_url: Some(youtube_search_url(player_name, school)),
                ..Default::default()
            };
        };

        let mut details = match self.player_profile(&espn_id).await {
            Ok(d) => d,
            Err(e) => {
                warn!(player = player_name, espn_id = %espn_id, error = %e, "profile lookup failed");
                return Enrichment {
                    espn_id: Some(espn_id),
                    ..Default::default()
                };
            }
        };

        let highlight = match self.highlight(&espn_id).await {
            Ok(h) => h,
            Err(e) => {
                debug!(espn_id = %espn_id, error = %e, "no videos");
                None
            }
        };
        details.highlight_url =
            Some(highlight.unwrap_or_else(|| youtube_search_url(player_name, school)));
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{collections::HashMap, time::Duration};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    fn from<T: DeserializeOwned>(v: Value) -> T {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn search_hit_requires_college_and_school() {
        let resp: SearchResponse = from(json!({
            "results": [
                {"type": "team", "contents": [{"id": "1", "description": "Miami College"}]},
                {"type": "player", "contents": [
                    {"id": "2", "description": "NFL - Miami Dolphins", "league": {"abbreviation": "NFL"}},
                    {"id": 4432577, "description": "Miami Hurricanes", "league": {"abbreviation": "NCAAF"}}
                ]}
            ]
        }));
        assert_eq!(pick_search_hit(&resp, "Miami (FL)").as_deref(), Some("4432577"));
        assert_eq!(pick_search_hit(&resp, "Oregon"), None);
    }

    #[test]
    fn athlete_name_matches_either_way() {
        let resp: AthletesResponse = from(json!({
            "athletes": [
                {"id": "10", "fullName": "Someone Else"},
                {"id": "11", "fullName": "Cam Ward"}
            ]
        }));
        assert_eq!(pick_athlete(&resp, "cam ward").as_deref(), Some("11"));
        assert_eq!(pick_athlete(&resp, "Cam Ward Jr.").as_deref(), Some("11"));
        assert_eq!(pick_athlete(&resp, "Shedeur Sanders"), None);
    }

    #[test]
    fn highlight_prefers_titled_videos() {
        let resp: VideosResponse = from(json!({
            "videos": [
                {"title": "Postgame presser", "links": {"web": {"href": "https://v/1"}}},
                {"title": "Draft Profile", "links": {"web": {}}},
                {"title": "Season HIGHLIGHTS", "links": {"web": {"href": "https://v/3"}}}
            ]
        }));
        assert_eq!(pick_highlight(&resp).as_deref(), Some("https://v/3"));

        let resp: VideosResponse = from(json!({
            "videos": [{"title": "Presser", "links": {"web": {"href": "https://v/1"}}}]
        }));
        assert_eq!(pick_highlight(&resp).as_deref(), Some("https://v/1"));
        assert_eq!(pick_highlight(&VideosResponse::default()), None);
    }

    #[test]
    fn profile_reads_wrapped_athlete() -> Result<()> {
        let body = json!({
            "athlete": {
                "displayHeight": "6' 2\"",
                "displayWeight": "219 lbs",
                "birthPlace": {"city": "West Columbia", "state": "TX"}
            }
        });
        let e = parse_profile("4432577", body)?;
        assert_eq!(e.espn_id.as_deref(), Some("4432577"));
        assert_eq!(e.photo_url, Some(headshot_url("4432577")));
        assert_eq!(e.weight.as_deref(), Some("219 lbs"));
        assert_eq!(e.hometown.as_deref(), Some("West Columbia, TX"));
        assert_eq!(
            e.espn_profile_url.as_deref(),
            Some("https://www.espn.com/college-football/player/_/id/4432577")
        );
        Ok(())
    }

    #[test]
    fn profile_reads_root_athlete() -> Result<()> {
        let body = json!({
            "headshot": {"href": "https://img/1.png"},
            "birthPlace": {"city": "", "state": "GA"}
        });
        let e = parse_profile("7", body)?;
        assert_eq!(e.photo_url.as_deref(), Some("https://img/1.png"));
        assert_eq!(e.hometown.as_deref(), Some("GA"));
        assert_eq!(e.height, None);
        Ok(())
    }

    #[test]
    fn youtube_fallback_encodes_query() {
        let url = youtube_search_url("Cam Ward", "Miami (FL)");
        assert!(url.starts_with("https://www.youtube.com/results?search_query="));
        assert!(url.contains("Cam+Ward+Miami+%28FL%29+football+highlights+2025"));
    }

    #[test]
    fn school_qualifiers_stripped() {
        assert_eq!(clean_school("Miami (FL) "), "Miami");
        assert_eq!(clean_school("Miami (OH)"), "Miami");
        assert_eq!(clean_school("Texas A&M"), "Texas A&M");
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let resp: SearchResponse = from(json!({
            "results": [
                {"type": null, "contents": null},
                {"type": "player", "contents": [{"id": "1", "description": null, "league": null}]}
            ]
        }));
        assert_eq!(resp.results.len(), 2);
        assert_eq!(pick_search_hit(&resp, "Miami"), None);

        let resp: AthletesResponse = from(json!({
            "athletes": [{"id": "10", "fullName": null}, {"id": "11", "fullName": "Cam Ward"}]
        }));
        assert_eq!(pick_athlete(&resp, "Cam Ward").as_deref(), Some("11"));
    }

    /// Answer each request with the canned `(status, body)` for its path,
    /// or 404. Returns the base URL.
    async fn serve(routes: Vec<(&'static str, u16, String)>) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base = format!("http://{}", listener.local_addr()?);
        let routes: HashMap<&'static str, (u16, String)> = routes
            .into_iter()
            .map(|(path, status, body)| (path, (status, body)))
            .collect();

        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                let target = request.split_whitespace().nth(1).unwrap_or("/");
                let path = target.split('?').next().unwrap_or("/");
                let (status, body) = routes
                    .get(path)
                    .cloned()
                    .unwrap_or((404, String::new()));
                let reply = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = sock.write_all(reply.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        Ok(base)
    }

    fn local_espn(base: &str) -> Result<EspnClient> {
        let http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(EspnClient::with_urls(
            http,
            &format!("{}/search", base),
            &format!("{}/athletes", base),
        ))
    }

    fn search_hit(id: &str) -> String {
        json!({
            "results": [{"type": "player", "contents": [
                {"id": id, "description": "Miami Hurricanes", "league": {"abbreviation": "NCAAF"}}
            ]}]
        })
        .to_string()
    }

    fn profile() -> String {
        json!({
            "athlete": {
                "displayHeight": "6' 2\"",
                "displayWeight": "219 lbs",
                "birthPlace": {"city": "West Columbia", "state": "TX"}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn search_miss_falls_back_to_athlete_search() -> Result<()> {
        let base = serve(vec![
            (
                "/search",
                200,
                json!({"results": [{"type": "player", "contents": [{"id": "1", "description": null}]}]})
                    .to_string(),
            ),
            (
                "/athletes",
                200,
                json!({"athletes": [{"id": "10", "fullName": null}, {"id": 11, "fullName": "Cam Ward"}]})
                    .to_string(),
            ),
            ("/athletes/11", 200, profile()),
            (
                "/athletes/11/videos",
                200,
                json!({"videos": [
                    {"title": "Presser", "links": {"web": {"href": "https://v/1"}}},
                    {"title": "Season Highlights", "links": {"web": {"href": "https://v/2"}}}
                ]})
                .to_string(),
            ),
        ])
        .await?;
        let espn = local_espn(&base)?;

        let e = espn.enrich("Cam Ward", "Miami (FL)").await;
        assert_eq!(e.espn_id.as_deref(), Some("11"));
        assert_eq!(e.photo_url, Some(headshot_url("11")));
        assert_eq!(e.height.as_deref(), Some("6' 2\""));
        assert_eq!(e.hometown.as_deref(), Some("West Columbia, TX"));
        assert_eq!(e.highlight_url.as_deref(), Some("https://v/2"));
        assert_eq!(e.espn_profile_url, Some(profile_url("11")));

        let e = espn.enrich("Nobody", "Nowhere").await;
        assert_eq!(
            e,
            Enrichment {
                highlight_url: Some(youtube_search_url("Nobody", "Nowhere")),
                ..Default::default()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn profile_failure_keeps_only_the_id() -> Result<()> {
        let base = serve(vec![
            ("/search", 200, search_hit("7")),
            ("/athletes/7", 500, String::new()),
        ])
        .await?;
        let e = local_espn(&base)?.enrich("Cam Ward", "Miami (FL)").await;
        assert_eq!(
            e,
            Enrichment {
                espn_id: Some("7".into()),
                ..Default::default()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn video_failure_falls_back_to_youtube() -> Result<()> {
        let base = serve(vec![
            ("/search", 200, search_hit("7")),
            ("/athletes/7", 200, profile()),
            ("/athletes/7/videos", 500, String::new()),
        ])
        .await?;
        let e = local_espn(&base)?.enrich("Cam Ward", "Miami (FL)").await;
        assert_eq!(e.espn_id.as_deref(), Some("7"));
        assert_eq!(e.weight.as_deref(), Some("219 lbs"));
        assert_eq!(
            e.highlight_url,
            Some(youtube_search_url("Cam Ward", "Miami (FL)"))
        );
        assert!(e.has_profile());
        Ok(())
    }

    #[tokio::test]
    async fn search_failure_leaves_only_youtube_link() -> Result<()> {
        let base = serve(vec![("/search", 500, String::new())]).await?;
        let e = local_espn(&base)?.enrich("Cam Ward", "Miami (FL)").await;
        assert_eq!(e.espn_id, None);
        assert_eq!(
            e.highlight_url,
            Some(youtube_search_url("Cam Ward", "Miami (FL)"))
        );
        assert!(!e.has_profile());
        Ok(())
    }
}
