//! Client for the Google Books volumes search.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";

const MAX_RESULTS: &str = "10";

/// One hit, trimmed to what the book form needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Default, Deserialize)]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(rename = "imageLinks")]
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl From<Volume> for SearchResult {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        SearchResult {
            id: volume.id,
            title: info.title,
            author: info.authors.join(", "),
            thumbnail: info
                .image_links
                .and_then(|links| links.thumbnail)
                .filter(|url| !url.is_empty()),
        }
    }
}

pub struct BooksApi {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BooksApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>> {
        let url = format!("{}/volumes", self.base_url.trim_end_matches('/'));
        let mut params = vec![("q", query), ("maxResults", MAX_RESULTS)];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("calling book search")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("book search returned {status}: {body}");
        }

        let volumes: VolumesResponse = response
            .json()
            .await
            .context("parsing book search response")?;
        debug!(query, hits = volumes.items.len(), "book search finished");

        Ok(volumes.items.into_iter().map(SearchResult::from).collect())
    }
}
