//! Photo harvesting from the Flickr search API.
//!
//! Pages through `flickr.photos.search` for a tag set and downloads each result
//! into a flat directory as `{id}.jpg`. Existing files are skipped, so an
//! interrupted harvest resumes where it stopped.

use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;

const FLICKR_REST_URL: &str = "https://api.flickr.com/services/rest/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable consulted when no API key is given explicitly.
pub const API_KEY_ENV: &str = "FLICKR_API_KEY";

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub api_key: String,
    /// Comma-separated tags; photos must carry all of them.
    pub tags: String,
    pub per_page: u32,
    pub max_pages: u32,
    pub out_dir: PathBuf,
    /// Pause after each download.
    pub delay: Duration,
}

impl HarvestConfig {
    pub fn new(api_key: String, out_dir: PathBuf) -> Self {
        Self {
            api_key,
            tags: "yellowstone,landscape".to_string(),
            per_page: 100,
            max_pages: 5,
            out_dir,
            delay: Duration::from_millis(200),
        }
    }
}

/// Resolve the API key from an explicit value or [`API_KEY_ENV`].
pub fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    match explicit.or_else(|| std::env::var(API_KEY_ENV).ok()) {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("No Flickr API key: pass --api-key or set {API_KEY_ENV}"),
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Photo {
    pub id: String,
    pub secret: String,
    pub server: String,
    pub farm: u32,
}

impl Photo {
    pub fn url(&self) -> String {
        format!(
            "https://farm{}.staticflickr.com/{}/{}_{}.jpg",
            self.farm, self.server, self.id, self.secret
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.id)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Option<PhotoPage>,
    #[serde(default)]
    stat: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PhotoPage {
    pub page: u32,
    pub pages: u32,
    #[serde(default)]
    pub photo: Vec<Photo>,
}

/// Parse a `flickr.photos.search` JSON body.
pub fn parse_search_response(body: &str) -> Result<PhotoPage> {
    let response: SearchResponse =
        serde_json::from_str(body).context("Failed to parse Flickr search response")?;

    if response.stat.as_deref() == Some("fail") {
        bail!(
            "Flickr search failed: {}",
            response.message.unwrap_or_else(|| "Unknown error".to_string())
        );
    }
    response.photos.context("Flickr search response has no 'photos' field")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub pages: u32,
    pub downloaded: usize,
    pub existing: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct Harvester {
    config: HarvestConfig,
    client: Client,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { config, client })
    }

    fn search_request(&self, page: u32) -> RequestBuilder {
        let page = page.to_string();
        let per_page = self.config.per_page.to_string();
        self.client.get(FLICKR_REST_URL).query(&[
            ("method", "flickr.photos.search"),
            ("format", "json"),
            ("nojsoncallback", "1"),
            ("api_key", self.config.api_key.as_str()),
            ("tags", self.config.tags.as_str()),
            ("tag_mode", "all"),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ])
    }

    pub fn search_page(&self, page: u32) -> Result<PhotoPage> {
        let body = self
            .search_request(page)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to request search page {page}"))?
            .text()
            .context("Failed to read search response")?;
        parse_search_response(&body)
    }

    /// Download `photo` unless its file exists. Returns false if it was already present.
    pub fn download(&self, photo: &Photo) -> Result<bool> {
        let path = self.config.out_dir.join(photo.file_name());
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Already downloaded");
            return Ok(false);
        }

        let url = photo.url();
        tracing::info!(url = %url, "Downloading");
        let bytes = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .with_context(|| format!("Failed to download {url}"))?;

        common::write_atomic(&path, |w| w.write_all(&bytes))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }

    /// Page through the search results and download every photo.
    ///
    /// A failed search request ends the harvest; a failed download is logged and
    /// the harvest continues.
    pub fn run(&self) -> Result<HarvestSummary> {
        create_out_dir(&self.config.out_dir)?;
        let mut summary = HarvestSummary::default();

        for page in 1..=self.config.max_pages {
            tracing::info!(page, "Requesting search page");
            let result = match self.search_page(page) {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(page, error = %format!("{e:#}"), "Search request failed");
                    break;
                }
            };
            if result.photo.is_empty() {
                tracing::info!(page, "No more photos");
                break;
            }
            summary.pages += 1;

            for photo in &result.photo {
                match self.download(photo) {
                    Ok(true) => {
                        summary.downloaded += 1;
                        sleep(self.config.delay);
                    }
                    Ok(false) => summary.existing += 1,
                    Err(e) => {
                        tracing::warn!(id = %photo.id, error = %format!("{e:#}"), "Download failed");
                        summary.failed += 1;
                    }
                }
            }

            tracing::info!(page, pages = result.pages, "Finished page");
            if page >= result.pages {
                break;
            }
        }

        tracing::info!(
            pages = summary.pages,
            downloaded = summary.downloaded,
            existing = summary.existing,
            failed = summary.failed,
            "Harvest finished"
        );
        Ok(summary)
    }
}

fn create_out_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}
