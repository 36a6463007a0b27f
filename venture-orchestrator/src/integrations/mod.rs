//! External collaborator clients
//!
//! Narrow request/response boundaries only: web search feeding market
//! research, the competitor media scan behind the background branch, and
//! post-completion dossier indexing. None of these may fail a run; callers
//! treat every error here as best-effort.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use venture_core::domain::dossier::{Citation, Dossier, MarketResearch, MediaScan};

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

/// Web search used to ground market research in citations
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Citation>, IntegrationError>;
}

/// Competitor media scan backing the one background branch
#[async_trait]
pub trait MediaScanProvider: Send + Sync {
    async fn scan(
        &self,
        idea: &str,
        market: &MarketResearch,
    ) -> Result<MediaScan, IntegrationError>;
}

/// Post-completion indexing collaborator
#[async_trait]
pub trait DossierIndexer: Send + Sync {
    async fn index_dossier(&self, dossier: &Dossier) -> Result<(), IntegrationError>;
}

// =============================================================================
// HTTP implementations
// =============================================================================

async fn json_body(response: reqwest::Response) -> Result<serde_json::Value, IntegrationError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(IntegrationError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

/// Tavily-style search API client
pub struct WebSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WebSearch {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for WebSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Citation>, IntegrationError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await?;

        let payload = json_body(response).await?;
        let results = payload["results"]
            .as_array()
            .ok_or_else(|| IntegrationError::Malformed("missing results array".to_string()))?;

        Ok(results
            .iter()
            .map(|r| Citation {
                url: r["url"].as_str().unwrap_or_default().to_string(),
                title: r["title"].as_str().unwrap_or_default().to_string(),
                snippet: r["content"].as_str().unwrap_or_default().to_string(),
            })
            .collect())
    }
}

/// HTTP media analysis client for the background competitor scan
pub struct MediaScanner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_videos: usize,
}

impl MediaScanner {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_videos: 3,
        }
    }
}

#[async_trait]
impl MediaScanProvider for MediaScanner {
    async fn scan(
        &self,
        idea: &str,
        market: &MarketResearch,
    ) -> Result<MediaScan, IntegrationError> {
        let competitors: Vec<&str> = market
            .competitors
            .iter()
            .take(5)
            .map(|c| c.name.as_str())
            .collect();

        let url = format!("{}/analyze", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "idea": idea,
                "competitors": competitors,
                "max_videos": self.max_videos,
            }))
            .send()
            .await?;

        let payload = json_body(response).await?;
        serde_json::from_value(payload)
            .map_err(|e| IntegrationError::Malformed(e.to_string()))
    }
}

/// Stand-in scanner used when no media endpoint is configured
///
/// Writes an empty section with a note so the dossier still records that
/// the scan ran and found nothing, rather than omitting the branch.
pub struct DisabledMediaScanner;

#[async_trait]
impl MediaScanProvider for DisabledMediaScanner {
    async fn scan(
        &self,
        _idea: &str,
        _market: &MarketResearch,
    ) -> Result<MediaScan, IntegrationError> {
        Ok(MediaScan {
            videos: Vec::new(),
            note: Some("media scan not configured".to_string()),
        })
    }
}

/// Content indexer fed with the completed dossier
pub struct ContentIndexer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ContentIndexer {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl DossierIndexer for ContentIndexer {
    async fn index_dossier(&self, dossier: &Dossier) -> Result<(), IntegrationError> {
        let url = format!("{}/content", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "external_id": dossier.run_id,
                "title": dossier.idea,
                "body": dossier,
            }))
            .send()
            .await?;

        json_body(response).await?;
        tracing::info!("Indexed dossier for run {}", dossier.run_id);
        Ok(())
    }
}
