//! Wikipedia collector backed by the MediaWiki action API.
//!
//! Without seed references the collector runs a full-text search for the
//! topic and returns the intro extract, canonical URL and outgoing article
//! links of each hit. With seed references it fetches those exact titles
//! instead, which is how secondary discovery follows the primary article's
//! links.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{CollectionRequest, CollectorClient};
use crate::types::{PipelineError, Result, SourceDocument, SourceType};

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// MediaWiki caps title lists at 50 per request.
const MAX_TITLES: usize = 50;
const PRIMARY_RELEVANCE: f32 = 0.9;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryPages>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    #[serde(default)]
    pageid: Option<u64>,
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    links: Vec<WikiLink>,
    #[serde(default)]
    missing: bool,
    /// Search rank when the page came from a search generator.
    #[serde(default)]
    index: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WikiLink {
    title: String,
}

pub struct WikipediaCollector {
    client: Client,
    api_url: String,
}

impl WikipediaCollector {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ares-research/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<Vec<WikiPage>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(PipelineError::collaborator(
                "wikipedia",
                format!("{}: {}", error.code, error.info),
            ));
        }

        let mut pages: Vec<WikiPage> = body
            .query
            .map(|q| q.pages)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.missing)
            .collect();
        pages.sort_by_key(|p| p.index.unwrap_or(u32::MAX));
        Ok(pages)
    }

    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<WikiPage>> {
        self.query(&[
            ("generator", "search".to_string()),
            ("gsrsearch", topic.to_string()),
            ("gsrlimit", limit.clamp(1, MAX_TITLES).to_string()),
            ("prop", "extracts|info|links".to_string()),
            ("exintro", "1".to_string()),
            ("explaintext", "1".to_string()),
            ("inprop", "url".to_string()),
            ("plnamespace", "0".to_string()),
            ("pllimit", "max".to_string()),
            ("redirects", "1".to_string()),
        ])
        .await
    }

    async fn fetch_titles(&self, titles: &[String]) -> Result<Vec<WikiPage>> {
        let titles: Vec<&str> = titles.iter().take(MAX_TITLES).map(String::as_str).collect();
        let mut pages = self
            .query(&[
                ("titles", titles.join("|")),
                ("prop", "extracts|info".to_string()),
                ("exintro", "1".to_string()),
                ("explaintext", "1".to_string()),
                ("inprop", "url".to_string()),
                ("redirects", "1".to_string()),
            ])
            .await?;

        // Keep the caller's seed order.
        pages.sort_by_key(|p| {
            titles
                .iter()
                .position(|t| t.eq_ignore_ascii_case(&p.title))
                .unwrap_or(usize::MAX)
        });
        Ok(pages)
    }

    fn to_document(page: WikiPage, relevance: f32) -> SourceDocument {
        let id = match page.pageid {
            Some(id) => format!("wikipedia_{}", id),
            None => format!("wikipedia_{}", page.title.replace(' ', "_")),
        };
        let references = page.links.into_iter().map(|l| l.title).collect();
        let mut doc = SourceDocument::new(
            id,
            page.title,
            page.extract.unwrap_or_default(),
            SourceType::Encyclopedia,
            relevance,
        )
        .with_references(references);
        doc.url = page.fullurl;
        doc
    }
}

#[async_trait]
impl CollectorClient for WikipediaCollector {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Encyclopedia
    }

    async fn collect(&self, request: &CollectionRequest) -> Result<Vec<SourceDocument>> {
        let seeded = !request.seed_references.is_empty();
        let pages = if seeded {
            self.fetch_titles(&request.seed_references).await?
        } else {
            self.search(&request.topic, request.max_sources).await?
        };

        let documents: Vec<SourceDocument> = pages
            .into_iter()
            .filter(|p| p.extract.as_deref().is_some_and(|e| !e.trim().is_empty()))
            .take(request.max_sources)
            .enumerate()
            .map(|(rank, page)| {
                let relevance = if rank == 0 && !seeded {
                    PRIMARY_RELEVANCE
                } else {
                    (0.8 - 0.05 * rank as f32).max(0.3)
                };
                Self::to_document(page, relevance)
            })
            .collect();

        tracing::debug!(
            topic = %request.topic,
            seeded,
            documents = documents.len(),
            "Wikipedia collection complete"
        );
        Ok(documents)
    }
}
