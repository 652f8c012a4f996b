//! Web search collector using daedra (DuckDuckGo backend).

use async_trait::async_trait;

use super::{CollectionRequest, CollectorClient};
use crate::types::{PipelineError, Result, SourceDocument, SourceType};

/// Web search results as documents, ranked by result position.
pub struct WebSearchCollector {
    num_results: usize,
}

impl WebSearchCollector {
    pub fn new(num_results: usize) -> Self {
        Self {
            num_results: num_results.max(1),
        }
    }

    /// Relevance decays with result rank.
    pub fn rank_relevance(rank: usize) -> f32 {
        (0.9 - 0.08 * rank as f32).max(0.2)
    }
}

impl Default for WebSearchCollector {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl CollectorClient for WebSearchCollector {
    fn name(&self) -> &str {
        "web_search"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Web
    }

    async fn collect(&self, request: &CollectionRequest) -> Result<Vec<SourceDocument>> {
        let search_args = daedra::SearchArgs {
            query: request.topic.clone(),
            options: Some(daedra::SearchOptions {
                num_results: self.num_results.min(request.max_sources.max(1)),
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| {
                PipelineError::collaborator("web_search", format!("Search failed: {}", e))
            })?;

        let documents: Vec<SourceDocument> = response
            .data
            .iter()
            .take(request.max_sources)
            .enumerate()
            .map(|(rank, r)| {
                SourceDocument::new(
                    format!("web_{:03}", rank),
                    r.title.clone(),
                    r.description.clone(),
                    SourceType::Web,
                    Self::rank_relevance(rank),
                )
                .with_url(r.url.clone())
            })
            .collect();

        tracing::debug!(query = %request.topic, results = documents.len(), "Web search complete");
        Ok(documents)
    }
}
