//! Collector agent: primary source lookup and secondary source discovery.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use super::{unsupported_mode, AgentMode, ResearchAgent};
use crate::collectors::{CollectionRequest, CollectorClient};
use crate::pipeline::data::{from_params, to_params};
use crate::steps::{DelegateResponse, Params};
use crate::types::{PipelineError, ResearchScope, Result, SourceDocument};

#[derive(Debug, Deserialize)]
struct LookupParams {
    topic: String,
    scope: String,
    max_sources: usize,
    #[serde(default)]
    references: Vec<String>,
}

/// Wraps one primary collector and any number of secondary collectors.
pub struct CollectorAgent {
    primary: Arc<dyn CollectorClient>,
    secondary: Vec<Arc<dyn CollectorClient>>,
}

impl CollectorAgent {
    pub fn new(primary: Arc<dyn CollectorClient>) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
        }
    }

    pub fn with_secondary(mut self, collector: Arc<dyn CollectorClient>) -> Self {
        self.secondary.push(collector);
        self
    }

    /// Top hit of the primary collector plus the references it links to,
    /// deduplicated and capped at the scope's fan-out.
    async fn primary_lookup(&self, request: CollectionRequest) -> Result<DelegateResponse> {
        let lookup = CollectionRequest {
            max_sources: 1,
            ..request.clone()
        };
        let documents = self.primary.collect(&lookup).await?;

        let Some(primary) = documents.into_iter().next() else {
            return Ok(DelegateResponse::failure(format!(
                "{} found no article for '{}'",
                self.primary.name(),
                request.topic
            )));
        };

        let mut seen = HashSet::new();
        let references: Vec<String> = primary
            .references
            .iter()
            .filter(|r| !r.eq_ignore_ascii_case(&primary.title) && seen.insert(r.to_lowercase()))
            .take(request.scope.reference_fanout())
            .cloned()
            .collect();

        tracing::info!(
            collector = self.primary.name(),
            title = %primary.title,
            references = references.len(),
            "Primary source found"
        );

        Ok(DelegateResponse::ok(to_params(&json!({
            "documents": [primary],
            "references": references,
        }))?))
    }

    /// Documents from every secondary collector, seeded with the primary
    /// references. Any collector error fails the discovery.
    async fn secondary_discovery(&self, request: CollectionRequest) -> Result<DelegateResponse> {
        let mut documents: Vec<SourceDocument> = Vec::new();
        let mut seen = HashSet::new();

        for collector in &self.secondary {
            let found = collector.collect(&request).await.map_err(|e| match e {
                e @ PipelineError::Collaborator { .. } => e,
                other => PipelineError::collaborator(collector.name(), other.to_string()),
            })?;
            tracing::debug!(
                collector = collector.name(),
                found = found.len(),
                "Secondary collection"
            );
            documents.extend(found.into_iter().filter(|d| seen.insert(d.id.clone())));
        }

        documents.truncate(request.max_sources);
        Ok(DelegateResponse::ok(to_params(&json!({ "documents": documents }))?))
    }
}

#[async_trait]
impl ResearchAgent for CollectorAgent {
    fn name(&self) -> &str {
        "collector"
    }

    fn modes(&self) -> &[AgentMode] {
        &[AgentMode::PrimaryLookup, AgentMode::SecondaryDiscovery]
    }

    async fn activate(&self, mode: AgentMode, params: Params) -> Result<DelegateResponse> {
        let input: LookupParams = from_params(&params)?;
        let scope: ResearchScope = input.scope.parse()?;
        let request = CollectionRequest::new(input.topic, scope, input.max_sources)
            .with_seeds(input.references);

        match mode {
            AgentMode::PrimaryLookup => self.primary_lookup(request).await,
            AgentMode::SecondaryDiscovery => self.secondary_discovery(request).await,
            other => Err(unsupported_mode(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;

    struct FixedCollector {
        documents: Vec<SourceDocument>,
    }

    #[async_trait]
    impl CollectorClient for FixedCollector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn source_type(&self) -> SourceType {
            SourceType::Encyclopedia
        }

        async fn collect(&self, request: &CollectionRequest) -> Result<Vec<SourceDocument>> {
            Ok(self.documents.iter().take(request.max_sources).cloned().collect())
        }
    }

    fn params(scope: &str) -> Params {
        to_params(&json!({"topic": "climate policy", "scope": scope, "max_sources": 5})).unwrap()
    }

    #[tokio::test]
    async fn test_references_capped_by_scope() {
        let references: Vec<String> = (0..20).map(|i| format!("Ref {i}")).collect();
        let doc = SourceDocument::new("p", "Climate policy", "text", SourceType::Encyclopedia, 0.9)
            .with_references(references);
        let agent = CollectorAgent::new(Arc::new(FixedCollector { documents: vec![doc] }));

        let response = agent.activate(AgentMode::PrimaryLookup, params("narrow")).await.unwrap();
        assert!(response.success);
        assert_eq!(response.data["references"].as_array().unwrap().len(), 3);

        let response = agent
            .activate(AgentMode::PrimaryLookup, params("comprehensive"))
            .await
            .unwrap();
        assert_eq!(response.data["references"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_no_article_is_failure_response() {
        let agent = CollectorAgent::new(Arc::new(FixedCollector { documents: vec![] }));
        let response = agent.activate(AgentMode::PrimaryLookup, params("narrow")).await.unwrap();
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_unknown_scope_rejected() {
        let agent = CollectorAgent::new(Arc::new(FixedCollector { documents: vec![] }));
        let err = agent.activate(AgentMode::PrimaryLookup, params("galactic")).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTag { .. }));
    }

    #[tokio::test]
    async fn test_secondary_deduplicates_across_collectors() {
        let doc = SourceDocument::new("s1", "Carbon tax", "text", SourceType::Encyclopedia, 0.7);
        let agent = CollectorAgent::new(Arc::new(FixedCollector { documents: vec![] }))
            .with_secondary(Arc::new(FixedCollector { documents: vec![doc.clone()] }))
            .with_secondary(Arc::new(FixedCollector { documents: vec![doc] }));

        let response = agent
            .activate(AgentMode::SecondaryDiscovery, params("narrow"))
            .await
            .unwrap();
        assert_eq!(response.data["documents"].as_array().unwrap().len(), 1);
    }
}
