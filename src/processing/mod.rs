//! Processing functions
//!
//! The processing phase is a fixed chain of pure functions
//! (extract → transform → analyze → validate). Each one reads a typed view of
//! its parameter map and returns a new map that the orchestrator merges into
//! the input of the next function.
//!
//! Functions are registered in a [`FunctionRegistry`], which is what step
//! execution reaches through [`FunctionActivator`].

pub mod analyze;
pub mod extract;
pub mod transform;
pub mod validate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::collectors::TextAnalysisClient;
use crate::steps::{DelegateResponse, FunctionActivator, Params};
use crate::types::{PipelineError, Result, SourceType};

/// Closed set of processing functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionName {
    Extract,
    Transform,
    Analyze,
    Validate,
}

impl FunctionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::Extract => "extract",
            FunctionName::Transform => "transform",
            FunctionName::Analyze => "analyze",
            FunctionName::Validate => "validate",
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionName {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "extract" => Ok(FunctionName::Extract),
            "transform" => Ok(FunctionName::Transform),
            "analyze" => Ok(FunctionName::Analyze),
            "validate" => Ok(FunctionName::Validate),
            other => Err(PipelineError::UnknownTag {
                kind: "function",
                tag: other.to_string(),
            }),
        }
    }
}

/// A candidate fact pulled from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub id: String,
    pub statement: String,
    pub source_id: String,
    pub source_type: SourceType,
    pub confidence: f32,
    /// Every source that states the fact, once merged.
    #[serde(default)]
    pub supporting_sources: Vec<String>,
    #[serde(default)]
    pub validated: bool,
}

#[async_trait]
pub trait PipelineFunction: Send + Sync {
    fn name(&self) -> FunctionName;
    fn description(&self) -> &str;
    async fn execute(&self, params: Params) -> Result<Params>;
}

pub struct FunctionRegistry {
    functions: HashMap<FunctionName, Arc<dyn PipelineFunction>>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry with the four processing functions.
    pub fn standard(analyzer: Arc<dyn TextAnalysisClient>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(extract::ExtractFunction::new(analyzer)));
        registry.register(Arc::new(transform::TransformFunction));
        registry.register(Arc::new(analyze::AnalyzeFunction));
        registry.register(Arc::new(validate::ValidateFunction::default()));
        registry
    }

    pub fn register(&mut self, function: Arc<dyn PipelineFunction>) {
        self.functions.insert(function.name(), function);
    }

    pub fn has_function(&self, name: FunctionName) -> bool {
        self.functions.contains_key(&name)
    }

    pub fn function_names(&self) -> Vec<FunctionName> {
        self.functions.keys().copied().collect()
    }

    /// Call a function by its string tag. Unknown tags are rejected before
    /// any lookup.
    pub async fn call_by_name(&self, name: &str, params: Params) -> Result<DelegateResponse> {
        let function: FunctionName = name.parse()?;
        self.call(function, params).await
    }
}

#[async_trait]
impl FunctionActivator for FunctionRegistry {
    async fn call(&self, function: FunctionName, params: Params) -> Result<DelegateResponse> {
        let Some(f) = self.functions.get(&function) else {
            return Err(PipelineError::NotFound(format!("Function not found: {}", function)));
        };

        match f.execute(params).await {
            Ok(data) => Ok(DelegateResponse::ok(data)),
            Err(e) => {
                tracing::warn!(function = %function, error = %e, "Processing function failed");
                Ok(DelegateResponse::failure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::PatternTextAnalyzer;
    use serde_json::json;

    fn registry() -> FunctionRegistry {
        FunctionRegistry::standard(Arc::new(PatternTextAnalyzer::new().unwrap()))
    }

    #[test]
    fn test_standard_registry() {
        let registry = registry();
        for name in [
            FunctionName::Extract,
            FunctionName::Transform,
            FunctionName::Analyze,
            FunctionName::Validate,
        ] {
            assert!(registry.has_function(name));
        }
        assert_eq!(registry.function_names().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_tag_is_rejected() {
        let err = registry().call_by_name("summarize", Params::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTag { kind: "function", .. }));
    }

    #[tokio::test]
    async fn test_bad_params_become_failure_response() {
        let params = json!({"normalized_facts": "nope"}).as_object().cloned().unwrap();
        let response = registry().call(FunctionName::Validate, params).await.unwrap();
        assert!(!response.success);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_missing_function_is_not_found() {
        let err = FunctionRegistry::new()
            .call(FunctionName::Extract, Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }
}
