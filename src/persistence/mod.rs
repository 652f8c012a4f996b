//! Durable storage for pipeline results.
//!
//! Persistence is optional: the orchestrator saves a finished result when a
//! [`PersistenceClient`] is configured and records a warning if the save
//! fails.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineResult;
use crate::types::{PipelineError, Result};

#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Store `result` and return the key it was stored under.
    async fn save(&self, result: &PipelineResult) -> Result<String>;

    async fn load(&self, key: &str) -> Result<PipelineResult>;

    /// Stored keys in lexical order.
    async fn list(&self) -> Result<Vec<String>>;
}

/// One pretty-printed JSON file per result.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    dir: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_for(result: &PipelineResult) -> String {
        let slug: String = result
            .research_topic
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect::<String>()
            .split('_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        let slug = if slug.is_empty() { "research".to_string() } else { slug };
        format!(
            "{}_{}",
            slug,
            result.pipeline_metadata.start_time.format("%Y%m%dT%H%M%S%3f")
        )
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(PipelineError::InvalidInput(format!("invalid result key: {key}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl PersistenceClient for JsonFilePersistence {
    async fn save(&self, result: &PipelineResult) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let key = Self::key_for(result);
        let path = self.path_for(&key)?;
        let bytes = serde_json::to_vec_pretty(result)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), "Pipeline result saved");
        Ok(key)
    }

    async fn load(&self, key: &str) -> Result<PipelineResult> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::NotFound(format!("No stored result '{key}'")));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
