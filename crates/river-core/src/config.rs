use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-invocation settings passed to a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Tags for filtering and categorization in logs.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Arbitrary metadata key-value pairs.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Unique identifier for this run.
    #[serde(default = "Uuid::new_v4")]
    pub run_id: Uuid,

    /// Wrap step failures in `RiverError::Step` with the step index and name.
    #[serde(default)]
    pub annotate_errors: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            metadata: HashMap::new(),
            run_id: Uuid::new_v4(),
            annotate_errors: false,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_annotated_errors(mut self, annotate: bool) -> Self {
        self.annotate_errors = annotate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RunConfig::default();
        assert!(config.tags.is_empty());
        assert!(config.metadata.is_empty());
        assert!(!config.annotate_errors);
    }

    #[test]
    fn builder_methods() {
        let config = RunConfig::new()
            .with_tag("ingest")
            .with_tag("nightly")
            .with_metadata("source", serde_json::json!("s3"))
            .with_annotated_errors(true);

        assert_eq!(config.tags, vec!["ingest", "nightly"]);
        assert_eq!(config.metadata["source"], serde_json::json!("s3"));
        assert!(config.annotate_errors);
    }

    #[test]
    fn run_id_uniqueness() {
        assert_ne!(RunConfig::new().run_id, RunConfig::new().run_id);
    }

    #[test]
    fn with_explicit_run_id() {
        let id = Uuid::new_v4();
        let config = RunConfig::new().with_run_id(id);
        assert_eq!(config.run_id, id);
    }

    #[test]
    fn deserialize_fills_defaults() {
        let config: RunConfig = serde_json::from_str(r#"{"tags": ["a"]}"#).unwrap();
        assert_eq!(config.tags, vec!["a"]);
        assert!(config.metadata.is_empty());
        assert!(!config.annotate_errors);
    }

    #[test]
    fn serde_roundtrip() {
        let config = RunConfig::new()
            .with_tag("test")
            .with_metadata("foo", serde_json::json!(42))
            .with_annotated_errors(true);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.tags, config.tags);
        assert_eq!(deserialized.metadata, config.metadata);
        assert_eq!(deserialized.run_id, config.run_id);
        assert!(deserialized.annotate_errors);
    }
}
