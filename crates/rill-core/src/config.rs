use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Configuration carried by a step scope through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Tags for filtering and categorization.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Arbitrary metadata key-value pairs.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Unique identifier for this run.
    pub run_id: Uuid,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            metadata: HashMap::new(),
            run_id: Uuid::new_v4(),
        }
    }
}

impl StepConfig {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StepConfig::default();
        assert!(config.tags.is_empty());
        assert!(config.metadata.is_empty());
    }

    #[test]
    fn builder_methods() {
        let config = StepConfig::new()
            .with_tag("test")
            .with_metadata("key", serde_json::json!("value"));

        assert_eq!(config.tags, vec!["test"]);
        assert_eq!(config.metadata["key"], serde_json::json!("value"));
    }

    #[test]
    fn run_id_uniqueness() {
        assert_ne!(StepConfig::new().run_id, StepConfig::new().run_id);
    }

    #[test]
    fn serde_roundtrip() {
        let config = StepConfig::new()
            .with_tag("test")
            .with_metadata("foo", serde_json::json!(42));
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: StepConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.tags, config.tags);
        assert_eq!(deserialized.metadata, config.metadata);
        assert_eq!(deserialized.run_id, config.run_id);
    }
}
