use serde::{Deserialize, Serialize};

use rill_core::error::ConfigError;

/// Settings controlling a completion step invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSettings {
    /// Engine identifier, e.g. "gpt-4.1-mini", "claude-sonnet-4-5", "echo".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Emit per-delta partial results when true; read once at `start`.
    #[serde(default)]
    pub stream: bool,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Stop sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl StepSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Pre-start validation; failures are returned synchronously from
    /// `start` before any stream is created.
    pub fn validate(&self, requires_api_key: bool) -> Result<(), ConfigError> {
        if self.engine.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingEngine);
        }
        if requires_api_key && self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}
