use thiserror::Error;

/// Top-level error type for the rill pipeline.
#[derive(Debug, Error)]
pub enum RillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// Cooperative cancellation, delivered as a stream's terminal error.
    #[error("step interrupted")]
    Interrupted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl RillError {
    /// True when this error is the cancellation terminal.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RillError::Interrupted)
    }
}

/// Errors detected before a step starts.
///
/// These are returned synchronously from `Step::start`; no stream is created.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no api key configured")]
    MissingApiKey,

    #[error("no engine specified")]
    MissingEngine,

    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    #[error("no input")]
    EmptyInput,
}

/// Runtime failures of a started step, delivered as a terminal `Error`
/// result so the stream is the single place to observe every outcome.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unsupported parameter: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, RillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::MissingApiKey;
        assert_eq!(err.to_string(), "no api key configured");
    }

    #[test]
    fn config_error_unknown_engine_display() {
        let err = ConfigError::UnknownEngine("davinci-003".into());
        assert_eq!(err.to_string(), "unknown engine: davinci-003");
    }

    #[test]
    fn completion_error_display() {
        let err = CompletionError::Transport("connection reset".into());
        assert_eq!(err.to_string(), "transport failed: connection reset");
    }

    #[test]
    fn rill_error_from_config_error() {
        let err: RillError = ConfigError::MissingEngine.into();
        assert!(matches!(err, RillError::Config(ConfigError::MissingEngine)));
        assert!(err.to_string().contains("no engine specified"));
    }

    #[test]
    fn rill_error_from_completion_error() {
        let err: RillError = CompletionError::Api("bad request".into()).into();
        assert!(matches!(err, RillError::Completion(CompletionError::Api(_))));
    }

    #[test]
    fn interrupted_is_distinguished() {
        assert!(RillError::Interrupted.is_interrupted());
        assert!(!RillError::Other("boom".into()).is_interrupted());
        let err: RillError = CompletionError::Api("x".into()).into();
        assert!(!err.is_interrupted());
    }
}
