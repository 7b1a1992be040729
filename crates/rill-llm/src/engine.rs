use serde::{Deserialize, Serialize};

/// Closed registry of engine families.
///
/// Engine identifiers are resolved to a family once, when a step is
/// constructed, never at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    OpenAi,
    Claude,
    Echo,
}

const OPENAI_PREFIXES: &[&str] = &["gpt-", "davinci", "curie", "babbage", "ada", "o1", "o3", "o4"];

impl Engine {
    /// Resolve an engine identifier to its family, or `None` for
    /// identifiers outside the registry.
    pub fn from_identifier(id: &str) -> Option<Self> {
        if id == "echo" {
            return Some(Self::Echo);
        }
        if id.starts_with("claude") {
            return Some(Self::Claude);
        }
        if OPENAI_PREFIXES.iter().any(|prefix| id.starts_with(prefix)) {
            return Some(Self::OpenAi);
        }
        None
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Claude => write!(f, "claude"),
            Self::Echo => write!(f, "echo"),
        }
    }
}
