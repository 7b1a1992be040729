use serde::{Deserialize, Serialize};

/// Progress events broadcast to observers, independent of the primary
/// result stream.
///
/// For one step invocation, events are published in the production order of
/// the underlying results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// One streamed fragment plus the completion accumulated so far.
    Partial { delta: String, completion: String },
    /// The full completion text.
    Final { text: String },
    /// Cancellation was observed; carries the text accumulated so far.
    Interrupt { text: String },
    /// A terminal failure.
    Error { message: String },
}

impl StepEvent {
    /// True for the events that end an invocation's event sequence.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepEvent::Partial { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_serde_roundtrip() {
        let event = StepEvent::Partial {
            delta: "l".into(),
            completion: "Hel".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"partial""#));
        let parsed: StepEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn final_serde_roundtrip() {
        let event = StepEvent::Final {
            text: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"final""#));
        let parsed: StepEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn interrupt_serde_roundtrip() {
        let event = StepEvent::Interrupt { text: "Hel".into() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"interrupt""#));
        let parsed: StepEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn error_serde_roundtrip() {
        let event = StepEvent::Error {
            message: "transport failed".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"error""#));
        let parsed: StepEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn terminality() {
        assert!(!StepEvent::Partial {
            delta: "a".into(),
            completion: "a".into()
        }
        .is_terminal());
        assert!(StepEvent::Final { text: "a".into() }.is_terminal());
        assert!(StepEvent::Interrupt { text: "a".into() }.is_terminal());
        assert!(StepEvent::Error {
            message: "e".into()
        }
        .is_terminal());
    }
}
