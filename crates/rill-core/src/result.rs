use crate::error::{Result, RillError};

/// One produced outcome unit carried between a step and its consumer.
///
/// A stream emits any number of `Partial` fragments followed by at most one
/// terminal result (`Value` or `Error`), which is always last.
#[derive(Debug)]
pub enum StepResult<T> {
    /// A progress fragment.
    Partial(T),
    /// The successful terminal result.
    Value(T),
    /// The failed terminal result.
    Error(RillError),
}

impl<T> StepResult<T> {
    /// Error flag: false only for `Error`.
    pub fn ok(&self) -> bool {
        !matches!(self, StepResult::Error(_))
    }

    /// True for `Value` and `Error`, the two results that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepResult::Value(_) | StepResult::Error(_))
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, StepResult::Partial(_))
    }

    /// The payload, or the carried error.
    pub fn into_result(self) -> Result<T> {
        match self {
            StepResult::Partial(v) | StepResult::Value(v) => Ok(v),
            StepResult::Error(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_flag() {
        assert!(StepResult::Value(1).ok());
        assert!(StepResult::Partial(1).ok());
        assert!(!StepResult::<i32>::Error(RillError::Other("e".into())).ok());
    }

    #[test]
    fn terminality() {
        assert!(StepResult::Value(1).is_terminal());
        assert!(StepResult::<i32>::Error(RillError::Interrupted).is_terminal());
        assert!(!StepResult::Partial(1).is_terminal());
        assert!(StepResult::Partial(1).is_partial());
    }

    #[test]
    fn into_result_payloads() {
        assert_eq!(StepResult::Value(2).into_result().unwrap(), 2);
        assert_eq!(StepResult::Partial("ab").into_result().unwrap(), "ab");
        let err = StepResult::<i32>::Error(RillError::Interrupted)
            .into_result()
            .unwrap_err();
        assert!(err.is_interrupted());
    }
}
