pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod pubsub;
pub mod result;
pub mod step;
pub mod stream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::StepConfig;
    pub use crate::error::{ConfigError, CompletionError, Result, RillError};
    pub use crate::event::StepEvent;
    pub use crate::message::{Message, Role};
    pub use crate::pubsub::SubscriberRegistry;
    pub use crate::result::StepResult;
    pub use crate::step::{CancellationToken, PipeStep, Step, StepContext, StepExt, StepState};
    pub use crate::stream::{StepSender, StepStream, channel};
}
