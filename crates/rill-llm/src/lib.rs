pub mod client;
pub mod completion;
pub mod echo;
pub mod engine;
pub mod factory;
pub mod settings;

pub use client::{CompletionClient, DeltaStream};
pub use completion::{ChatStep, CompletionStep};
pub use echo::{EchoClient, echo_step};
pub use engine::Engine;
pub use factory::StepFactory;
pub use settings::StepSettings;
