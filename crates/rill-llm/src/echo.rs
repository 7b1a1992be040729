use std::time::Duration;

use async_trait::async_trait;

use rill_core::error::Result;
use rill_core::message::{Message, last_text};

use crate::client::{CompletionClient, DeltaStream};
use crate::completion::CompletionStep;
use crate::engine::Engine;
use crate::settings::StepSettings;

/// Reference transport that replays the last input message, one character
/// per `time_per_char`.
///
/// Having no external dependency, the echo step built on top of this client
/// exercises the full streaming, cancellation, and event publication
/// machinery; tests and demos run against it.
pub struct EchoClient {
    time_per_char: Duration,
}

impl EchoClient {
    pub fn new(time_per_char: Duration) -> Self {
        Self { time_per_char }
    }
}

impl Default for EchoClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl CompletionClient for EchoClient {
    async fn complete(&self, messages: &[Message], _settings: &StepSettings) -> Result<String> {
        Ok(last_text(messages).to_string())
    }

    async fn stream(&self, messages: &[Message], _settings: &StepSettings) -> Result<DeltaStream> {
        let text = last_text(messages).to_string();
        let pace = self.time_per_char;
        Ok(Box::pin(async_stream::stream! {
            for c in text.chars() {
                tokio::time::sleep(pace).await;
                yield Ok(c.to_string());
            }
        }))
    }

    fn engine(&self) -> Engine {
        Engine::Echo
    }

    fn requires_api_key(&self) -> bool {
        false
    }
}

/// Build the echo reference step with streaming enabled.
pub fn echo_step(time_per_char: Duration) -> CompletionStep<EchoClient> {
    CompletionStep::new(
        EchoClient::new(time_per_char),
        StepSettings::new().with_engine("echo").with_stream(true),
    )
}
