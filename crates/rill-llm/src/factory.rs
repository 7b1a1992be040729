use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rill_core::error::{ConfigError, Result};

use crate::client::CompletionClient;
use crate::completion::{ChatStep, CompletionStep};
use crate::echo::EchoClient;
use crate::engine::Engine;
use crate::settings::StepSettings;

/// Builds completion steps from settings and the transports registered per
/// engine family.
///
/// The engine identifier is resolved against the closed `Engine` registry
/// here, at construction time, never at call time.
#[derive(Default)]
pub struct StepFactory {
    clients: HashMap<Engine, Arc<dyn CompletionClient>>,
}

impl StepFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport under its engine family.
    pub fn register(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.clients.insert(client.engine(), client);
        self
    }

    /// Register the echo reference transport.
    pub fn with_echo(self, time_per_char: Duration) -> Self {
        self.register(Arc::new(EchoClient::new(time_per_char)))
    }

    /// Build a completion step for the engine named in `settings`.
    pub fn new_step(&self, settings: StepSettings) -> Result<Box<dyn ChatStep>> {
        let id = settings.engine.as_deref().ok_or(ConfigError::MissingEngine)?;
        let engine = Engine::from_identifier(id)
            .ok_or_else(|| ConfigError::UnknownEngine(id.to_string()))?;
        let client = self
            .clients
            .get(&engine)
            .ok_or_else(|| ConfigError::UnknownEngine(id.to_string()))?
            .clone();
        Ok(Box::new(CompletionStep::from_arc(client, settings)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::error::RillError;
    use rill_core::message::Message;
    use rill_core::step::{Step, StepContext};

    #[tokio::test]
    async fn builds_a_working_echo_step() {
        let factory = StepFactory::new().with_echo(Duration::from_millis(1));
        let step = factory
            .new_step(StepSettings::new().with_engine("echo"))
            .unwrap();
        let ctx = StepContext::new();

        let stream = step.start(&ctx, vec![Message::user("Hi")]).await.unwrap();
        assert_eq!(stream.drain().await.unwrap(), "Hi");
    }

    #[test]
    fn missing_engine_is_rejected() {
        let factory = StepFactory::new().with_echo(Duration::from_millis(1));
        let err = factory.new_step(StepSettings::new()).unwrap_err();
        assert!(matches!(
            err,
            RillError::Config(ConfigError::MissingEngine)
        ));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let factory = StepFactory::new().with_echo(Duration::from_millis(1));
        let err = factory
            .new_step(StepSettings::new().with_engine("gemini-2.5-pro"))
            .unwrap_err();
        assert!(matches!(
            err,
            RillError::Config(ConfigError::UnknownEngine(_))
        ));
    }

    #[test]
    fn unregistered_engine_family_is_rejected() {
        let factory = StepFactory::new();
        let err = factory
            .new_step(StepSettings::new().with_engine("claude-sonnet-4-5"))
            .unwrap_err();
        assert!(matches!(
            err,
            RillError::Config(ConfigError::UnknownEngine(_))
        ));
    }

    #[tokio::test]
    async fn factory_step_exposes_streaming_toggle() {
        let factory = StepFactory::new().with_echo(Duration::from_millis(1));
        let step = factory
            .new_step(StepSettings::new().with_engine("echo"))
            .unwrap();
        step.set_streaming(true);
        let ctx = StepContext::new();

        let mut stream = step.start(&ctx, vec![Message::user("ab")]).await.unwrap();
        let mut partials = 0;
        let mut terminal = None;
        while let Some(result) = stream.next().await {
            if result.is_partial() {
                partials += 1;
            } else {
                terminal = Some(result.into_result().unwrap());
            }
        }
        assert_eq!(partials, 2);
        assert_eq!(terminal.unwrap(), "ab");
    }
}
