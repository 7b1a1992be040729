use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use rill_core::error::{ConfigError, Result, RillError};
use rill_core::event::StepEvent;
use rill_core::message::Message;
use rill_core::pubsub::SubscriberRegistry;
use rill_core::step::{CancellationToken, StateCell, Step, StepContext, StepState};
use rill_core::stream::{StepSender, StepStream, channel};

use crate::client::CompletionClient;
use crate::settings::StepSettings;

/// Object-safe completion step, the factory's return type.
pub trait ChatStep: Step<Input = Vec<Message>, Output = String> + std::fmt::Debug {
    /// Toggle streaming mode; read at the next `start`.
    fn set_streaming(&self, enabled: bool);

    /// Register an observer for this step's progress events.
    fn subscribe(&self, topic: &str) -> UnboundedReceiver<StepEvent>;
}

/// The provider completion step.
///
/// In streaming mode it emits one `Partial` per transport delta and a
/// terminal `Value` carrying the concatenation of all deltas; otherwise it
/// emits exactly one terminal. At each production point a matching event is
/// published to the step's subscriber registry, independently of the primary
/// stream; event delivery never affects it.
pub struct CompletionStep<C: ?Sized> {
    settings: Mutex<StepSettings>,
    registry: Arc<SubscriberRegistry>,
    cancel: Mutex<Option<CancellationToken>>,
    task: Mutex<Option<JoinHandle<()>>>,
    state: StateCell,
    client: Arc<C>,
}

impl<C: ?Sized> std::fmt::Debug for CompletionStep<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStep").finish_non_exhaustive()
    }
}

impl<C: CompletionClient> CompletionStep<C> {
    pub fn new(client: C, settings: StepSettings) -> Self {
        Self::from_arc(Arc::new(client), settings)
    }
}

impl<C: CompletionClient + ?Sized> CompletionStep<C> {
    pub fn from_arc(client: Arc<C>, settings: StepSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
            registry: Arc::new(SubscriberRegistry::new()),
            cancel: Mutex::new(None),
            task: Mutex::new(None),
            state: StateCell::new(),
            client,
        }
    }

    pub fn settings(&self) -> StepSettings {
        self.settings.lock().unwrap().clone()
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }
}

#[async_trait]
impl<C> Step for CompletionStep<C>
where
    C: CompletionClient + ?Sized + 'static,
{
    type Input = Vec<Message>;
    type Output = String;

    async fn start(&self, ctx: &StepContext, input: Vec<Message>) -> Result<StepStream<String>> {
        let settings = self.settings.lock().unwrap().clone();
        settings.validate(self.client.requires_api_key())?;
        if input.is_empty() {
            return Err(ConfigError::EmptyInput.into());
        }

        let scope = ctx.child();
        let token = scope.cancellation().clone();
        *self.cancel.lock().unwrap() = Some(token.clone());
        self.state.set(StepState::Running);

        tracing::debug!(
            engine = settings.engine.as_deref().unwrap_or_default(),
            stream = settings.stream,
            max_tokens = ?settings.max_tokens,
            temperature = ?settings.temperature,
            run_id = %ctx.config().run_id,
            "starting completion"
        );

        let (tx, out) = channel(1);
        let client = self.client.clone();
        let registry = self.registry.clone();
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            if settings.stream {
                run_streaming(client, settings, input, &tx, &token, &registry, &state).await;
            } else {
                run_single(client, settings, input, &tx, &token, &registry, &state).await;
            }
            state.set(StepState::Closed);
        });
        *self.task.lock().unwrap() = Some(handle);

        Ok(out)
    }

    fn interrupt(&self) {
        if let Some(token) = self.cancel.lock().unwrap().as_ref() {
            token.cancel();
        }
    }

    async fn close(&self) -> Result<()> {
        let task = self.task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        Ok(())
    }

    fn state(&self) -> StepState {
        self.state.get()
    }
}

impl<C> ChatStep for CompletionStep<C>
where
    C: CompletionClient + ?Sized + 'static,
{
    fn set_streaming(&self, enabled: bool) {
        self.settings.lock().unwrap().stream = enabled;
    }

    fn subscribe(&self, topic: &str) -> UnboundedReceiver<StepEvent> {
        self.registry.register(topic)
    }
}

async fn run_streaming<C: CompletionClient + ?Sized>(
    client: Arc<C>,
    settings: StepSettings,
    messages: Vec<Message>,
    tx: &StepSender<String>,
    token: &CancellationToken,
    registry: &SubscriberRegistry,
    state: &StateCell,
) {
    let opened = tokio::select! {
        _ = token.cancelled() => {
            finish_interrupted(String::new(), tx, registry, state).await;
            return;
        }
        opened = client.stream(&messages, &settings) => opened,
    };
    let mut deltas = match opened {
        Ok(stream) => stream,
        Err(e) => {
            finish_error(e, tx, registry, state).await;
            return;
        }
    };

    let mut completion = String::new();
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => {
                finish_interrupted(completion, tx, registry, state).await;
                return;
            }
            next = deltas.next() => next,
        };

        match next {
            None => break,
            Some(Ok(delta)) => {
                completion.push_str(&delta);
                registry.publish_all_blind(&StepEvent::Partial {
                    delta: delta.clone(),
                    completion: completion.clone(),
                });
                let sent = tokio::select! {
                    _ = token.cancelled() => {
                        finish_interrupted(completion, tx, registry, state).await;
                        return;
                    }
                    sent = tx.partial(delta) => sent,
                };
                if !sent {
                    // Consumer gone; nothing left to deliver to.
                    return;
                }
            }
            Some(Err(e)) => {
                finish_error(e, tx, registry, state).await;
                return;
            }
        }
    }

    registry.publish_all_blind(&StepEvent::Final {
        text: completion.clone(),
    });
    state.set(StepState::Finished);
    let _ = tx.value(completion).await;
}

async fn run_single<C: CompletionClient + ?Sized>(
    client: Arc<C>,
    settings: StepSettings,
    messages: Vec<Message>,
    tx: &StepSender<String>,
    token: &CancellationToken,
    registry: &SubscriberRegistry,
    state: &StateCell,
) {
    let outcome = tokio::select! {
        _ = token.cancelled() => {
            finish_interrupted(String::new(), tx, registry, state).await;
            return;
        }
        outcome = client.complete(&messages, &settings) => outcome,
    };

    match outcome {
        Ok(text) => {
            registry.publish_all_blind(&StepEvent::Final { text: text.clone() });
            state.set(StepState::Finished);
            let _ = tx.value(text).await;
        }
        Err(e) => finish_error(e, tx, registry, state).await,
    }
}

async fn finish_interrupted(
    completion: String,
    tx: &StepSender<String>,
    registry: &SubscriberRegistry,
    state: &StateCell,
) {
    tracing::debug!(accumulated = completion.len(), "completion interrupted");
    registry.publish_all_blind(&StepEvent::Interrupt { text: completion });
    state.set(StepState::Finished);
    let _ = tx.error(RillError::Interrupted).await;
}

async fn finish_error(
    error: RillError,
    tx: &StepSender<String>,
    registry: &SubscriberRegistry,
    state: &StateCell,
) {
    registry.publish_all_blind(&StepEvent::Error {
        message: error.to_string(),
    });
    state.set(StepState::Finished);
    let _ = tx.error(error).await;
}
