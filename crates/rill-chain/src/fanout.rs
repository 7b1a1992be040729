use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::task::JoinSet;

use rill_core::error::RillError;
use rill_core::result::StepResult;
use rill_core::step::{CancellationToken, StateCell, Step, StepContext, StepState};
use rill_core::stream::{StepStream, channel};

/// How the group reports members that terminate with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The first member error cancels the remaining siblings and becomes
    /// the group's terminal error, forwarded verbatim.
    #[default]
    FailFast,
    /// Failed members are replaced with `Default::default()` placeholders
    /// and the group still yields a full collection.
    BestEffort,
}

/// Runs one member step per input concurrently under a single cancellable
/// scope and merges their terminal results into one collection.
///
/// The merged collection is indexed by input position, so results come back
/// in input order regardless of arrival order. The group's stream yields
/// exactly one terminal result.
pub struct FanoutStep<S> {
    factory: Arc<dyn Fn() -> S + Send + Sync>,
    policy: ErrorPolicy,
    scope: Mutex<Option<CancellationToken>>,
    state: StateCell,
}

impl<S> FanoutStep<S> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            policy: ErrorPolicy::default(),
            scope: Mutex::new(None),
            state: StateCell::new(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }
}

#[async_trait]
impl<S> Step for FanoutStep<S>
where
    S: Step + 'static,
    S::Output: Default,
{
    type Input = Vec<S::Input>;
    type Output = Vec<S::Output>;

    async fn start(
        &self,
        ctx: &StepContext,
        inputs: Self::Input,
    ) -> rill_core::error::Result<StepStream<Self::Output>> {
        let scope = ctx.child();
        *self.scope.lock().unwrap() = Some(scope.cancellation().clone());
        self.state.set(StepState::Running);

        let member_count = inputs.len();
        let mut members: JoinSet<(usize, rill_core::error::Result<S::Output>)> = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let member = (self.factory)();
            let member_scope = scope.clone();
            members.spawn(async move {
                let outcome = match member.start(&member_scope, input).await {
                    Ok(stream) => stream.drain().await,
                    Err(e) => Err(e),
                };
                (index, outcome)
            });
        }

        let (tx, out) = channel(1);
        let token = scope.cancellation().clone();
        let policy = self.policy;
        let state = self.state.clone();
        tokio::spawn(async move {
            let mut slots: Vec<Option<S::Output>> = (0..member_count).map(|_| None).collect();
            let mut first_error: Option<RillError> = None;

            while let Some(joined) = members.join_next().await {
                let (index, outcome) = match joined {
                    Ok(pair) => pair,
                    Err(join_err) => {
                        if policy == ErrorPolicy::FailFast && first_error.is_none() {
                            first_error =
                                Some(RillError::Other(format!("member task failed: {join_err}")));
                            token.cancel();
                        }
                        continue;
                    }
                };

                match outcome {
                    Ok(value) => slots[index] = Some(value),
                    Err(e) => match policy {
                        ErrorPolicy::FailFast => {
                            if first_error.is_none() {
                                tracing::debug!(index, error = %e, "member failed, cancelling siblings");
                                first_error = Some(e);
                                token.cancel();
                            }
                        }
                        ErrorPolicy::BestEffort => {
                            tracing::debug!(index, error = %e, "member failed, substituting placeholder");
                        }
                    },
                }
            }

            match first_error {
                Some(e) => {
                    state.set(StepState::Finished);
                    let _ = tx.send(StepResult::Error(e)).await;
                }
                None => {
                    let results = slots.into_iter().map(Option::unwrap_or_default).collect();
                    state.set(StepState::Finished);
                    let _ = tx.send(StepResult::Value(results)).await;
                }
            }
            state.set(StepState::Closed);
        });

        Ok(out)
    }

    fn interrupt(&self) {
        if let Some(token) = self.scope.lock().unwrap().as_ref() {
            token.cancel();
        }
    }

    fn state(&self) -> StepState {
        self.state.get()
    }
}
