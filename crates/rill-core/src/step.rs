use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;

use crate::config::StepConfig;
use crate::error::Result;
use crate::stream::{StepSender, StepStream, channel};

pub use tokio_util::sync::CancellationToken;

/// Lifecycle of a step invocation.
///
/// `Finished` is reached once the terminal result has been emitted; `Closed`
/// once the stream is closed and the invocation's resources are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StepState {
    NotStarted,
    Running,
    Finished,
    Closed,
}

/// Shared, lock-free holder for a step's lifecycle state.
///
/// Cloned into the producing task so state transitions are visible to the
/// caller while the task runs.
#[derive(Debug, Clone, Default)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, state: StepState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn get(&self) -> StepState {
        match self.0.load(Ordering::Acquire) {
            0 => StepState::NotStarted,
            1 => StepState::Running,
            2 => StepState::Finished,
            _ => StepState::Closed,
        }
    }
}

/// One pipeline invocation's shared scope: a cancellation token plus the
/// run configuration.
///
/// Every task started under a scope observes the same token; `child()`
/// derives a nested scope that is cancelled with its parent. A caller that
/// wants a deadline composes one by cancelling the scope after a delay.
#[derive(Debug, Clone)]
pub struct StepContext {
    token: CancellationToken,
    config: StepConfig,
}

impl StepContext {
    pub fn new() -> Self {
        Self::with_config(StepConfig::default())
    }

    pub fn with_config(config: StepConfig) -> Self {
        Self {
            token: CancellationToken::new(),
            config,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Derive a nested scope sharing this scope's configuration.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            config: self.config.clone(),
        }
    }

    /// Cancel every task running under this scope.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for StepContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit of possibly long-running, possibly streaming asynchronous work.
///
/// `start` returns the invocation's result stream; pre-start configuration
/// failures are returned synchronously instead, and every post-start failure
/// arrives as the stream's terminal `Error`. Composition operators are built
/// only from this contract, so new step kinds plug in without touching them.
#[async_trait]
pub trait Step: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Start the unit of work under the given scope.
    async fn start(
        &self,
        ctx: &StepContext,
        input: Self::Input,
    ) -> Result<StepStream<Self::Output>>;

    /// Request cooperative cancellation of the running invocation.
    ///
    /// The producing task observes the request at its next suspension point
    /// and unwinds: no further partials, one cancellation error terminal,
    /// then closure. Steps without suspension points ignore the request.
    fn interrupt(&self) {}

    /// Release resources held by the last invocation. Callers invoke this
    /// after fully consuming the stream.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn state(&self) -> StepState {
        StepState::NotStarted
    }
}

#[async_trait]
impl<T> Step for Box<T>
where
    T: Step + ?Sized,
{
    type Input = T::Input;
    type Output = T::Output;

    async fn start(
        &self,
        ctx: &StepContext,
        input: Self::Input,
    ) -> Result<StepStream<Self::Output>> {
        (**self).start(ctx, input).await
    }

    fn interrupt(&self) {
        (**self).interrupt()
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }

    fn state(&self) -> StepState {
        (**self).state()
    }
}

/// Extension trait providing `.pipe()` for composing Steps.
pub trait StepExt: Step + Sized {
    /// Chain this step with another into a single two-stage step, feeding
    /// this step's terminal value into `next`.
    fn pipe<S>(self, next: S) -> PipeStep<Self, S>
    where
        S: Step<Input = Self::Output>,
    {
        PipeStep::new(self, next)
    }
}

impl<T: Step + Sized> StepExt for T {}

/// Two steps chained into one sequential two-stage step.
///
/// Stage one is drained to its terminal value (its partials are not
/// forwarded), then stage two starts with that value and its stream becomes
/// the combined result. A stage-one terminal error short-circuits: stage two
/// is never started and the error is yielded verbatim.
pub struct PipeStep<A, B> {
    first: A,
    second: B,
    scope: Mutex<Option<CancellationToken>>,
    state: StateCell,
}

impl<A, B> PipeStep<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            scope: Mutex::new(None),
            state: StateCell::new(),
        }
    }
}

#[async_trait]
impl<A, B> Step for PipeStep<A, B>
where
    A: Step + 'static,
    B: Step<Input = A::Output> + 'static,
{
    type Input = A::Input;
    type Output = B::Output;

    async fn start(
        &self,
        ctx: &StepContext,
        input: Self::Input,
    ) -> Result<StepStream<Self::Output>> {
        let scope = ctx.child();
        *self.scope.lock().unwrap() = Some(scope.cancellation().clone());
        self.state.set(StepState::Running);

        let first_stream = self.first.start(&scope, input).await?;
        let intermediate = match first_stream.drain().await {
            Ok(value) => value,
            Err(e) => {
                self.state.set(StepState::Finished);
                self.state.set(StepState::Closed);
                return Ok(StepStream::rejected(e));
            }
        };

        let mut second_stream = self.second.start(&scope, intermediate).await?;

        // Forward stage two's stream so terminal emission and closure are
        // observable through this step's state.
        let (tx, out) = channel(1);
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(result) = second_stream.next().await {
                let terminal = result.is_terminal();
                if !tx.send(result).await {
                    break;
                }
                if terminal {
                    state.set(StepState::Finished);
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

/// Forward every result of `stream` into `tx`, racing each send against the
/// token so a stalled consumer cannot outlive an interruption.
///
/// Returns false when forwarding stopped early (cancellation or a closed
/// consumer).
pub async fn forward_results<T: Send + 'static>(
    mut stream: StepStream<T>,
    tx: &StepSender<T>,
    token: &CancellationToken,
) -> bool {
    while let Some(result) = stream.next().await {
        let failed = !result.ok();
        let sent = tokio::select! {
            _ = token.cancelled() => false,
            sent = tx.send(result) => sent,
        };
        if !sent {
            return false;
        }
        if failed {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RillError;

    struct AddOne {
        state: StateCell,
    }

    impl AddOne {
        fn new() -> Self {
            Self {
                state: StateCell::new(),
            }
        }
    }

    #[async_trait]
    impl Step for AddOne {
        type Input = i32;
        type Output = i32;

        async fn start(&self, _ctx: &StepContext, input: i32) -> Result<StepStream<i32>> {
            self.state.set(StepState::Running);
            let stream = StepStream::resolved(input + 1);
            self.state.set(StepState::Closed);
            Ok(stream)
        }

        fn state(&self) -> StepState {
            self.state.get()
        }
    }

    struct ToText;

    #[async_trait]
    impl Step for ToText {
        type Input = i32;
        type Output = String;

        async fn start(&self, _ctx: &StepContext, input: i32) -> Result<StepStream<String>> {
            Ok(StepStream::resolved(input.to_string()))
        }
    }

    struct Fail;

    #[async_trait]
    impl Step for Fail {
        type Input = i32;
        type Output = i32;

        async fn start(&self, _ctx: &StepContext, _input: i32) -> Result<StepStream<i32>> {
            Ok(StepStream::rejected(RillError::Other(
                "intentional failure".into(),
            )))
        }
    }

    #[tokio::test]
    async fn pipe_two_steps() {
        let pipe = AddOne::new().pipe(ToText);
        let ctx = StepContext::new();

        let stream = pipe.start(&ctx, 1).await.unwrap();
        assert_eq!(stream.drain().await.unwrap(), "2");
    }

    #[tokio::test]
    async fn pipe_three_steps() {
        let pipe = AddOne::new().pipe(AddOne::new()).pipe(ToText);
        let ctx = StepContext::new();

        let stream = pipe.start(&ctx, 1).await.unwrap();
        assert_eq!(stream.drain().await.unwrap(), "3");
    }

    #[tokio::test]
    async fn pipe_first_stage_error_short_circuits() {
        let pipe = Fail.pipe(ToText);
        let ctx = StepContext::new();

        let mut stream = pipe.start(&ctx, 1).await.unwrap();
        let first = stream.next().await.unwrap();
        assert!(!first.ok());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn pipe_reaches_closed_after_consumption() {
        let pipe = AddOne::new().pipe(ToText);
        let ctx = StepContext::new();

        let stream = pipe.start(&ctx, 41).await.unwrap();
        assert_eq!(stream.drain().await.unwrap(), "42");

        // The forwarder closes shortly after the consumer drains.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(pipe.state(), StepState::Closed);
    }

    #[tokio::test]
    async fn child_scope_is_cancelled_with_parent() {
        let ctx = StepContext::new();
        let child = ctx.child();
        assert!(!child.is_cancelled());
        ctx.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_child_leaves_parent_running() {
        let ctx = StepContext::new();
        let child = ctx.child();
        child.cancel();
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn state_cell_roundtrip() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), StepState::NotStarted);
        for state in [StepState::Running, StepState::Finished, StepState::Closed] {
            cell.set(state);
            assert_eq!(cell.get(), state);
        }
    }

    #[test]
    fn states_are_ordered() {
        assert!(StepState::NotStarted < StepState::Running);
        assert!(StepState::Running < StepState::Finished);
        assert!(StepState::Finished < StepState::Closed);
    }
}
