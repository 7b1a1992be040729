use std::sync::Arc;

use async_trait::async_trait;

use rill_core::error::Result;
use rill_core::step::{StateCell, Step, StepContext, StepState};
use rill_core::stream::StepStream;

/// A step wrapping a deterministic transform.
///
/// `start` computes synchronously, emits a single terminal result, and
/// closes. There are no suspension points, so `interrupt` has nothing to
/// cancel. Used to post-process another step's output without adding
/// concurrency.
pub struct LambdaStep<I, O> {
    func: Arc<dyn Fn(I) -> Result<O> + Send + Sync>,
    state: StateCell,
}

impl<I, O> LambdaStep<I, O> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(I) -> Result<O> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            state: StateCell::new(),
        }
    }
}

#[async_trait]
impl<I, O> Step for LambdaStep<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    async fn start(&self, _ctx: &StepContext, input: I) -> Result<StepStream<O>> {
        self.state.set(StepState::Running);
        let stream = match (self.func)(input) {
            Ok(value) => StepStream::resolved(value),
            Err(e) => StepStream::rejected(e),
        };
        self.state.set(StepState::Finished);
        self.state.set(StepState::Closed);
        Ok(stream)
    }

    fn state(&self) -> StepState {
        self.state.get()
    }
}
