use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{Result, RillError};
use crate::result::StepResult;

/// Create a connected producer/consumer pair for one step invocation.
///
/// The channel is bounded: a producer that outruns its consumer suspends in
/// `send`, where it must also race the run's cancellation token.
pub fn channel<T>(capacity: usize) -> (StepSender<T>, StepStream<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (StepSender { tx }, StepStream { rx })
}

/// Producing half of a step stream.
///
/// Exactly one producer writes to a stream. Dropping the sender closes the
/// stream; the producer does so once, after the terminal result.
#[derive(Debug)]
pub struct StepSender<T> {
    tx: mpsc::Sender<StepResult<T>>,
}

impl<T> StepSender<T> {
    /// Send one result in production order. Returns false once the consumer
    /// is gone, at which point the producer should unwind.
    pub async fn send(&self, result: StepResult<T>) -> bool {
        self.tx.send(result).await.is_ok()
    }

    pub async fn partial(&self, value: T) -> bool {
        self.send(StepResult::Partial(value)).await
    }

    pub async fn value(&self, value: T) -> bool {
        self.send(StepResult::Value(value)).await
    }

    pub async fn error(&self, error: RillError) -> bool {
        self.send(StepResult::Error(error)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The ordered, closeable sequence of results from one step invocation.
///
/// At most one logical consumer drains a stream; merging streams is done by
/// the fan-in group, never by sharing a stream across consumers.
#[derive(Debug)]
pub struct StepStream<T> {
    rx: mpsc::Receiver<StepResult<T>>,
}

impl<T> StepStream<T> {
    /// A stream that immediately yields `Value(value)` and closes.
    pub fn resolved(value: T) -> Self {
        Self::of(StepResult::Value(value))
    }

    /// A stream that immediately yields `Error(error)` and closes.
    pub fn rejected(error: RillError) -> Self {
        Self::of(StepResult::Error(error))
    }

    fn of(result: StepResult<T>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // try_send into an empty capacity-1 channel cannot fail
        let _ = tx.try_send(result);
        Self { rx }
    }

    /// Next result in production order; `None` once the producer has closed.
    pub async fn next(&mut self) -> Option<StepResult<T>> {
        self.rx.recv().await
    }

    /// Drain to completion, discarding partials, and return the terminal
    /// outcome. A stream closed without a terminal (interrupted before
    /// anything was produced) is reported as an interruption.
    pub async fn drain(mut self) -> Result<T> {
        while let Some(result) = self.next().await {
            match result {
                StepResult::Partial(_) => {}
                StepResult::Value(v) => return Ok(v),
                StepResult::Error(e) => return Err(e),
            }
        }
        Err(RillError::Interrupted)
    }

    /// Adapt to a `futures::Stream` of results.
    pub fn into_stream(self) -> ReceiverStream<StepResult<T>> {
        ReceiverStream::new(self.rx)
    }
}
