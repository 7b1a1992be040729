use std::sync::Arc;

use rill_core::result::StepResult;
use rill_core::step::{Step, StepContext, forward_results};
use rill_core::stream::{StepStream, channel};

/// Apply `step` to every terminal value drained from `upstream`.
///
/// Upstream partials are forwarded downstream unchanged without invoking the
/// step; each upstream terminal `Value` starts the step with that value and
/// everything the invocation produces is forwarded in order. An error —
/// upstream or step-produced — is forwarded verbatim and stops further
/// production. Cancelling the scope stops upstream draining and suspends
/// further invocations; steps started here observe the same signal.
///
/// The step's input and output types match so that untransformed partials
/// remain well-typed on the downstream stream; use `pipe` to change types.
pub fn bind<T, S>(ctx: &StepContext, mut upstream: StepStream<T>, step: Arc<S>) -> StepStream<T>
where
    T: Send + 'static,
    S: Step<Input = T, Output = T> + 'static,
{
    let scope = ctx.child();
    let (tx, out) = channel(1);

    tokio::spawn(async move {
        let token = scope.cancellation().clone();
        loop {
            let result = tokio::select! {
                _ = token.cancelled() => break,
                next = upstream.next() => match next {
                    Some(result) => result,
                    None => break,
                },
            };

            match result {
                StepResult::Partial(v) => {
                    let sent = tokio::select! {
                        _ = token.cancelled() => false,
                        sent = tx.partial(v) => sent,
                    };
                    if !sent {
                        break;
                    }
                }
                StepResult::Value(v) => {
                    let inner = match step.start(&scope, v).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = tx.error(e).await;
                            break;
                        }
                    };
                    if !forward_results(inner, &tx, &token).await {
                        break;
                    }
                }
                StepResult::Error(e) => {
                    let _ = tx.error(e).await;
                    break;
                }
            }
        }
    });

    out
}
