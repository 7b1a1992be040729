use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use rill_core::error::Result;
use rill_core::message::Message;

use crate::engine::Engine;
use crate::settings::StepSettings;

/// Incremental completion fragments from a transport.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Transport seam implemented by provider adapters.
///
/// Adapters own HTTP and credential resolution. When streaming, they emit
/// incremental deltas whose concatenation equals the full completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single-shot completion of the conversation.
    async fn complete(&self, messages: &[Message], settings: &StepSettings) -> Result<String>;

    /// Incremental deltas for a streaming completion.
    ///
    /// Default implementation completes once and yields the full text as a
    /// single delta.
    async fn stream(&self, messages: &[Message], settings: &StepSettings) -> Result<DeltaStream> {
        let full = self.complete(messages, settings).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(full) })))
    }

    /// Engine family this client serves.
    fn engine(&self) -> Engine;

    /// Whether `start` must reject a missing API key up front.
    fn requires_api_key(&self) -> bool {
        true
    }
}
