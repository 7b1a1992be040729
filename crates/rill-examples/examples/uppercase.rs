//! Bind a completion step's stream through an uppercasing lambda.
//!
//! The completion step streams characters; `bind` forwards each partial
//! untransformed and applies the lambda to the terminal value.
//!
//! ```bash
//! cargo run --example uppercase -p rill-examples
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use rill_chain::{LambdaStep, bind};
use rill_core::message::Message;
use rill_core::result::StepResult;
use rill_core::step::{Step, StepContext};
use rill_llm::echo::echo_step;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ctx = StepContext::new();
    let messages = vec![Message::user("Hello, my friend?")];

    // Streaming completion step
    let step = echo_step(Duration::from_millis(50));
    // Uppercase lambda step
    let uppercase = Arc::new(LambdaStep::new(|s: String| Ok(s.to_uppercase())));

    // Start the completion and chain its stream through the lambda
    let stream = step.start(&ctx, messages).await?;
    let mut chained = bind(&ctx, stream, uppercase);

    while let Some(result) = chained.next().await {
        match result {
            StepResult::Partial(delta) => {
                print!("{delta}");
                std::io::stdout().flush()?;
            }
            StepResult::Value(full) => println!("\n=> {full}"),
            StepResult::Error(e) => println!("\n=> error: {e}"),
        }
    }
    step.close().await?;

    Ok(())
}
