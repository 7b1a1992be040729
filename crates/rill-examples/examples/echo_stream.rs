//! Streaming echo demo.
//!
//! Starts the echo reference step, drains its result stream as the primary
//! consumer, and concurrently prints the progress events an independent
//! observer receives. Finishes with an interrupted run.
//!
//! ```bash
//! cargo run --example echo_stream -p rill-examples
//! ```

use std::io::Write;
use std::time::Duration;

use rill_core::event::StepEvent;
use rill_core::message::Message;
use rill_core::result::StepResult;
use rill_core::step::{Step, StepContext};
use rill_llm::completion::ChatStep;
use rill_llm::echo::echo_step;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // -----------------------------------------------------------------------
    // Demo 1: stream to completion while an observer watches
    // -----------------------------------------------------------------------
    println!("=== Demo 1: streaming with an observer ===\n");

    let step = echo_step(Duration::from_millis(50));
    let mut events = step.subscribe("ui");
    let observer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                StepEvent::Partial { completion, .. } => {
                    eprintln!("[ui] partial: {completion}");
                }
                StepEvent::Final { text } => {
                    eprintln!("[ui] final: {text}");
                    break;
                }
                StepEvent::Interrupt { text } => {
                    eprintln!("[ui] interrupted at: {text}");
                    break;
                }
                StepEvent::Error { message } => {
                    eprintln!("[ui] error: {message}");
                    break;
                }
            }
        }
    });

    let ctx = StepContext::new();
    let mut stream = step
        .start(&ctx, vec![Message::user("Hello, world!")])
        .await?;

    while let Some(result) = stream.next().await {
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
    observer.await?;

    // -----------------------------------------------------------------------
    // Demo 2: interrupt a running stream
    // -----------------------------------------------------------------------
    println!("\n=== Demo 2: interruption ===\n");

    let step = echo_step(Duration::from_millis(50));
    let ctx = StepContext::new();
    let mut stream = step
        .start(&ctx, vec![Message::user("This stream will be cut short")])
        .await?;

    let mut seen = 0;
    while let Some(result) = stream.next().await {
        match result {
            StepResult::Partial(delta) => {
                print!("{delta}");
                std::io::stdout().flush()?;
                seen += 1;
                if seen == 4 {
                    step.interrupt();
                }
            }
            StepResult::Value(full) => println!("\n=> {full}"),
            StepResult::Error(e) => println!("\n=> terminated: {e}"),
        }
    }
    step.close().await?;

    Ok(())
}
