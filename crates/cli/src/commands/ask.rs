//! `abacus ask`: run the agent once on a single message.

use std::sync::Arc;

use abacus_agent::{AgentLoop, EventEmitter, StreamItem};
use tracing::debug;

use super::{load_config, require_api_key};

pub async fn run(message: &str, show_events: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    require_api_key(&config)?;

    let provider = abacus_providers::build_from_config(&config.provider)?;
    let tools = Arc::new(abacus_tools::build_registry(&config.tools).await?);
    debug!(provider = provider.name(), tools = ?tools.names(), "Agent ready");
    let agent = AgentLoop::from_config(provider, tools, &config);

    if !show_events {
        let outcome = agent.run(message, &EventEmitter::disabled()).await?;
        println!("{}", outcome.answer);
        return Ok(());
    }

    let (emitter, mut rx) = EventEmitter::channel();
    let printer = tokio::spawn(async move {
        while let Some(StreamItem::Event(event)) = rx.recv().await {
            println!("[{}] {}", event.kind, event.payload);
        }
    });

    let result = agent.run(message, &emitter).await;
    emitter.finish();
    drop(emitter);
    // The printer only stops at the sentinel, so every event is out before the answer.
    let _ = printer.await;

    let outcome = result?;
    println!();
    println!("{}", outcome.answer);
    println!(
        "({} iteration(s), {} tool call(s))",
        outcome.iterations, outcome.tool_calls_made
    );

    Ok(())
}
