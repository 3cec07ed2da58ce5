//! `abacus serve`: start the HTTP gateway.

use super::{load_config, require_api_key};

pub async fn run(host: Option<String>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;

    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    require_api_key(&config)?;

    println!("Abacus Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Tool server: {}",
        config.tools.remote_url.as_deref().unwrap_or("(none)")
    );
    println!("   Max iterations: {}", config.agent.max_iterations);

    abacus_gateway::start(config).await?;

    Ok(())
}
