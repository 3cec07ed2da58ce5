//! `abacus tools` and `abacus serve-tools`.

use super::load_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let registry = abacus_tools::build_registry(&config.tools).await?;

    println!("Registered tools ({}):", registry.len());
    for definition in registry.definitions() {
        println!("   {:<10} {}", definition.name, definition.description);
    }

    Ok(())
}

/// Serve the built-in tools until interrupted.
pub async fn serve(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    println!("Abacus Tool Server");
    println!("   Listening: {host}:{port}");
    println!("   Endpoints: POST /tools/list, POST /tools/call");

    abacus_gateway::serve_tools(host, port, config.gateway.max_body_bytes).await
}
