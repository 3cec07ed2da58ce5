pub mod ask;
pub mod config_cmd;
pub mod serve;
pub mod tools;

use abacus_config::AppConfig;

/// Load the effective configuration, or explain why it could not be loaded.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Fail early with setup instructions when no model credentials exist.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    AZURE_OPENAI_API_KEY   (with AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_DEPLOYMENT_NAME)");
    eprintln!("    OPENAI_API_KEY         (with ABACUS_PROVIDER=openai)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
