//! `abacus config`: configuration management commands.

use abacus_config::AppConfig;

use super::load_config;

pub fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("   Use --force to overwrite it.");
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote starter config to {}", path.display());
    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = redacted(load_config()?);
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    if config.provider.api_key.is_some() {
        config.provider.api_key = Some("[REDACTED]".into());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_masked() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".into());

        let rendered = toml::to_string_pretty(&redacted(config)).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn missing_key_stays_missing() {
        let config = redacted(AppConfig::default());
        assert!(config.provider.api_key.is_none());
    }
}
