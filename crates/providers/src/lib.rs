//! Model provider implementations for Abacus.
//!
//! All providers implement the `abacus_core::Provider` trait.
//! [`build_from_config`] selects and constructs the configured one.

pub mod openai_compat;

use std::sync::Arc;

use abacus_config::{ProviderConfig, ProviderKind};
use abacus_core::Provider;
use abacus_core::error::ProviderError;

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Fails with [`ProviderError::NotConfigured`] when credentials or the
/// deployment are missing, so the caller can report it before serving.
pub fn build_from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured("no API key (set AZURE_OPENAI_API_KEY or OPENAI_API_KEY)".into())
    })?;
    let timeout = std::time::Duration::from_secs(config.timeout_secs);

    let provider = match config.kind {
        ProviderKind::Azure => {
            let endpoint = config.endpoint.clone().ok_or_else(|| {
                ProviderError::NotConfigured("no Azure endpoint (set AZURE_OPENAI_ENDPOINT)".into())
            })?;
            let deployment = config.deployment.clone().ok_or_else(|| {
                ProviderError::NotConfigured(
                    "no Azure deployment (set AZURE_OPENAI_DEPLOYMENT_NAME)".into(),
                )
            })?;
            OpenAiCompatProvider::azure(
                &endpoint,
                &deployment,
                &config.api_version,
                api_key,
                timeout,
            )?
        }
        ProviderKind::Openai => {
            if config.deployment.is_none() {
                return Err(ProviderError::NotConfigured(
                    "no model (set OPENAI_MODEL)".into(),
                ));
            }
            let base_url = config
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".into());
            OpenAiCompatProvider::new("openai", base_url, api_key, timeout)?
        }
    };

    Ok(Arc::new(provider))
}
