//! LLM Provider implementations

pub mod gemini;
pub mod openai;
pub mod summarizer;
pub mod traits;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use summarizer::{Summarizer, SummarizerOptions};
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};

pub use crate::config::ProviderKind;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, ModelSpec, ProviderConfig};

/// API keys per provider, read once at startup
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl Credentials {
    /// Read each provider's key from the variable named in its config
    pub fn from_env(config: &Config) -> Self {
        let keys = ProviderKind::all()
            .into_iter()
            .filter_map(|kind| {
                let env = config.provider(kind).api_key_env;
                std::env::var(&env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .map(|key| (kind, key))
            })
            .collect();
        Self { keys }
    }

    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(kind, key.into());
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }
}

/// Create a provider client
pub fn create_provider(
    kind: ProviderKind,
    config: &ProviderConfig,
    credentials: &Credentials,
) -> ProviderResult<Arc<dyn LLMProvider>> {
    if !config.enabled {
        return Err(ProviderError::Config(format!("Provider {} is disabled", kind)));
    }

    let api_key = credentials
        .get(kind)
        .ok_or_else(|| ProviderError::Config(format!("{} not set", config.api_key_env)))?;

    let provider: Arc<dyn LLMProvider> = match kind {
        ProviderKind::OpenAI => Arc::new(OpenAIClient::from_config(api_key, config)),
        ProviderKind::Gemini => Arc::new(GeminiClient::from_config(api_key, config)),
    };
    Ok(provider)
}

/// Create the summarizer for a model spec, applying provider and run settings
pub fn create_summarizer(
    spec: &ModelSpec,
    config: &Config,
    credentials: &Credentials,
) -> ProviderResult<Summarizer> {
    let provider_config = config.provider(spec.provider);
    let provider = create_provider(spec.provider, &provider_config, credentials)?;
    let options = SummarizerOptions::for_model(&config.benchmark, &provider_config, &spec.model);
    Ok(Summarizer::new(provider, spec.model.clone(), options))
}
