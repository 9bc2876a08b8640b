pub mod deepseek;
pub mod openai;
pub mod traits;

use anyhow::{anyhow, Result};
use std::env;

use crate::config::{Config, ProviderKind};
use deepseek::DeepSeekProvider;
use openai::OpenAiProvider;
use traits::CompletionProvider;

/// Build the configured provider, reading its credential from the
/// environment.
pub fn from_config(config: &Config) -> Result<Box<dyn CompletionProvider + Send + Sync>> {
    let key_var = config.api_key_var();
    let api_key =
        env::var(key_var).map_err(|_| anyhow!("environment variable {} not set", key_var))?;

    Ok(match config.provider {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key, config)?),
        ProviderKind::DeepSeek => Box::new(DeepSeekProvider::new(api_key, config)?),
    })
}
