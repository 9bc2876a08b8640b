use std::env;

/// Which chat-completion backend handles generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub recipe_count: usize,
    pub bonus_enabled: bool,
    pub fallback_on_failure: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let provider = match env::var("RECIPE_PROVIDER").as_deref() {
            Ok("deepseek") => ProviderKind::DeepSeek,
            _ => ProviderKind::OpenAi,
        };

        let model = match provider {
            ProviderKind::OpenAi => {
                env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string())
            }
            ProviderKind::DeepSeek => {
                env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string())
            }
        };

        let api_url = match provider {
            ProviderKind::OpenAi => env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            ProviderKind::DeepSeek => env::var("DEEPSEEK_API_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com/v1/chat/completions".to_string()),
        };

        let temperature = env::var("RECIPE_TEMPERATURE")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0.7);

        let request_timeout_secs = env::var("RECIPE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(60);

        let recipe_count = env::var("RECIPE_COUNT")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or(3);

        let bonus_enabled = env::var("RECIPE_BONUS_ENABLED")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let fallback_on_failure = env::var("RECIPE_FALLBACK_ON_FAILURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            provider,
            model,
            api_url,
            temperature,
            request_timeout_secs,
            recipe_count,
            bonus_enabled,
            fallback_on_failure,
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self.provider {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "gpt-4o".to_string(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            temperature: 0.7,
            request_timeout_secs: 60,
            recipe_count: 3,
            bonus_enabled: true,
            fallback_on_failure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.recipe_count, 3);
        assert!(config.bonus_enabled);
        assert!(!config.fallback_on_failure);
        assert_eq!(config.api_key_var(), "OPENAI_API_KEY");
    }
}
