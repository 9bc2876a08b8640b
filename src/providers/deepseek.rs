use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Config;
use crate::providers::traits::CompletionProvider;

/// DeepSeek chat-completions client. The API is wire-compatible with the
/// OpenAI chat endpoint, including `response_format`.
#[derive(Clone)]
pub struct DeepSeekProvider {
    api_key: String,
    client: Client,
    api_url: String,
    model: String,
    temperature: f32,
}

impl DeepSeekProvider {
    pub fn new(api_key: String, config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            api_key,
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for DeepSeekProvider {
    async fn complete(
        &self,
        system_message: &str,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": system_message
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": self.temperature
        });

        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!(
                "API request failed: Status {}, Body: {}",
                status,
                error_text
            ));
        }

        let response_json: Value = response.json().await?;

        if let Some(error) = response_json.get("error") {
            return Err(anyhow!("API returned error: {}", error));
        }

        response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("Invalid response format from DeepSeek"))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn clone_box(&self) -> Box<dyn CompletionProvider + Send + Sync> {
        Box::new(self.clone())
    }
}
