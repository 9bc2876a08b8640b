use anyhow::Result;
use async_trait::async_trait;

/// A chat-completion backend: system instruction and user prompt in, raw
/// response text out. When `json_mode` is set the backend is asked to emit
/// a single JSON document and nothing else.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system_message: &str, prompt: &str, json_mode: bool)
        -> Result<String>;

    fn model(&self) -> &str;

    fn clone_box(&self) -> Box<dyn CompletionProvider + Send + Sync>;
}

impl Clone for Box<dyn CompletionProvider + Send + Sync> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
