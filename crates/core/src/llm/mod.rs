pub mod error;
pub mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Clone)]
pub struct GenerateInput {
    /// Caller-supplied credential; the server never stores one.
    pub api_key: String,
    pub system_preamble: String,
    pub user_message: String,
}

impl GenerateInput {
    pub fn new(api_key: &str, system_preamble: &str, user_message: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            system_preamble: system_preamble.to_string(),
            user_message: user_message.to_string(),
        }
    }

    /// Single-turn prompt in the `User: ... Assistant:` shape.
    pub fn prompt(&self) -> String {
        format!(
            "{}\n\nUser: {}\n\nAssistant:",
            self.system_preamble.trim_end(),
            self.user_message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, input: GenerateInput) -> anyhow::Result<String>;
}
