use anyhow::{anyhow, Context};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message,
};
use aws_sdk_bedrockruntime::Client;
use tracing::debug;

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";

const MAX_TOKENS: i32 = 1024;
const TEMPERATURE: f32 = 0.7;

/// Free-form text completion for a single user prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct BedrockGenerator {
    client: Client,
    model_id: String,
}

impl BedrockGenerator {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for BedrockGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt.to_string()))
            .build()
            .context("building prompt message")?;

        let output = self
            .client
            .converse()
            .model_id(&self.model_id)
            .messages(message)
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(MAX_TOKENS)
                    .temperature(TEMPERATURE)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| anyhow!("converse failed: {}", DisplayErrorContext(err)))?;

        if let Some(usage) = output.usage() {
            debug!(
                model = %self.model_id,
                input_tokens = usage.input_tokens(),
                output_tokens = usage.output_tokens(),
                "model replied"
            );
        }

        let reply = output
            .output()
            .and_then(|output| output.as_message().ok())
            .ok_or_else(|| anyhow!("model returned no message"))?;

        let text: String = reply
            .content()
            .iter()
            .filter_map(|block| block.as_text().ok())
            .map(String::as_str)
            .collect();
        if text.is_empty() {
            return Err(anyhow!("model returned no text"));
        }
        Ok(text)
    }
}
