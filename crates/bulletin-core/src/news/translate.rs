use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::config::TranslationConfig;
use crate::{Error, Result};

const MAX_INPUT_CHARS: usize = 2000;

fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Translates article text before it is rendered
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Translation through the OpenAI chat completions API
pub struct OpenAiTranslator {
    client: Client<OpenAIConfig>,
    model: String,
    source_language: String,
    target_language: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| Error::Config("OpenAI API key not configured for translation".to_string()))?;

        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));

        Ok(Self {
            client,
            model: config.openai_model.clone(),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
        })
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Translate the following text from {} to {}. Reply with the translation only, without quotes or commentary:\n\n{}",
            self.source_language,
            self.target_language,
            truncate_chars(text, MAX_INPUT_CHARS)
        )
    }
}

#[async_trait::async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(self.prompt(text))
                    .build()
                    .map_err(|e| Error::Translation(e.to_string()))?,
            )])
            .max_tokens(600u32)
            .build()
            .map_err(|e| Error::Translation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::Translation(e.to_string()))?;

        let translated = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if translated.is_empty() {
            return Err(Error::Translation("empty translation returned".to_string()));
        }

        Ok(translated)
    }
}
