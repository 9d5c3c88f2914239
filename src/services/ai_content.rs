//! Marketing copy generation through a hosted chat-completion model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::error::{AppError, AppResult};

const EMAIL_SYSTEM_PROMPT: &str = "You are a marketing copywriter for a repair shop. \
Reply with a JSON object containing exactly two string fields: \"subject\" (the email \
subject line) and \"content\" (the email body as simple HTML). Do not add any other text.";

const SMS_SYSTEM_PROMPT: &str = "You are a marketing copywriter for a repair shop. \
Write a single SMS message of at most 160 characters. Reply with the message text only.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    /// Ask the model for a JSON object instead of free text.
    pub json_output: bool,
}

/// Something that turns a prompt into raw model text.
#[async_trait]
pub trait CompletionProvider: Send + Sync + 'static {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;
}

// ============================================================================
// OpenAI-compatible provider
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::AiProvider(format!(
                "Completion request failed ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::AiProvider(format!("Failed to read completion response: {}", e))
        })?;

        // An empty answer is the caller's problem to interpret.
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

// ============================================================================
// Content service
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedEmail {
    pub subject: String,
    pub content: String,
}

/// Parse the model's email answer. Anything that is not a JSON object with
/// string `subject` and `content` is a parse failure.
pub fn parse_email_completion(raw: &str) -> AppResult<GeneratedEmail> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::AiParse("model returned an empty response".to_string()));
    }
    serde_json::from_str::<GeneratedEmail>(trimmed).map_err(|e| AppError::AiParse(e.to_string()))
}

#[derive(Clone)]
pub struct AiContentService {
    provider: Option<Arc<dyn CompletionProvider>>,
    model: String,
    email_max_tokens: u32,
    sms_max_tokens: u32,
}

impl AiContentService {
    /// Build the service from config. Without an API key the service exists
    /// but every call answers `ServiceUnavailable`.
    pub fn new(config: &OpenAiConfig) -> AppResult<Self> {
        let provider: Option<Arc<dyn CompletionProvider>> = match config.api_key.as_deref() {
            Some(key) => Some(Arc::new(OpenAiProvider::new(
                &config.base_url,
                key,
                Duration::from_secs(config.timeout_seconds),
            )?)),
            None => {
                tracing::warn!("OPENAI_API_KEY not set, AI content generation disabled");
                None
            }
        };

        Ok(Self {
            provider,
            model: config.model.clone(),
            email_max_tokens: config.email_max_tokens,
            sms_max_tokens: config.sms_max_tokens,
        })
    }

    pub fn with_provider(provider: Arc<dyn CompletionProvider>, config: &OpenAiConfig) -> Self {
        Self {
            provider: Some(provider),
            model: config.model.clone(),
            email_max_tokens: config.email_max_tokens,
            sms_max_tokens: config.sms_max_tokens,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> AppResult<&Arc<dyn CompletionProvider>> {
        self.provider.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("AI content generation is not configured".to_string())
        })
    }

    fn validate_prompt(prompt: &str) -> AppResult<()> {
        if prompt.trim().is_empty() {
            return Err(AppError::Validation("Prompt cannot be empty".to_string()));
        }
        Ok(())
    }

    pub async fn generate_email(&self, prompt: &str) -> AppResult<GeneratedEmail> {
        Self::validate_prompt(prompt)?;
        let provider = self.provider()?;

        tracing::debug!("Generating email content ({} chars of prompt)", prompt.len());
        let raw = provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                system: EMAIL_SYSTEM_PROMPT.to_string(),
                prompt: prompt.to_string(),
                max_tokens: self.email_max_tokens,
                json_output: true,
            })
            .await?;

        parse_email_completion(&raw).map_err(|e| {
            tracing::warn!("Unusable email completion: {}", e);
            e
        })
    }

    /// The ~160 character limit is only an instruction to the model.
    pub async fn generate_sms(&self, prompt: &str) -> AppResult<String> {
        Self::validate_prompt(prompt)?;
        let provider = self.provider()?;

        tracing::debug!("Generating SMS content ({} chars of prompt)", prompt.len());
        let raw = provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                system: SMS_SYSTEM_PROMPT.to_string(),
                prompt: prompt.to_string(),
                max_tokens: self.sms_max_tokens,
                json_output: false,
            })
            .await?;

        Ok(raw.trim().to_string())
    }
}
