use tracing::debug;

use crate::config::InferenceConfig;
use crate::inference::error::InferenceError;
use crate::inference::wire::{ChatRequest, ChatResponse, ContentPart, ImageUrl, Message};
use crate::prompts::Sampling;

/// A base64-encoded image and its media type, as received from the UI.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: String,
    pub media_type: String,
}

impl ImageData {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// One synchronous request per user action against a fixed chat-completions
/// endpoint. No retries, no fallback model, no timeout override: a failure is
/// reported once and the action ends.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    text_model: String,
    vision_model: String,
}

impl InferenceClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        text_model: impl Into<String>,
        vision_model: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into();
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            text_model: text_model.into(),
            vision_model: vision_model.into(),
        }
    }

    /// Resolve the bearer credential from the configured environment variable.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| InferenceError::MissingCredential(config.api_key_env.clone()))?;
        Ok(Self::new(
            config.api_base.clone(),
            api_key,
            config.text_model.clone(),
            config.vision_model.clone(),
        ))
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    /// Text-only prompt against the text model. Recipe generations chained
    /// after a vision probe also land here: only requests that carry image
    /// data use the vision model.
    pub async fn complete_text(
        &self,
        prompt: &str,
        sampling: Sampling,
    ) -> Result<Option<String>, InferenceError> {
        let request = ChatRequest {
            model: self.text_model.clone(),
            messages: vec![Message::user_text(prompt)],
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };
        self.dispatch(&request).await
    }

    /// Prompt plus embedded image against the vision model. The image rides
    /// in the message as a base64 data URL part.
    pub async fn describe_image(
        &self,
        prompt: &str,
        image: &ImageData,
        sampling: Sampling,
    ) -> Result<Option<String>, InferenceError> {
        let request = ChatRequest {
            model: self.vision_model.clone(),
            messages: vec![Message::user_parts(vec![
                ContentPart::Text {
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_data_url(),
                    },
                },
            ])],
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };
        self.dispatch(&request).await
    }

    async fn dispatch(&self, request: &ChatRequest) -> Result<Option<String>, InferenceError> {
        debug!(model = %request.model, "Dispatching chat completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InferenceError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_content())
    }
}
