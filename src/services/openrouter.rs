use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::MenuError;
use crate::models::MenuImage;
use crate::services::ai_service::{VisionAnalysisClient, VisionPrompt};

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageBody,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageBody {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    user: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenRouterService {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenRouterService {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
            timeout,
            client,
        })
    }

    fn build_request(&self, image: &MenuImage, prompt: &VisionPrompt<'_>, session_id: &str) -> ChatRequest {
        let base64_image = general_purpose::STANDARD.encode(&image.bytes);
        let data_url = format!("data:{};base64,{}", image.mime_type, base64_image);
        log::debug!(
            "🖼️ Image data URL created: {}... (first 100 chars)",
            data_url.chars().take(100).collect::<String>()
        );

        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: MessageBody::Text(prompt.system.to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: MessageBody::Parts(vec![
                    ContentPart::Text {
                        content_type: "text".to_string(),
                        text: prompt.user.to_string(),
                    },
                    ContentPart::ImageUrl {
                        content_type: "image_url".to_string(),
                        image_url: ImageData { url: data_url },
                    },
                ]),
            },
        ];

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            user: session_id.to_string(),
        }
    }

    fn classify(&self, err: reqwest::Error) -> MenuError {
        if err.is_timeout() {
            MenuError::UpstreamTimeout(self.timeout)
        } else {
            MenuError::UpstreamUnavailable(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl VisionAnalysisClient for OpenRouterService {
    async fn analyze(&self, image: &MenuImage, prompt: &VisionPrompt<'_>) -> Result<String, MenuError> {
        // Fresh session per call; nothing carries over between analyses.
        let session_id = format!("menu-analysis-{}", Uuid::new_v4());
        log::debug!("📊 Image size: {} bytes ({})", image.bytes.len(), image.mime_type);

        let request = self.build_request(image, prompt, &session_id);

        log::info!("🤖 Sending request to OpenRouter with model: {} (session {})", self.model, session_id);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "Menu Drink Selector")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        log::debug!("📥 OpenRouter response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ OpenRouter API error response: {}", error_text);
            return Err(MenuError::UpstreamUnavailable(format!(
                "OpenRouter API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await.map_err(|e| self.classify(e))?;
        log::debug!("📄 Raw OpenRouter response size: {} bytes", response_text.len());

        parse_chat_response(&response_text)
    }
}

fn parse_chat_response(body: &str) -> Result<String, MenuError> {
    let chat_response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| MenuError::UpstreamUnavailable(format!("unreadable OpenRouter response: {}", e)))?;

    chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| MenuError::UpstreamUnavailable("OpenRouter returned no choices".to_string()))
}
