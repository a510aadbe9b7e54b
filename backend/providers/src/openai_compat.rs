use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use medbuddy_core::{VisionProvider, VisionRequest, VisionResponse};

pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Any `/chat/completions` endpoint speaking the OpenAI wire format with
/// `image_url` content parts (Together, OpenRouter, OpenAI).
pub struct OpenAiCompatProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(name: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn together(api_key: impl Into<String>) -> Self {
        Self::new("together", api_key, TOGETHER_BASE_URL)
    }

    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", api_key, OPENROUTER_BASE_URL)
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", api_key, OPENAI_BASE_URL)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_body(request: &VisionRequest) -> ChatRequest<'_> {
    let mut messages = Vec::with_capacity(2);
    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: MessageContent::Text(&request.system_prompt),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: MessageContent::Parts(vec![
            ContentPart::Text { text: &request.user_prompt },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: &request.image_data_uri },
            },
        ]),
    });

    ChatRequest {
        model: &request.model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

#[async_trait]
impl VisionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        let body = build_body(request);

        debug!(provider = %self.name, model = %request.model, "Sending vision request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} HTTP request failed", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", self.name, status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", self.name))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Response contained no message content")?;

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(VisionResponse {
            content,
            provider: self.name.clone(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VisionRequest {
        VisionRequest {
            model: "meta-llama/Llama-Vision-Free".into(),
            system_prompt: "system".into(),
            user_prompt: "Extract medication schedule from this image".into(),
            image_data_uri: "data:image/png;base64,AAAA".into(),
            max_tokens: 500,
            temperature: 0.1,
        }
    }

    #[test]
    fn body_carries_system_text_and_image_parts() {
        let req = request();
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system");
        assert_eq!(body["messages"][1]["content"][0]["type"], "text");
        assert_eq!(body["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
        assert_eq!(body["max_tokens"], 500);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let p = OpenAiCompatProvider::together("k").with_base_url("http://localhost:8000/v1/");
        assert_eq!(p.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn parses_reply_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}],"usage":{"total_tokens":42}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(parsed.usage.unwrap().total_tokens, Some(42));
    }
}
