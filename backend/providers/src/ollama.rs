use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use medbuddy_core::{VisionProvider, VisionRequest, VisionResponse};

/// Ollama local vision model provider (llava, llama3.2-vision, ...).
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct OllamaChatMessage<'a> {
    role: &'static str,
    content: &'a str,
    /// Raw base64 payloads, without the `data:` prefix.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<&'a str>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaReply,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaReply {
    content: String,
}

/// Organisation prefixes of hosted model ids that have no Ollama namespace.
const HOSTED_PREFIXES: &[&str] = &["meta-llama/", "openai/", "google/", "qwen/", "mistralai/", "anthropic/"];

/// Hosted ids lose their organisation prefix ("meta-llama/x" -> "x");
/// namespaced Ollama tags such as "user/llava-med" pass through.
fn local_model_name(model: &str) -> &str {
    HOSTED_PREFIXES
        .iter()
        .find_map(|prefix| model.strip_prefix(prefix))
        .unwrap_or(model)
}

#[async_trait]
impl VisionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();

        let (_, image_b64) = request
            .image_parts()
            .context("Image must be a base64 data URI")?;

        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(OllamaChatMessage {
                role: "system",
                content: &request.system_prompt,
                images: Vec::new(),
            });
        }
        messages.push(OllamaChatMessage {
            role: "user",
            content: &request.user_prompt,
            images: vec![image_b64],
        });

        let model = local_model_name(&request.model);
        let body = OllamaChatRequest {
            model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(model = %model, "Sending vision request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url.trim_end_matches('/')))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(VisionResponse {
            content: chat_response.message.content,
            provider: "ollama".to_string(),
            model: model.to_string(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
