use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use medbuddy_core::{VisionProvider, VisionRequest, VisionResponse};

/// A mock vision provider that returns canned replies.
///
/// Scripted replies are consumed in order; once exhausted, the fixed reply
/// (if any) is returned for every call.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<VisionRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Queue a successful reply.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queue a transport failure.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    fn push(&self, item: Result<String, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<VisionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VisionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &VisionRequest) -> Result<VisionResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(req.clone());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let content = match scripted {
            Some(Ok(reply)) => reply,
            Some(Err(message)) => anyhow::bail!("{}: {}", self.name, message),
            None => self
                .fixed_response
                .clone()
                .unwrap_or_else(|| "Mock response".to_string()),
        };

        Ok(VisionResponse {
            content,
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> VisionRequest {
        VisionRequest {
            model: "mock".into(),
            system_prompt: String::new(),
            user_prompt: String::new(),
            image_data_uri: String::new(),
            max_tokens: 1,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn script_then_fixed() {
        let p = MockProvider::new("mock")
            .with_response("fixed")
            .then_reply("first")
            .then_fail("boom");

        assert_eq!(p.complete(&req()).await.unwrap().content, "first");
        assert!(p.complete(&req()).await.is_err());
        assert_eq!(p.complete(&req()).await.unwrap().content, "fixed");
        assert_eq!(p.calls().len(), 3);
    }
}
