//! Chat-completion backends used as the categorization fallback.
//!
//! The categorizer only needs free-text completions; prompt construction and
//! answer reconciliation live in [`crate::categorize`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("AI response contained no choices")]
    EmptyResponse,
    #[error("AI backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AiCategorizer: Send + Sync {
    /// Send one prompt and return the model's text answer.
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

// ── OpenAI-compatible backend ─────────────────────────────────────────────────

/// Any server implementing `/v1/chat/completions` (OpenAI, vLLM, llama-server, …).
#[derive(Clone)]
pub struct OpenAiCompatibleCategorizer {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleCategorizer {
    /// The timeout bounds the whole request; expiry surfaces as [`AiError::Http`].
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl AiCategorizer for OpenAiCompatibleCategorizer {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.1,
            stream: false,
        };

        let mut req_builder = self.http_client.post(self.endpoint()).json(&request);
        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let chat: ChatCompletionResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AiError::EmptyResponse)
    }
}

// ── Mock backend (tests, offline runs) ────────────────────────────────────────

/// Replays scripted answers in order and records every prompt it was sent.
/// Once the script runs out, every call fails.
#[derive(Default)]
pub struct MockCategorizer {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockCategorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for a in answers {
            mock.push_answer(a);
        }
        mock
    }

    pub fn push_answer(&self, answer: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(answer.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(message.into()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AiCategorizer for MockCategorizer {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(AiError::Backend(message)),
            None => Err(AiError::Backend("mock script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_as_chat_completion() {
        let request = ChatCompletionRequest {
            model: "m",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            temperature: 0.1,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn response_deserializes_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Car"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Car");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let ai = OpenAiCompatibleCategorizer::new("http://localhost:8080/", "m", None, DEFAULT_AI_TIMEOUT)
            .unwrap();
        assert_eq!(ai.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(ai.model(), "m");
    }

    #[tokio::test]
    async fn mock_replays_script_then_fails() {
        let mock = MockCategorizer::answering(["Car"]);
        mock.push_failure("boom");
        assert_eq!(mock.complete("p1").await.unwrap(), "Car");
        assert!(matches!(mock.complete("p2").await, Err(AiError::Backend(m)) if m == "boom"));
        assert!(mock.complete("p3").await.is_err());
        assert_eq!(mock.prompts(), vec!["p1", "p2", "p3"]);
    }
}
