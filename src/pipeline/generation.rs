use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AzureOpenAiConfig;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("cannot reach generation service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("generation service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    #[error("generation service returned no completion")]
    EmptyCompletion,
}

/// Text-completion collaborator used for abstractive section summaries.
pub trait TextGenerator {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError>;
}

/// Azure OpenAI chat-completions client.
pub struct AzureChatGenerator {
    config: AzureOpenAiConfig,
    client: reqwest::blocking::Client,
}

impl AzureChatGenerator {
    pub fn new(config: AzureOpenAiConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
struct ContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

fn text_message<'a>(role: &'a str, text: &'a str) -> ChatMessage<'a> {
    ChatMessage {
        role,
        content: vec![ContentBlock { kind: "text", text }],
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl TextGenerator for AzureChatGenerator {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let url = self.config.operation_url("chat/completions");
        let body = ChatRequest {
            messages: vec![
                text_message("system", system_prompt),
                text_message("user", user_prompt),
            ],
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.config.endpoint.clone())
                } else if e.is_timeout() {
                    GenerationError::HttpClient(format!(
                        "request timed out after {REQUEST_TIMEOUT_SECS}s"
                    ))
                } else {
                    GenerationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(GenerationError::EmptyCompletion)
    }
}

/// Deterministic generator for tests: echoes a configured response.
pub struct FixedGenerator {
    response: String,
}

impl FixedGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl TextGenerator for FixedGenerator {
    fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

/// Generator that always fails, for exercising fallback paths.
pub struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, GenerationError> {
        Err(GenerationError::Connection("https://example.invalid".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_generator_returns_configured_response() {
        let generator = FixedGenerator::new("a plain-language summary");
        let result = generator.complete("system", "user", 256).unwrap();
        assert_eq!(result, "a plain-language summary");
    }

    #[test]
    fn failing_generator_always_errors() {
        let result = FailingGenerator.complete("system", "user", 256);
        assert!(matches!(result, Err(GenerationError::Connection(_))));
    }

    #[test]
    fn chat_request_payload_shape() {
        let body = ChatRequest {
            messages: vec![text_message("system", "sys"), text_message("user", "usr")],
            max_tokens: 64,
        };
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["max_tokens"], 64);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"][0]["type"], "text");
        assert_eq!(value["messages"][1]["content"][0]["text"], "usr");
    }
}
