use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::Transport;
use super::messages::{MAX_TOKENS, Message, read_response};

pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-opus-4-5-20251101";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

/// Calls the hosted Anthropic Messages API.
pub struct AnthropicTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AnthropicTransport {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = read_timeout {
            builder = builder.read_timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            endpoint,
            api_key,
            model,
        })
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
    }
}

impl Transport for AnthropicTransport {
    fn label(&self) -> &str {
        "Anthropic API"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.messages_url();
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message::user(prompt)],
        };
        debug!(%url, model = %self.model, prompt_len = prompt.len(), "Sending request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to connect to API endpoint: {url}"))?;

        read_response(response, &url).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn transport(endpoint: &str) -> AnthropicTransport {
        AnthropicTransport::new(
            endpoint.to_string(),
            "test-key".to_string(),
            DEFAULT_ANTHROPIC_MODEL.to_string(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            transport("https://api.anthropic.com").messages_url(),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            transport("http://localhost:8080/").messages_url(),
            "http://localhost:8080/v1/messages"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = MessagesRequest {
            model: "m",
            max_tokens: MAX_TOKENS,
            messages: vec![Message::user("hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "m",
                "max_tokens": 8192,
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn test_label_and_model() {
        let t = transport(DEFAULT_ANTHROPIC_ENDPOINT);
        assert_eq!(t.label(), "Anthropic API");
        assert_eq!(t.model(), DEFAULT_ANTHROPIC_MODEL);
    }
}
