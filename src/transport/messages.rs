//! Wire types shared by both transports.
//!
//! The Anthropic API and the Bedrock runtime accept the same Messages
//! request shape (apart from the model/version fields) and return the same
//! response body.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Output token ceiling for every request.
pub const MAX_TOKENS: u32 = 8192;

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> Message<'a> {
    pub const fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Returns the first text block of the reply.
    pub fn into_text(self) -> Result<String> {
        if self.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Model stopped at the {MAX_TOKENS} token limit; reply is likely truncated");
        }

        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .context("Response contained no text content")
    }
}

/// Checks the status of a Messages response and extracts its text.
pub async fn read_response(response: reqwest::Response, url: &str) -> Result<String> {
    let status = response.status();
    debug!(%status, url, "Received response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("API request failed with status {status}: {body}");
    }

    let body: MessagesResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to decode response body from {url}"))?;

    body.into_text()
}
