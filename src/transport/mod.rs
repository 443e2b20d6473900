//! Remote model transports.
//!
//! A [`Transport`] has a single capability: submit a prompt, get text back.
//! Prompt construction and reply parsing live in [`crate::verify`] and never
//! see which backend answered.

use anyhow::{Context, Result};
use std::future::Future;

mod anthropic;
mod bedrock;
pub mod credentials;
mod messages;
pub mod sigv4;
mod sts;

pub use anthropic::{AnthropicTransport, DEFAULT_ANTHROPIC_ENDPOINT, DEFAULT_ANTHROPIC_MODEL};
pub use bedrock::{
    BedrockTransport, DEFAULT_BEDROCK_MODEL, DEFAULT_BEDROCK_REGION, DEFAULT_READ_TIMEOUT_SECS,
};
pub use credentials::{AwsCredentials, AwsSettings, BedrockAuth};
pub use messages::MAX_TOKENS;

use crate::config::{Backend, ResolvedConfig};

/// Submits a prompt to a remote model and returns the generated text.
pub trait Transport {
    /// Human-readable backend name, e.g. `Anthropic API`.
    fn label(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>>;
}

/// The transport chosen at startup.
pub enum RemoteTransport {
    Anthropic(AnthropicTransport),
    Bedrock(BedrockTransport),
}

impl RemoteTransport {
    /// Builds the transport selected by the resolved configuration.
    ///
    /// Bedrock credentials are resolved here, which may run a
    /// `credential_process` or call STS.
    pub async fn from_config(config: &ResolvedConfig) -> Result<Self> {
        match config.backend {
            Backend::Anthropic => {
                let api_key = config
                    .api_key
                    .clone()
                    .context("Anthropic API requires an API key")?;
                Ok(Self::Anthropic(AnthropicTransport::new(
                    config.anthropic_endpoint.clone(),
                    api_key,
                    config.model.clone(),
                    config.read_timeout,
                )?))
            }
            Backend::Bedrock => Ok(Self::Bedrock(BedrockTransport::new(
                config.region.clone(),
                credentials::resolve_auth(&config.aws).await?,
                config.model.clone(),
                config.read_timeout,
            )?)),
        }
    }
}

impl Transport for RemoteTransport {
    fn label(&self) -> &str {
        match self {
            Self::Anthropic(t) => t.label(),
            Self::Bedrock(t) => t.label(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Anthropic(t) => t.model(),
            Self::Bedrock(t) => t.model(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            Self::Anthropic(t) => t.complete(prompt).await,
            Self::Bedrock(t) => t.complete(prompt).await,
        }
    }
}
