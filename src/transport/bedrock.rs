use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::Transport;
use super::credentials::BedrockAuth;
use super::messages::{MAX_TOKENS, Message, read_response};
use super::sigv4::{self, SigningRequest, SigningScope};

pub const DEFAULT_BEDROCK_MODEL: &str = "anthropic.claude-opus-4-5-20251101-v1:0";
pub const DEFAULT_BEDROCK_REGION: &str = "us-west-2";
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;
pub const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

const SERVICE: &str = "bedrock";
const JSON: &str = "application/json";

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

/// Calls an Anthropic model through the AWS Bedrock runtime `InvokeModel` API.
pub struct BedrockTransport {
    client: Client,
    region: String,
    host: String,
    auth: BedrockAuth,
    model: String,
}

impl BedrockTransport {
    pub fn new(
        region: String,
        auth: BedrockAuth,
        model: String,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = read_timeout {
            builder = builder.read_timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            host: format!("bedrock-runtime.{region}.amazonaws.com"),
            region,
            auth,
            model,
        })
    }

    /// Percent-encoded request path for the model's `invoke` action.
    pub fn invoke_path(&self) -> String {
        format!("/model/{}/invoke", sigv4::uri_encode(&self.model))
    }

    pub fn invoke_url(&self) -> String {
        format!("https://{}{}", self.host, self.invoke_path())
    }
}

impl Transport for BedrockTransport {
    fn label(&self) -> &str {
        "AWS Bedrock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let path = self.invoke_path();
        let url = self.invoke_url();
        let body = serde_json::to_vec(&InvokeRequest {
            anthropic_version: BEDROCK_ANTHROPIC_VERSION,
            max_tokens: MAX_TOKENS,
            messages: vec![Message::user(prompt)],
        })
        .context("Failed to serialize request body")?;
        debug!(%url, region = %self.region, prompt_len = prompt.len(), "Sending request");

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON);

        match &self.auth {
            BedrockAuth::Bearer(token) => {
                request = request.bearer_auth(token);
            }
            BedrockAuth::SigV4(credentials) => {
                let signing_request = SigningRequest {
                    method: "POST",
                    path: &path,
                    host: &self.host,
                    content_type: JSON,
                    payload: &body,
                };
                let scope = SigningScope {
                    region: &self.region,
                    service: SERVICE,
                    time: Utc::now(),
                };
                for (name, value) in sigv4::sign(&signing_request, credentials, &scope) {
                    request = request.header(name, value);
                }
            }
        }

        let response = request
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to connect to Bedrock endpoint: {url}"))?;

        read_response(response, &url).await
    }
}
