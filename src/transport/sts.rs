//! STS `AssumeRole` for profiles that name a `role_arn`.
//!
//! The call uses the query protocol: a form-encoded POST signed with
//! SigV4. `Accept: application/json` asks STS for a JSON reply instead of
//! XML.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::credentials::AwsCredentials;
use super::sigv4::{self, SigningRequest, SigningScope};

const SERVICE: &str = "sts";
const API_VERSION: &str = "2011-06-15";
const FORM: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// One `role_arn` hop taken from a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequest {
    pub role_arn: String,
    pub session_name: Option<String>,
    pub external_id: Option<String>,
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleEnvelope {
    assume_role_response: AssumeRoleResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    assume_role_result: AssumeRoleResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResult {
    credentials: StsCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
}

/// Regional STS endpoint, unless `override_url` is given.
pub fn endpoint(region: &str, override_url: Option<&str>) -> String {
    override_url.map_or_else(
        || format!("https://sts.{region}.amazonaws.com"),
        |url| url.trim_end_matches('/').to_string(),
    )
}

/// Form body of an `AssumeRole` call.
pub fn request_body(role: &RoleRequest) -> String {
    let session_name = role
        .session_name
        .clone()
        .unwrap_or_else(|| format!("kanji-check-{}", Utc::now().timestamp()));

    let mut params = vec![
        ("Action", "AssumeRole".to_string()),
        ("Version", API_VERSION.to_string()),
        ("RoleArn", role.role_arn.clone()),
        ("RoleSessionName", session_name),
    ];
    if let Some(external_id) = &role.external_id {
        params.push(("ExternalId", external_id.clone()));
    }
    if let Some(duration) = role.duration_seconds {
        params.push(("DurationSeconds", duration.to_string()));
    }

    params
        .iter()
        .map(|(key, value)| format!("{key}={}", sigv4::uri_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Exchanges `source` credentials for temporary credentials of `role`.
pub async fn assume_role(
    client: &Client,
    endpoint: &str,
    region: &str,
    source: &AwsCredentials,
    role: &RoleRequest,
) -> Result<AwsCredentials> {
    let url = Url::parse(&format!("{endpoint}/"))
        .with_context(|| format!("Invalid STS endpoint: {endpoint}"))?;
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => bail!("Invalid STS endpoint: {endpoint}"),
    };
    let body = request_body(role);
    debug!(%url, role_arn = %role.role_arn, "Assuming role");

    let signing_request = SigningRequest {
        method: "POST",
        path: url.path(),
        host: &host,
        content_type: FORM,
        payload: body.as_bytes(),
    };
    let scope = SigningScope {
        region,
        service: SERVICE,
        time: Utc::now(),
    };

    let mut request = client
        .post(url.clone())
        .header(CONTENT_TYPE, FORM)
        .header(ACCEPT, "application/json");
    for (name, value) in sigv4::sign(&signing_request, source, &scope) {
        request = request.header(name, value);
    }

    let response = request
        .body(body)
        .send()
        .await
        .with_context(|| format!("Failed to connect to STS endpoint: {url}"))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .context("Failed to read STS response")?;
    if !status.is_success() {
        bail!(
            "AssumeRole for {} failed with status {status}: {text}",
            role.role_arn
        );
    }

    parse_response(&text)
}

fn parse_response(body: &str) -> Result<AwsCredentials> {
    let envelope: AssumeRoleEnvelope =
        serde_json::from_str(body).context("Failed to decode AssumeRole response")?;
    let credentials = envelope.assume_role_response.assume_role_result.credentials;

    Ok(AwsCredentials {
        access_key_id: credentials.access_key_id,
        secret_access_key: credentials.secret_access_key,
        session_token: Some(credentials.session_token),
    })
}
