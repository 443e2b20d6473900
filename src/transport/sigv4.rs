//! AWS Signature Version 4 request signing.
//!
//! Covers what the Bedrock runtime needs: a single request with a body, no
//! query string, and headers `content-type`, `host`, `x-amz-date` and
//! (for temporary credentials) `x-amz-security-token`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt::Write;

use super::credentials::AwsCredentials;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The parts of an HTTP request covered by the signature.
#[derive(Debug, Clone)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    /// Request path exactly as sent (already percent-encoded).
    pub path: &'a str,
    pub host: &'a str,
    pub content_type: &'a str,
    pub payload: &'a [u8],
}

/// Where and when the signature applies.
#[derive(Debug, Clone)]
pub struct SigningScope<'a> {
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// Signs a request and returns the headers to attach to it.
pub fn sign(
    request: &SigningRequest<'_>,
    credentials: &AwsCredentials,
    scope: &SigningScope<'_>,
) -> Vec<(&'static str, String)> {
    let amz_date = scope.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = scope.time.format("%Y%m%d").to_string();

    let mut headers = vec![
        ("content-type", request.content_type.to_string()),
        ("host", request.host.to_string()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }

    let (canonical, signed_headers) = canonical_request(request, &headers);
    let credential_scope = format!(
        "{date_stamp}/{}/{}/aws4_request",
        scope.region, scope.service
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical.as_bytes())
    );

    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &date_stamp,
        scope.region,
        scope.service,
    );
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let mut signed = vec![
        ("x-amz-date", amz_date),
        (
            "authorization",
            format!(
                "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
                credentials.access_key_id
            ),
        ),
    ];
    if let Some(token) = &credentials.session_token {
        signed.push(("x-amz-security-token", token.clone()));
    }
    signed
}

/// Builds the canonical request string and the signed-headers list.
///
/// `headers` must have lower-case names and be sorted by name.
pub fn canonical_request(
    request: &SigningRequest<'_>,
    headers: &[(&str, String)],
) -> (String, String) {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical = format!(
        "{}\n{}\n\n{canonical_headers}\n{signed_headers}\n{}",
        request.method,
        canonical_uri(request.path),
        sha256_hex(request.payload)
    );
    (canonical, signed_headers)
}

/// Encodes each path segment again, as required for every service but S3.
pub fn canonical_uri(path: &str) -> String {
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn uri_encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

pub fn derive_signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[allow(clippy::expect_used)]
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // expect is safe: HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
