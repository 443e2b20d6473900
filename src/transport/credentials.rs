//! AWS credential resolution for the Bedrock transport.
//!
//! Lookup order: Bedrock API key (bearer token), static keys from the
//! environment, then the named profile from the shared credentials and config
//! files. A profile yields static keys, runs its `credential_process`, or
//! assumes its `role_arn` on top of a `source_profile`.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::sts::{self, RoleRequest};

/// Static or temporary AWS access keys.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"(redacted)")
            .field("session_token", &self.session_token.as_ref().map(|_| "(redacted)"))
            .finish()
    }
}

/// How Bedrock requests are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum BedrockAuth {
    /// Bedrock API key sent as `Authorization: Bearer`.
    Bearer(String),
    /// AWS Signature Version 4.
    SigV4(AwsCredentials),
}

impl fmt::Debug for BedrockAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer((redacted))"),
            Self::SigV4(credentials) => f.debug_tuple("SigV4").field(credentials).finish(),
        }
    }
}

/// AWS settings gathered from the environment and config file.
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub profile: String,
    /// Region used to sign STS calls.
    pub region: String,
    /// Replaces the regional STS endpoint (`AWS_ENDPOINT_URL_STS`).
    pub sts_endpoint: Option<String>,
    pub bearer_token: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub credentials_file: PathBuf,
    pub config_file: PathBuf,
}

type Profile = HashMap<String, String>;

/// Where the first credentials of a profile chain come from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    Static(AwsCredentials),
    Process(String),
}

/// A profile chain: base credentials plus the roles to assume, outermost first.
#[derive(Debug, PartialEq, Eq)]
struct Chain {
    source: Source,
    roles: Vec<RoleRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProcessOutput {
    version: u32,
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

/// Picks the authentication method for Bedrock requests.
pub async fn resolve_auth(settings: &AwsSettings) -> Result<BedrockAuth> {
    if let Some(token) = &settings.bearer_token {
        debug!("Using Bedrock API key from environment");
        return Ok(BedrockAuth::Bearer(token.clone()));
    }

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&settings.access_key_id, &settings.secret_access_key)
    {
        debug!("Using AWS access keys from environment");
        return Ok(BedrockAuth::SigV4(AwsCredentials {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            session_token: settings.session_token.clone(),
        }));
    }

    let profiles = load_profiles(settings)?;
    let chain = profile_chain(&profiles, settings)?;

    let mut credentials = match chain.source {
        Source::Static(credentials) => credentials,
        Source::Process(command) => run_credential_process(&command).await?,
    };

    if !chain.roles.is_empty() {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let endpoint = sts::endpoint(&settings.region, settings.sts_endpoint.as_deref());
        for role in chain.roles.iter().rev() {
            credentials =
                sts::assume_role(&client, &endpoint, &settings.region, &credentials, role).await?;
        }
    }

    Ok(BedrockAuth::SigV4(credentials))
}

/// Merges the profiles of both shared files by name.
///
/// The config file names profiles `[profile NAME]` (except `[default]`); the
/// credentials file uses bare `[NAME]` and wins on conflicting keys.
fn load_profiles(settings: &AwsSettings) -> Result<HashMap<String, Profile>> {
    let mut profiles: HashMap<String, Profile> = HashMap::new();

    for (section, values) in read_ini(&settings.config_file)? {
        let name = match section.strip_prefix("profile ") {
            Some(name) => name.trim().to_string(),
            None if section == "default" => section,
            None => continue,
        };
        profiles.entry(name).or_default().extend(values);
    }

    for (section, values) in read_ini(&settings.credentials_file)? {
        profiles.entry(section).or_default().extend(values);
    }

    Ok(profiles)
}

/// Follows `source_profile` links from the selected profile.
fn profile_chain(profiles: &HashMap<String, Profile>, settings: &AwsSettings) -> Result<Chain> {
    let mut name = settings.profile.clone();
    let mut visited = HashSet::new();
    let mut roles = Vec::new();

    loop {
        let top = roles.is_empty();
        let Some(profile) = profiles.get(&name) else {
            if top {
                bail!(missing_credentials(settings));
            }
            bail!("Source profile '{name}' not found in the AWS shared files");
        };
        let revisit = !visited.insert(name.clone());

        // A role profile assumes its role even when it also carries keys;
        // as a source, keys end the chain.
        if (!top || !profile.contains_key("role_arn"))
            && let Some(credentials) = static_keys(profile)
        {
            debug!(profile = %name, "Using keys from AWS shared files");
            return Ok(Chain {
                source: Source::Static(credentials),
                roles,
            });
        }

        if revisit {
            bail!("Profile '{name}' is part of a source_profile loop");
        }

        if let Some(role_arn) = profile.get("role_arn") {
            roles.push(RoleRequest {
                role_arn: role_arn.clone(),
                session_name: profile.get("role_session_name").cloned(),
                external_id: profile.get("external_id").cloned(),
                duration_seconds: profile
                    .get("duration_seconds")
                    .map(|value| {
                        value.parse().with_context(|| {
                            format!("Invalid duration_seconds in profile '{name}': {value}")
                        })
                    })
                    .transpose()?,
            });

            if let Some(source) = profile.get("source_profile") {
                debug!(profile = %name, source = %source, role_arn = %role_arn, "Following source_profile");
                name = source.clone();
                continue;
            }
            if let Some(source) = profile.get("credential_source") {
                bail!(
                    "Profile '{name}' uses credential_source = {source}, which is not supported; \
                     use source_profile instead"
                );
            }
            bail!("Profile '{name}' sets role_arn without source_profile");
        }

        if let Some(command) = profile.get("credential_process") {
            debug!(profile = %name, "Using credential_process");
            return Ok(Chain {
                source: Source::Process(command.clone()),
                roles,
            });
        }

        if profile.contains_key("sso_session") || profile.contains_key("sso_start_url") {
            bail!(
                "Profile '{name}' uses AWS IAM Identity Center (SSO), which is not supported; \
                 export temporary keys with `aws configure export-credentials --profile {name} \
                 --format env` instead"
            );
        }

        if top {
            bail!(missing_credentials(settings));
        }
        bail!("Source profile '{name}' has no credentials");
    }
}

fn missing_credentials(settings: &AwsSettings) -> String {
    let profile = &settings.profile;
    format!(
        "No AWS credentials found for profile '{profile}'\n\n\
         Provide them via one of:\n  \
         - AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY environment variables\n  \
         - AWS_BEARER_TOKEN_BEDROCK environment variable\n  \
         - [{profile}] section in {}",
        settings.credentials_file.display()
    )
}

fn static_keys(profile: &Profile) -> Option<AwsCredentials> {
    match (
        profile.get("aws_access_key_id"),
        profile.get("aws_secret_access_key"),
    ) {
        (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            session_token: profile.get("aws_session_token").cloned(),
        }),
        _ => None,
    }
}

/// Runs a `credential_process` command and reads the keys it prints.
async fn run_credential_process(command: &str) -> Result<AwsCredentials> {
    let mut process = if cfg!(windows) {
        let mut process = Command::new("cmd");
        process.args(["/C", command]);
        process
    } else {
        let mut process = Command::new("sh");
        process.args(["-c", command]);
        process
    };

    let output = process
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to run credential_process: {command}"))?;
    if !output.status.success() {
        bail!(
            "credential_process failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let parsed: ProcessOutput = serde_json::from_slice(&output.stdout)
        .context("Failed to parse credential_process output")?;
    if parsed.version != 1 {
        bail!(
            "Unsupported credential_process output version: {}",
            parsed.version
        );
    }

    Ok(AwsCredentials {
        access_key_id: parsed.access_key_id,
        secret_access_key: parsed.secret_access_key,
        session_token: parsed.session_token,
    })
}

/// Reads an AWS INI file. A missing file has no sections.
fn read_ini(path: &Path) -> Result<HashMap<String, HashMap<String, String>>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read AWS file: {}", path.display()))?;
    Ok(parse_ini(&text))
}

/// Parses the INI dialect of `~/.aws/credentials` and `~/.aws/config`.
pub fn parse_ini(text: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        if let (Some(section), Some((key, value))) = (&current, line.split_once('='))
            && let Some(values) = sections.get_mut(section)
        {
            values.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    sections
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use tempfile::TempDir;

    fn settings(temp_dir: &TempDir, profile: &str) -> AwsSettings {
        AwsSettings {
            profile: profile.to_string(),
            region: "us-east-1".to_string(),
            credentials_file: temp_dir.path().join("credentials"),
            config_file: temp_dir.path().join("config"),
            ..AwsSettings::default()
        }
    }

    fn sigv4(auth: BedrockAuth) -> AwsCredentials {
        let BedrockAuth::SigV4(credentials) = auth else {
            panic!("expected SigV4 credentials");
        };
        credentials
    }

    /// Stand-in STS endpoint: answers each connection with one of `bodies`
    /// and returns the raw requests it received.
    fn serve_sts(bodies: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for body in bodies {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);

                let mut head = String::new();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line.trim_end().is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':')
                        && name.eq_ignore_ascii_case("content-length")
                    {
                        content_length = value.trim().parse().unwrap();
                    }
                    head.push_str(&line);
                }

                let mut request_body = vec![0; content_length];
                reader.read_exact(&mut request_body).unwrap();
                requests.push(format!("{head}\n{}", String::from_utf8(request_body).unwrap()));

                let mut stream = reader.into_inner();
                write!(
                    stream,
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }
            requests
        });

        (url, handle)
    }

    fn assume_role_response(access_key_id: &str) -> String {
        serde_json::json!({
            "AssumeRoleResponse": {
                "AssumeRoleResult": {
                    "Credentials": {
                        "AccessKeyId": access_key_id,
                        "SecretAccessKey": "role-secret",
                        "SessionToken": "role-token",
                        "Expiration": 1.7608e9
                    }
                },
                "ResponseMetadata": {"RequestId": "req-1"}
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_ini_sections_and_comments() {
        let sections = parse_ini(
            "# comment\n[default]\naws_access_key_id = AKID\n; other\n[profile dev]\nregion=us-east-1\nAWS_Secret_Access_Key = s=e=c\n",
        );

        assert_eq!(sections["default"]["aws_access_key_id"], "AKID");
        assert_eq!(sections["profile dev"]["region"], "us-east-1");
        assert_eq!(sections["profile dev"]["aws_secret_access_key"], "s=e=c");
    }

    #[tokio::test]
    async fn test_bearer_token_wins() {
        let temp_dir = TempDir::new().unwrap();
        let mut s = settings(&temp_dir, "default");
        s.bearer_token = Some("bedrock-key".to_string());
        s.access_key_id = Some("AKID".to_string());
        s.secret_access_key = Some("secret".to_string());

        assert_eq!(
            resolve_auth(&s).await.unwrap(),
            BedrockAuth::Bearer("bedrock-key".to_string())
        );
    }

    #[tokio::test]
    async fn test_environment_keys_before_profile() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("credentials"),
            "[default]\naws_access_key_id = FILE\naws_secret_access_key = file\n",
        )
        .unwrap();

        let mut s = settings(&temp_dir, "default");
        s.access_key_id = Some("ENV".to_string());
        s.secret_access_key = Some("env".to_string());
        s.session_token = Some("token".to_string());

        let credentials = sigv4(resolve_auth(&s).await.unwrap());
        assert_eq!(credentials.access_key_id, "ENV");
        assert_eq!(credentials.session_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_named_profile_from_credentials_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("credentials"),
            "[default]\naws_access_key_id = D\naws_secret_access_key = d\n\n\
             [livetoon]\naws_access_key_id = L\naws_secret_access_key = l\naws_session_token = t\n",
        )
        .unwrap();

        let credentials = sigv4(resolve_auth(&settings(&temp_dir, "livetoon")).await.unwrap());
        assert_eq!(credentials.access_key_id, "L");
        assert_eq!(credentials.secret_access_key, "l");
        assert_eq!(credentials.session_token.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_profile_from_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile dev]\nregion = us-west-2\naws_access_key_id = C\naws_secret_access_key = c\n",
        )
        .unwrap();

        let credentials = sigv4(resolve_auth(&settings(&temp_dir, "dev")).await.unwrap());
        assert_eq!(credentials.access_key_id, "C");
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let err = resolve_auth(&settings(&temp_dir, "nowhere")).await.unwrap_err();
        assert!(err.to_string().contains("No AWS credentials found for profile 'nowhere'"));
    }

    #[tokio::test]
    async fn test_role_profile_assumes_role_with_source_keys() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("credentials"),
            "[base]\naws_access_key_id = BASEKEY\naws_secret_access_key = base-secret\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile bedrock]\nrole_arn = arn:aws:iam::123456789012:role/bedrock\n\
             source_profile = base\nrole_session_name = checker\n",
        )
        .unwrap();
        let (url, server) = serve_sts(vec![assume_role_response("ASIAROLE")]);

        let mut s = settings(&temp_dir, "bedrock");
        s.sts_endpoint = Some(url);
        let credentials = sigv4(resolve_auth(&s).await.unwrap());

        assert_eq!(credentials.access_key_id, "ASIAROLE");
        assert_eq!(credentials.secret_access_key, "role-secret");
        assert_eq!(credentials.session_token.as_deref(), Some("role-token"));

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.contains("accept: application/json"));
        assert!(request.contains("Credential=BASEKEY/"));
        assert!(request.contains("/us-east-1/sts/aws4_request"));
        assert!(request.contains("Action=AssumeRole&Version=2011-06-15"));
        assert!(request.contains("RoleArn=arn%3Aaws%3Aiam%3A%3A123456789012%3Arole%2Fbedrock"));
        assert!(request.contains("RoleSessionName=checker"));
    }

    #[tokio::test]
    async fn test_role_chain_assumes_innermost_role_first() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[default]\naws_access_key_id = ROOT\naws_secret_access_key = root\n\
             [profile hop]\nrole_arn = arn:aws:iam::1:role/hop\nsource_profile = default\n\
             [profile target]\nrole_arn = arn:aws:iam::2:role/target\nsource_profile = hop\n",
        )
        .unwrap();
        let (url, server) = serve_sts(vec![
            assume_role_response("ASIAHOP"),
            assume_role_response("ASIATARGET"),
        ]);

        let mut s = settings(&temp_dir, "target");
        s.sts_endpoint = Some(url);
        let credentials = sigv4(resolve_auth(&s).await.unwrap());
        assert_eq!(credentials.access_key_id, "ASIATARGET");

        let requests = server.join().unwrap();
        assert!(requests[0].contains("Credential=ROOT/"));
        assert!(requests[0].contains("role%2Fhop"));
        assert!(requests[1].contains("Credential=ASIAHOP/"));
        assert!(requests[1].contains("role%2Ftarget"));
    }

    #[test]
    fn test_role_profile_with_own_keys_as_source() {
        let profiles = HashMap::from([(
            "self".to_string(),
            Profile::from([
                ("role_arn".to_string(), "arn:aws:iam::1:role/self".to_string()),
                ("source_profile".to_string(), "self".to_string()),
                ("aws_access_key_id".to_string(), "OWN".to_string()),
                ("aws_secret_access_key".to_string(), "own".to_string()),
            ]),
        )]);
        let temp_dir = TempDir::new().unwrap();

        let chain = profile_chain(&profiles, &settings(&temp_dir, "self")).unwrap();
        assert_eq!(chain.roles.len(), 1);
        assert!(matches!(
            chain.source,
            Source::Static(ref credentials) if credentials.access_key_id == "OWN"
        ));
    }

    #[tokio::test]
    async fn test_source_profile_loop_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile a]\nrole_arn = arn:aws:iam::1:role/a\nsource_profile = b\n\
             [profile b]\nrole_arn = arn:aws:iam::1:role/b\nsource_profile = a\n",
        )
        .unwrap();

        let err = resolve_auth(&settings(&temp_dir, "a")).await.unwrap_err();
        assert!(err.to_string().contains("source_profile loop"));
    }

    #[tokio::test]
    async fn test_missing_source_profile() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile a]\nrole_arn = arn:aws:iam::1:role/a\nsource_profile = gone\n",
        )
        .unwrap();

        let err = resolve_auth(&settings(&temp_dir, "a")).await.unwrap_err();
        assert!(err.to_string().contains("Source profile 'gone' not found"));
    }

    #[tokio::test]
    async fn test_sso_profile_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile sso]\nsso_session = corp\nsso_account_id = 1\nsso_role_name = dev\n",
        )
        .unwrap();

        let err = resolve_auth(&settings(&temp_dir, "sso")).await.unwrap_err();
        assert!(err.to_string().contains("(SSO), which is not supported"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_credential_process_profile() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile proc]\ncredential_process = printf '%s' '{\"Version\": 1, \"AccessKeyId\": \"PROC\", \"SecretAccessKey\": \"proc-secret\", \"SessionToken\": \"proc-token\"}'\n",
        )
        .unwrap();

        let credentials = sigv4(resolve_auth(&settings(&temp_dir, "proc")).await.unwrap());
        assert_eq!(credentials.access_key_id, "PROC");
        assert_eq!(credentials.secret_access_key, "proc-secret");
        assert_eq!(credentials.session_token.as_deref(), Some("proc-token"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_credential_process() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config"),
            "[profile proc]\ncredential_process = sh -c 'echo denied >&2; exit 3'\n",
        )
        .unwrap();

        let err = resolve_auth(&settings(&temp_dir, "proc")).await.unwrap_err();
        assert!(err.to_string().contains("credential_process failed"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = BedrockAuth::SigV4(AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "super-secret".to_string(),
            session_token: Some("token-value".to_string()),
        });
        let debug = format!("{auth:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("token-value"));
        assert!(!format!("{:?}", BedrockAuth::Bearer("abc".to_string())).contains("abc"));
    }
}
