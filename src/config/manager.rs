use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use super::Environment;
use crate::paths;
use crate::transport::{
    AwsSettings, DEFAULT_ANTHROPIC_ENDPOINT, DEFAULT_ANTHROPIC_MODEL, DEFAULT_BEDROCK_MODEL,
    DEFAULT_BEDROCK_REGION, DEFAULT_READ_TIMEOUT_SECS,
};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_OUTPUT: &str = "kanji_check_results.csv";
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_AWS_PROFILE: &str = "default";

/// Which remote service answers the prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted Anthropic API.
    #[default]
    Anthropic,
    /// AWS Bedrock runtime.
    Bedrock,
}

impl Backend {
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Self::Bedrock => DEFAULT_BEDROCK_MODEL,
        }
    }
}

/// Settings in the `[check]` section of config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    pub backend: Option<Backend>,
    pub model: Option<String>,
    pub batch_size: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Settings in the `[anthropic]` section of config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL of the Messages API.
    pub endpoint: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
}

/// Settings in the `[bedrock]` section of config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub read_timeout_secs: Option<u64>,
}

/// The complete configuration file structure.
///
/// Corresponds to `~/.config/kanji-check/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub check: CheckConfig,
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    #[serde(default)]
    pub bedrock: BedrockConfig,
}

/// Options for resolving configuration.
///
/// Contains CLI overrides that take precedence over every other source.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub backend: Option<Backend>,
    pub model: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub output: Option<PathBuf>,
    pub batch_size: Option<usize>,
}

/// Configuration after merging CLI options, environment and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend: Backend,
    pub model: String,
    pub batch_size: usize,
    pub output: PathBuf,
    pub anthropic_endpoint: String,
    pub api_key: Option<String>,
    pub region: String,
    pub aws: AwsSettings,
    /// Per-read timeout for the HTTP client, if any.
    pub read_timeout: Option<Duration>,
}

/// Resolves configuration.
///
/// Priority (highest first): CLI options, environment, config file,
/// built-in defaults.
///
/// # Errors
///
/// Returns an error if the batch size is zero, if the Anthropic backend is
/// selected without an API key, or if the home directory cannot be found.
///
/// Every variable, including `HOME`, is read from `env`.
pub fn resolve_config(
    options: &ResolveOptions,
    env: &Environment,
    file: &ConfigFile,
) -> Result<ResolvedConfig> {
    let backend = options
        .backend
        .or_else(|| {
            env.flag("USE_BEDROCK").map(|bedrock| {
                if bedrock {
                    Backend::Bedrock
                } else {
                    Backend::Anthropic
                }
            })
        })
        .or(file.check.backend)
        .unwrap_or_default();

    let model = options
        .model
        .clone()
        .or_else(|| env.get_owned("KANJI_CHECK_MODEL"))
        .or_else(|| file.check.model.clone())
        .unwrap_or_else(|| backend.default_model().to_string());

    let batch_size = options
        .batch_size
        .or(file.check.batch_size)
        .unwrap_or(DEFAULT_BATCH_SIZE);
    if batch_size == 0 {
        bail!("Invalid batch size: 0\n\nThe batch size must be at least 1.");
    }

    let output = options
        .output
        .clone()
        .or_else(|| file.check.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let anthropic_endpoint = env
        .get_owned("ANTHROPIC_BASE_URL")
        .or_else(|| file.anthropic.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ANTHROPIC_ENDPOINT.to_string());

    let api_key_env = file
        .anthropic
        .api_key_env
        .as_deref()
        .unwrap_or(DEFAULT_API_KEY_ENV);
    let api_key = env.get_owned(api_key_env);

    if backend == Backend::Anthropic && api_key.is_none() {
        bail!(
            "Anthropic API requires an API key\n\n\
             Set the {api_key_env} environment variable:\n  \
             export {api_key_env}=\"your-api-key\"\n\n\
             Or use AWS Bedrock instead: USE_BEDROCK=1 or --backend bedrock"
        );
    }

    let region = options
        .region
        .clone()
        .or_else(|| env.get_owned("AWS_REGION"))
        .or_else(|| file.bedrock.region.clone())
        .unwrap_or_else(|| DEFAULT_BEDROCK_REGION.to_string());

    let profile = options
        .profile
        .clone()
        .or_else(|| env.get_owned("AWS_PROFILE"))
        .or_else(|| file.bedrock.profile.clone())
        .unwrap_or_else(|| DEFAULT_AWS_PROFILE.to_string());

    let read_timeout = match backend {
        Backend::Anthropic => None,
        Backend::Bedrock => Some(Duration::from_secs(
            file.bedrock
                .read_timeout_secs
                .unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
        )),
    };

    let aws = AwsSettings {
        profile,
        region: region.clone(),
        sts_endpoint: env.get_owned("AWS_ENDPOINT_URL_STS"),
        bearer_token: env.get_owned("AWS_BEARER_TOKEN_BEDROCK"),
        access_key_id: env.get_owned("AWS_ACCESS_KEY_ID"),
        secret_access_key: env.get_owned("AWS_SECRET_ACCESS_KEY"),
        session_token: env.get_owned("AWS_SESSION_TOKEN"),
        credentials_file: aws_file(env, "AWS_SHARED_CREDENTIALS_FILE", "credentials")?,
        config_file: aws_file(env, "AWS_CONFIG_FILE", "config")?,
    };

    Ok(ResolvedConfig {
        backend,
        model,
        batch_size,
        output,
        anthropic_endpoint,
        api_key,
        region,
        aws,
        read_timeout,
    })
}

fn aws_file(env: &Environment, var: &str, default_name: &str) -> Result<PathBuf> {
    match env.get(var) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(paths::aws_dir(env)?.join(default_name)),
    }
}

/// Loads the configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager.
    ///
    /// Configuration is stored at `$XDG_CONFIG_HOME/kanji-check/config.toml`
    /// or `~/.config/kanji-check/config.toml` if `XDG_CONFIG_HOME` is not set.
    pub fn new(env: &Environment) -> Result<Self> {
        Ok(Self {
            config_path: paths::config_dir(env)?.join("config.toml"),
        })
    }

    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Loads the config file; a missing file yields the defaults.
    pub fn load_or_default(&self) -> Result<ConfigFile> {
        if !self.config_path.exists() {
            return Ok(ConfigFile::default());
        }

        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        toml::from_str(&contents).with_context(|| {
            format!(
                "Failed to parse config file: {}",
                self.config_path.display()
            )
        })
    }
}
