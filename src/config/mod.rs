//! Configuration file loading and resolution of CLI, environment and file
//! settings.

mod env;
mod manager;

pub use env::Environment;
pub use manager::{
    AnthropicConfig, Backend, BedrockConfig, CheckConfig, ConfigFile, ConfigManager,
    DEFAULT_API_KEY_ENV, DEFAULT_AWS_PROFILE, DEFAULT_BATCH_SIZE, DEFAULT_OUTPUT, ResolveOptions,
    ResolvedConfig, resolve_config,
};
