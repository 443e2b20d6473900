//! XDG-style path utilities for configuration, plus the AWS shared-file
//! directory. Paths are derived from the captured [`Environment`], not the
//! live process environment.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Environment;

/// Returns the configuration directory for kanji-check.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/kanji-check` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/kanji-check` otherwise
pub fn config_dir(env: &Environment) -> Result<PathBuf> {
    match env.get("XDG_CONFIG_HOME") {
        Some(xdg) => Ok(PathBuf::from(xdg).join("kanji-check")),
        None => Ok(home_dir(env)?.join(".config").join("kanji-check")),
    }
}

/// Returns `~/.aws`, the default home of the shared credentials and config files.
pub fn aws_dir(env: &Environment) -> Result<PathBuf> {
    Ok(home_dir(env)?.join(".aws"))
}

/// `HOME` from the snapshot, then the platform lookup.
fn home_dir(env: &Environment) -> Result<PathBuf> {
    env.get("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .context("Failed to determine home directory")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        vars.iter().copied().collect()
    }

    #[test]
    fn test_config_dir_from_home() {
        let dir = config_dir(&env(&[("HOME", "/home/kanji")])).unwrap();
        assert_eq!(dir, PathBuf::from("/home/kanji/.config/kanji-check"));
    }

    #[test]
    fn test_config_dir_xdg_override() {
        let dir = config_dir(&env(&[
            ("HOME", "/home/kanji"),
            ("XDG_CONFIG_HOME", "/custom/config"),
        ]))
        .unwrap();
        assert_eq!(dir, PathBuf::from("/custom/config/kanji-check"));
    }

    #[test]
    fn test_empty_xdg_falls_back_to_home() {
        let dir = config_dir(&env(&[("HOME", "/home/kanji"), ("XDG_CONFIG_HOME", "")])).unwrap();
        assert_eq!(dir, PathBuf::from("/home/kanji/.config/kanji-check"));
    }

    #[test]
    fn test_aws_dir() {
        assert_eq!(
            aws_dir(&env(&[("HOME", "/home/kanji")])).unwrap(),
            PathBuf::from("/home/kanji/.aws")
        );
    }
}
