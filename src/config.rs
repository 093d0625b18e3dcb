//! Configuration for the demo surface.
//!
//! Looks for `handoff.toml` next to the working directory first, then under
//! the user config root. An explicit `--config` path must exist; the implicit
//! locations fall back to defaults when absent.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub display: DisplayConfig,
    pub permission: PermissionConfig,
}

/// Terminal presentation options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Whether prompts use color output.
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Pre-seeded permission grants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionConfig {
    /// Directories granted recursively for the whole session at startup,
    /// as if the operator had answered `allow_session`.
    pub session_dirs: Vec<String>,
}

/// Load configuration from disk.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        user_config_path,
    )
}

pub(crate) fn load_config_from_sources<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    user_config: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    // Explicit path: must load.
    if let Some(path) = path_override {
        let text = read_file(Path::new(path))?;
        return parse_config(&text);
    }

    // Implicit locations: first readable one wins, otherwise defaults.
    let mut candidates = vec![PathBuf::from("handoff.toml")];
    if let Some(path) = user_config() {
        candidates.push(path);
    }
    for candidate in candidates {
        if let Ok(text) = read_file(&candidate) {
            return parse_config(&text);
        }
    }
    Ok(Config::default())
}

fn parse_config(text: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// `~/.config/handoff/handoff.toml` (platform equivalent).
fn user_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("handoff").join("handoff.toml"))
}
