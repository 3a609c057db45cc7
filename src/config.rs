//! Client configuration parsed from environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENDPOINTS_FILE_VAR: &str = "LUMI_ENDPOINTS_FILE";
pub const AUTH_URL_VAR: &str = "LUMI_AUTH_URL";
pub const POSTS_URL_VAR: &str = "LUMI_POSTS_URL";
pub const STATE_DIR_VAR: &str = "LUMI_STATE_DIR";
pub const REQUEST_TIMEOUT_VAR: &str = "LUMI_REQUEST_TIMEOUT_SECS";

const DEFAULT_STATE_DIR_NAME: &str = ".lumi";

/// Backend function URLs, one per resource.
///
/// Deserializes from the deployment's function map (`{"auth": ..., "posts": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    pub auth: String,
    pub posts: String,
}

impl Endpoints {
    /// Load endpoints from a function-map JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or lacks either URL.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::EndpointsFile { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    /// Parse endpoints from function-map JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or lacks either URL.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(format!("endpoints: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    /// Directory holding the persisted session.
    pub state_dir: PathBuf,
    /// Whole-request timeout. Unset means requests wait indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Endpoints:
    /// - `LUMI_ENDPOINTS_FILE`: function-map JSON file, or
    /// - `LUMI_AUTH_URL` and `LUMI_POSTS_URL`
    ///
    /// Optional:
    /// - `LUMI_STATE_DIR`: default `$HOME/.lumi`
    /// - `LUMI_REQUEST_TIMEOUT_SECS`: unset by default
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoints are configured or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoints = match non_empty(lookup(ENDPOINTS_FILE_VAR)) {
            Some(path) => Endpoints::from_file(Path::new(&path))?,
            None => Endpoints {
                auth: non_empty(lookup(AUTH_URL_VAR)).ok_or(ConfigError::MissingVar { var: AUTH_URL_VAR })?,
                posts: non_empty(lookup(POSTS_URL_VAR)).ok_or(ConfigError::MissingVar { var: POSTS_URL_VAR })?,
            },
        };

        let state_dir = non_empty(lookup(STATE_DIR_VAR)).map_or_else(
            || default_state_dir(lookup("HOME")),
            PathBuf::from,
        );

        let request_timeout = match non_empty(lookup(REQUEST_TIMEOUT_VAR)) {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self { endpoints, state_dir, request_timeout })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn default_state_dir(home: Option<String>) -> PathBuf {
    match non_empty(home) {
        Some(home) => PathBuf::from(home).join(DEFAULT_STATE_DIR_NAME),
        None => PathBuf::from(DEFAULT_STATE_DIR_NAME),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Parse(format!("{REQUEST_TIMEOUT_VAR} must be a positive integer, got '{raw}'"))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
