//! Error types shared across the client.
//!
//! ERROR HANDLING
//! ==============
//! The API client separates two failure channels. `Transport` and `Decode`
//! mean the request never produced a usable JSON answer; `Rejected` means the
//! backend answered with an `error` field. Flows show the backend message for
//! the latter and a generic per-action message for the former.

use std::path::PathBuf;

/// Grepable error code for logs and notifications.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

/// Errors produced by [`crate::api::Backend`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP exchange failed before a response body was read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body was not the JSON shape the client expects.
    #[error("unreadable response (status {status}): {message}")]
    Decode { status: u16, message: String },

    /// The backend answered with an `error` field.
    #[error("{0}")]
    Rejected(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Decode { .. } => "E_DECODE",
            Self::Rejected(_) => "E_REJECTED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

impl ApiError {
    /// The backend-supplied message, if the request was rejected.
    #[must_use]
    pub fn rejection(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

/// Errors produced by session persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored session record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORE_IO",
            Self::Malformed(_) => "E_STORE_MALFORMED",
        }
    }
}

/// Errors produced while editing a post draft.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("a post can carry at most {limit} media files")]
    TooManyMedia { limit: usize },

    #[error("no media file at position {index} (draft has {len})")]
    NoSuchMedia { index: usize, len: usize },

    #[error("unsupported media file: {}", .0.display())]
    UnsupportedMedia(PathBuf),

    #[error("could not read media file {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
}

impl ErrorCode for DraftError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TooManyMedia { .. } => "E_TOO_MANY_MEDIA",
            Self::NoSuchMedia { .. } => "E_NO_SUCH_MEDIA",
            Self::UnsupportedMedia(_) => "E_UNSUPPORTED_MEDIA",
            Self::Read { .. } => "E_MEDIA_READ",
        }
    }
}

/// Errors produced while building a [`crate::config::ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: env var {var} not set")]
    MissingVar { var: &'static str },

    #[error("config parse failed: {0}")]
    Parse(String),

    #[error("could not read endpoints file {}: {source}", .path.display())]
    EndpointsFile { path: PathBuf, source: std::io::Error },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingVar { .. } => "E_CONFIG_MISSING",
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::EndpointsFile { .. } => "E_ENDPOINTS_FILE",
        }
    }
}
