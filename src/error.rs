use std::path::PathBuf;

use thiserror::Error;

/// Every failure the CLI can run into.
///
/// Only [`Error::PlaybackQuery`] is non-fatal: it is rendered as the output
/// line instead of terminating the process.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("credential store {} is unreadable: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("credential store {} is missing required field `{field}`", .path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("authorization failed{}: {reason}", status_suffix(.status))]
    Authorization { status: Option<u16>, reason: String },

    #[error("token refresh failed{}: {reason}", status_suffix(.status))]
    Refresh { status: Option<u16>, reason: String },

    #[error("Error getting currently playing; response {status}")]
    PlaybackQuery { status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn authorization(status: Option<u16>, reason: impl Into<String>) -> Self {
        Error::Authorization {
            status,
            reason: reason.into(),
        }
    }

    pub(crate) fn refresh(status: Option<u16>, reason: impl Into<String>) -> Self {
        Error::Refresh {
            status,
            reason: reason.into(),
        }
    }

    /// HTTP status attached to the failure, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authorization { status, .. } | Error::Refresh { status, .. } => *status,
            Error::PlaybackQuery { status } => Some(*status),
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (response {code})"),
        None => String::new(),
    }
}
