//! Configuration management for the nowplaying CLI.
//!
//! Configuration is read once at startup into an immutable [`Config`] that is
//! passed by reference into every component. Values come from:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the local data directory (`nowplaying/.env`)
//! 3. `.env` in the user's home directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::debug;

use crate::{Error, Res};

pub const APP_DIR: &str = "nowplaying";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Scopes needed to read the player state.
pub const SCOPES: [&str; 2] = ["user-read-playback-state", "user-read-currently-playing"];

const CLIENT_ID_KEYS: &[&str] = &["CLIENT_ID", "SPOTIFY_CLIENT_ID"];
const CLIENT_SECRET_KEYS: &[&str] = &["CLIENT_SECRET", "SPOTIFY_CLIENT_SECRET", "SPOTIFY_SECRET"];
const REDIRECT_URI_KEYS: &[&str] = &["REDIRECT_URI", "SPOTIFY_REDIRECT_URI"];

/// Loads optional `.env` files into the process environment.
///
/// Looks in the platform-specific local data directory first
/// (`~/.local/share/nowplaying/.env` on Linux) and then in the home
/// directory (`~/.env`). Variables that are already set are never
/// overridden, and a missing or unreadable file is skipped.
pub fn load_env() {
    for path in dotenv_candidates() {
        if !path.is_file() {
            continue;
        }
        match dotenv::from_path(&path) {
            Ok(()) => debug!(path = %path.display(), "loaded dotenv file"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping dotenv file"),
        }
    }
}

fn dotenv_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(mut path) = dirs::data_local_dir() {
        path.push(APP_DIR);
        path.push(".env");
        candidates.push(path);
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".env"));
    }
    candidates
}

/// The registered Spotify application used for both token exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientApplication {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl ClientApplication {
    /// Value for the `Authorization` header on token endpoint requests.
    pub fn basic_authorization(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(credentials))
    }

    /// Space separated scope list sent with the authorize request.
    pub fn scope(&self) -> String {
        SCOPES.join(" ")
    }
}

/// Spotify endpoints; overridable so the CLI can be pointed at a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// `<api_url>/me/player/currently-playing`, tolerating a trailing slash
    /// on the base.
    pub fn currently_playing_url(&self) -> String {
        format!(
            "{api}/me/player/currently-playing",
            api = self.api_url.trim_end_matches('/')
        )
    }
}

/// Everything a run needs, resolved once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub client: ClientApplication,
    pub endpoints: Endpoints,
    pub credentials_path: PathBuf,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Call [`load_env`] first so `.env` values are visible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the client id or secret is
    /// missing or blank.
    pub fn from_env() -> Res<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Res<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let client_id = first(CLIENT_ID_KEYS)
            .ok_or_else(|| Error::Configuration("CLIENT_ID must be set".to_string()))?;
        let client_secret = first(CLIENT_SECRET_KEYS)
            .ok_or_else(|| Error::Configuration("CLIENT_SECRET must be set".to_string()))?;
        let redirect_uri =
            first(REDIRECT_URI_KEYS).unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            authorize_url: first(&["SPOTIFY_API_AUTH_URL"]).unwrap_or(defaults.authorize_url),
            token_url: first(&["SPOTIFY_API_TOKEN_URL"]).unwrap_or(defaults.token_url),
            api_url: first(&["SPOTIFY_API_URL"]).unwrap_or(defaults.api_url),
        };

        let credentials_path = match first(&["NOWPLAYING_CREDENTIALS"]) {
            Some(path) => PathBuf::from(path),
            None => default_credentials_path(),
        };

        Ok(Config {
            client: ClientApplication {
                client_id,
                client_secret,
                redirect_uri,
            },
            endpoints,
            credentials_path,
        })
    }
}

/// `<data_local_dir>/nowplaying/credentials`, or `./credentials` when the
/// platform has no data directory.
pub fn default_credentials_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(mut path) => {
            path.push(APP_DIR);
            path.push("credentials");
            path
        }
        None => PathBuf::from("credentials"),
    }
}
