//! # Spotify Integration Module
//!
//! Everything that talks to Spotify's accounts service and Web API:
//!
//! - [`auth`] - the authorization-code exchange ([`AuthorizationFlow`]) and
//!   the refresh-token exchange ([`RefreshFlow`]), both authenticated with
//!   the application's client id and secret via HTTP Basic
//! - [`player`] - the "currently playing" query and its one-line rendering
//!
//! All requests go through a [`crate::http::Transport`], so the flows carry
//! no knowledge of the HTTP client in use.

pub mod auth;
pub mod player;

pub use auth::{AuthorizationFlow, CodePrompt, RefreshFlow, extract_code};
pub use player::{PlaybackQuery, PlaybackStatus};
