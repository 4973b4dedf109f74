//! # CLI Module
//!
//! The single `nowplaying` command. It wires configuration, the credential
//! store, the HTTP transport and the clock together, obtains a valid access
//! token through the [`TokenLifecycle`], and renders the player state as one
//! line.
//!
//! ```text
//! now_playing
//!     ├── TokenLifecycle::get_access_token ── CredentialStore
//!     │       ├── AuthorizationFlow (TerminalPrompt)
//!     │       └── RefreshFlow
//!     └── PlaybackQuery::fetch
//! ```

mod prompt;

pub use prompt::TerminalPrompt;

use crate::{
    Res,
    config::Config,
    http::{ReqwestTransport, Transport},
    management::{CredentialStore, TokenLifecycle},
    spotify::{CodePrompt, PlaybackQuery},
    utils::{Clock, SystemClock},
};

/// Produces the status line using the real transport, clock and terminal.
pub async fn now_playing(config: &Config) -> Res<String> {
    let transport = ReqwestTransport::new()?;
    run(config, &transport, &SystemClock, &TerminalPrompt::new()).await
}

/// Produces the status line with injected collaborators.
///
/// Only token failures are fatal; an unexpected answer from the playback
/// endpoint is rendered into the line itself.
pub async fn run<T, C, P>(config: &Config, transport: &T, clock: &C, prompt: &P) -> Res<String>
where
    T: Transport,
    C: Clock,
    P: CodePrompt,
{
    let store = CredentialStore::new(config.credentials_path.clone());
    let lifecycle = TokenLifecycle::new(config, &store, transport, clock);
    let access_token = lifecycle.get_access_token(prompt).await?;

    let status = PlaybackQuery::new(config, transport)
        .fetch(&access_token)
        .await?;
    Ok(status.to_string())
}
