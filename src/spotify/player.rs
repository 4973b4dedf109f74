use std::fmt;

use tracing::{debug, warn};

use crate::{
    Error, Res,
    config::Config,
    http::{HttpRequest, Transport},
    types::CurrentlyPlaying,
};

pub const PLAYING_ICON: char = '\u{f04b}';
pub const PAUSED_ICON: char = '\u{f04c}';
pub const STOPPED_ICON: char = '\u{f04d}';

/// What the player is doing, ready to be printed as the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing { track: String, artist: String },
    Paused { track: String, artist: String },
    NothingPlaying,
    /// The endpoint answered something other than 200 or 204.
    Unavailable { status: u16 },
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Playing { track, artist } => {
                write!(f, "{PLAYING_ICON} {track} by {artist}")
            }
            PlaybackStatus::Paused { track, artist } => {
                write!(f, "{PAUSED_ICON} {track} by {artist}")
            }
            PlaybackStatus::NothingPlaying => write!(f, "{STOPPED_ICON} No music playing"),
            PlaybackStatus::Unavailable { status } => {
                write!(f, "{}", Error::PlaybackQuery { status: *status })
            }
        }
    }
}

impl From<CurrentlyPlaying> for PlaybackStatus {
    fn from(playing: CurrentlyPlaying) -> Self {
        let Some(item) = playing.item else {
            return PlaybackStatus::NothingPlaying;
        };
        let artist = item
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();

        if playing.is_playing {
            PlaybackStatus::Playing {
                track: item.name,
                artist,
            }
        } else {
            PlaybackStatus::Paused {
                track: item.name,
                artist,
            }
        }
    }
}

/// The "currently playing" endpoint.
pub struct PlaybackQuery<'a, T> {
    config: &'a Config,
    transport: &'a T,
}

impl<'a, T: Transport> PlaybackQuery<'a, T> {
    /// Borrows the endpoints from `config`; the access token is passed per
    /// call.
    pub fn new(config: &'a Config, transport: &'a T) -> Self {
        PlaybackQuery { config, transport }
    }

    /// Fetches the player state.
    ///
    /// Only transport failures are errors. An unexpected status, or a 200
    /// whose body cannot be read, becomes [`PlaybackStatus::Unavailable`]
    /// and is printed like any other status line.
    ///
    /// # Errors
    ///
    /// [`Error::Http`] when the request never gets an answer.
    pub async fn fetch(&self, access_token: &str) -> Res<PlaybackStatus> {
        let request = HttpRequest::get(self.config.endpoints.currently_playing_url())
            .header("Authorization", format!("Bearer {access_token}"));
        let response = self.transport.send(request).await?;

        let status = match response.status {
            200 => match serde_json::from_str::<CurrentlyPlaying>(&response.body) {
                Ok(playing) => PlaybackStatus::from(playing),
                Err(e) => {
                    warn!(error = %e, "unreadable currently-playing body");
                    PlaybackStatus::Unavailable { status: 200 }
                }
            },
            204 => PlaybackStatus::NothingPlaying,
            status => {
                warn!(status, "currently-playing request failed");
                PlaybackStatus::Unavailable { status }
            }
        };

        debug!(?status, "playback status");
        Ok(status)
    }
}
