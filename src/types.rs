use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by [`Credential`] itself; never taken from provider extras.
const RESERVED_KEYS: [&str; 4] = ["access_token", "refresh_token", "expires_in", "issued_at"];

/// The persisted token set.
///
/// `issued_at` is unix seconds, stamped once when the credential is created
/// from a token response. Any extra fields Spotify returns (`token_type`,
/// `scope`, ...) are kept in `extra` and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub issued_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Builds a credential from a token endpoint response.
    ///
    /// `issued_at` always comes from the caller's clock; a provider field of
    /// the same name is dropped so the record never holds the key twice.
    pub fn issue(response: TokenResponse, issued_at: i64) -> Self {
        let mut extra = response.extra;
        for key in RESERVED_KEYS {
            extra.remove(key);
        }

        Credential {
            access_token: response.access_token,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
            expires_in: response.expires_in,
            issued_at,
            extra,
        }
    }

    /// Unix second at which the access token stops being valid.
    pub fn expires_at(&self) -> i64 {
        self.issued_at
            .saturating_add(i64::try_from(self.expires_in).unwrap_or(i64::MAX))
    }

    /// True while `now` (unix seconds) is before [`expires_at`](Self::expires_at).
    pub fn is_valid_at(&self, now: i64) -> bool {
        now < self.expires_at()
    }

    /// The refresh token, if one is usable.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Body of a successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    pub item: Option<PlaybackItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackItem {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}
