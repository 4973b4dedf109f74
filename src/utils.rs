use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::{Error, Res};

/// Source of the current time, injected so expiry decisions are testable.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Appends form-encoded query parameters to `base`.
pub fn url_with_query(base: &str, params: &[(&str, &str)]) -> Res<String> {
    let url = Url::parse_with_params(base, params)
        .map_err(|e| Error::Configuration(format!("invalid URL {base}: {e}")))?;
    Ok(url.into())
}

/// Looks up a query parameter in an absolute URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
