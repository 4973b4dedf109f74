//! Outbound HTTP capability.
//!
//! Components never talk to reqwest directly: they describe a request as an
//! [`HttpRequest`] and hand it to a [`Transport`], which answers with the
//! status code and body text. [`ReqwestTransport`] is the real
//! implementation; tests substitute a scripted one.

use std::{fmt, future::Future};

use reqwest::{Client, redirect};
use tracing::debug;

use crate::Res;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A transport-neutral description of one outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Sent as `application/x-www-form-urlencoded` when present.
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    /// A bare GET with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        HttpRequest {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    /// A POST whose body is the url-encoded `form`, in the given order.
    ///
    /// # Example
    ///
    /// ```
    /// use nowplaying::http::HttpRequest;
    ///
    /// let request = HttpRequest::post_form(
    ///     "https://accounts.spotify.com/api/token",
    ///     &[("grant_type", "refresh_token"), ("refresh_token", "r1")],
    /// );
    /// assert_eq!(request.form_value("grant_type"), Some("refresh_token"));
    /// ```
    pub fn post_form(url: impl Into<String>, form: &[(&str, &str)]) -> Self {
        HttpRequest {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            form: Some(
                form.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }

    /// Appends a header. Names are not deduplicated.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First header called `name`, compared without regard to ASCII case.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .as_ref()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and body text. Headers are not needed by any caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    /// Any 3xx status.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Send a request, receive status and body.
///
/// Redirects must not be followed: the authorization flow inspects the 3xx
/// itself.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Res<HttpResponse>> + Send;
}

/// [`Transport`] over a shared reqwest [`Client`] that never follows
/// redirects.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// [`Error::Http`](crate::Error::Http) if the TLS backend cannot be
    /// initialised.
    pub fn new() -> Res<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ReqwestTransport { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Res<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, url = %request.url, "received response");
        Ok(HttpResponse { status, body })
    }
}
