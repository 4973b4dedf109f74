use std::future::Future;

use tracing::debug;

use crate::{
    Error, Res,
    config::Config,
    http::{HttpRequest, HttpResponse, Transport},
    types::{Credential, TokenResponse},
    utils::{self, Clock},
};

/// Supplies the authorization code once the user has approved access.
///
/// The lifecycle calls this between the two phases of
/// [`AuthorizationFlow`]. Implementations decide how to reach the user: the
/// CLI prints the URL and reads from stdin, tests return a fixed code.
pub trait CodePrompt {
    fn request_code(&self, authorize_url: &str) -> impl Future<Output = Res<String>> + Send;
}

/// One-time authorization-code exchange.
///
/// Split into [`begin_authorization`](Self::begin_authorization), which
/// yields the URL the user has to visit, and
/// [`complete_authorization`](Self::complete_authorization), which trades the
/// code from the redirect for a token set.
pub struct AuthorizationFlow<'a, T, C> {
    config: &'a Config,
    transport: &'a T,
    clock: &'a C,
}

impl<'a, T: Transport, C: Clock> AuthorizationFlow<'a, T, C> {
    pub fn new(config: &'a Config, transport: &'a T, clock: &'a C) -> Self {
        AuthorizationFlow {
            config,
            transport,
            clock,
        }
    }

    /// The authorize endpoint with client id, `response_type=code`, redirect
    /// URI and scope in its query.
    pub fn authorize_url(&self) -> Res<String> {
        let client = &self.config.client;
        let scope = client.scope();
        utils::url_with_query(
            &self.config.endpoints.authorize_url,
            &[
                ("client_id", client.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", client.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
    }

    /// Checks that Spotify answers the authorize request with a redirect and
    /// returns the URL to present to the user.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] with the received status when the response
    /// is not a 3xx.
    pub async fn begin_authorization(&self) -> Res<String> {
        let url = self.authorize_url()?;
        let response = self.transport.send(HttpRequest::get(url.as_str())).await?;

        if !response.is_redirect() {
            return Err(Error::authorization(
                Some(response.status),
                "authorize endpoint did not redirect",
            ));
        }

        debug!(status = response.status, "authorize endpoint redirected");
        Ok(url)
    }

    /// Exchanges an authorization code for a fresh credential.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] when the code is blank, the token endpoint
    /// answers anything but 200, or the body is not a token response.
    pub async fn complete_authorization(&self, code: &str) -> Res<Credential> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::authorization(None, "no authorization code entered"));
        }

        let client = &self.config.client;
        let request = HttpRequest::post_form(
            self.config.endpoints.token_url.as_str(),
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", client.redirect_uri.as_str()),
            ],
        )
        .header("Authorization", client.basic_authorization());

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(Error::authorization(
                Some(response.status),
                describe_rejection(&response, "token endpoint rejected the authorization code"),
            ));
        }

        let token = parse_token(&response)
            .map_err(|e| Error::authorization(Some(response.status), e.to_string()))?;
        Ok(Credential::issue(token, self.clock.timestamp()))
    }
}

/// Mints a new access token from a refresh token, without user interaction.
pub struct RefreshFlow<'a, T, C> {
    config: &'a Config,
    transport: &'a T,
    clock: &'a C,
}

impl<'a, T: Transport, C: Clock> RefreshFlow<'a, T, C> {
    pub fn new(config: &'a Config, transport: &'a T, clock: &'a C) -> Self {
        RefreshFlow {
            config,
            transport,
            clock,
        }
    }

    /// Renews `prior`. Spotify does not always rotate refresh tokens; when
    /// the response omits one, the prior refresh token is carried over.
    ///
    /// # Errors
    ///
    /// [`Error::Refresh`] when `prior` has no refresh token, the token
    /// endpoint answers anything but 200, or the body is not a token
    /// response.
    pub async fn refresh(&self, prior: &Credential) -> Res<Credential> {
        let Some(refresh_token) = prior.refresh_token() else {
            return Err(Error::refresh(None, "credential has no refresh token"));
        };

        let request = HttpRequest::post_form(
            self.config.endpoints.token_url.as_str(),
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )
        .header("Authorization", self.config.client.basic_authorization());

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(Error::refresh(
                Some(response.status),
                describe_rejection(&response, "token endpoint rejected the refresh token"),
            ));
        }

        let token = parse_token(&response)
            .map_err(|e| Error::refresh(Some(response.status), e.to_string()))?;

        let mut credential = Credential::issue(token, self.clock.timestamp());
        if credential.refresh_token.is_none() {
            debug!("refresh response omitted refresh_token, keeping the prior one");
            credential.refresh_token = Some(refresh_token.to_string());
        }
        Ok(credential)
    }
}

/// Pulls the authorization code out of what the user pasted: either the
/// bare code or the whole redirect URL.
pub fn extract_code(input: &str) -> Res<String> {
    let input = input.trim();
    if !input.contains("://") {
        return Ok(input.to_string());
    }

    if let Some(code) = utils::query_param(input, "code") {
        return Ok(code);
    }
    match utils::query_param(input, "error") {
        Some(reason) => Err(Error::authorization(None, format!("access denied: {reason}"))),
        None => Err(Error::authorization(
            None,
            "redirect URL does not contain a code",
        )),
    }
}

fn parse_token(response: &HttpResponse) -> serde_json::Result<TokenResponse> {
    serde_json::from_str(&response.body)
}

/// Uses the OAuth `error_description`/`error` from the body when present.
fn describe_rejection(response: &HttpResponse, fallback: &str) -> String {
    let body: serde_json::Value = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(_) => return fallback.to_string(),
    };
    body.get("error_description")
        .or_else(|| body.get("error"))
        .and_then(|v| v.as_str())
        .map(|detail| format!("{fallback} ({detail})"))
        .unwrap_or_else(|| fallback.to_string())
}
