use tracing::debug;

use crate::{
    Res,
    config::Config,
    http::Transport,
    management::CredentialStore,
    spotify::{AuthorizationFlow, CodePrompt, RefreshFlow},
    types::Credential,
    utils::Clock,
};

/// Where the stored credential stands at a given moment.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenState {
    NoCredential,
    Valid(Credential),
    Expired(Credential),
}

/// Decides whether to reuse, refresh or newly authorize, and persists the
/// outcome.
///
/// The decision is a pure function of the store contents and the clock, and
/// is taken again on every run. The store is only written after a
/// successful exchange, so a failed refresh or authorization leaves the
/// previous record in place.
pub struct TokenLifecycle<'a, T, C> {
    store: &'a CredentialStore,
    clock: &'a C,
    authorization: AuthorizationFlow<'a, T, C>,
    refresh: RefreshFlow<'a, T, C>,
}

impl<'a, T: Transport, C: Clock> TokenLifecycle<'a, T, C> {
    pub fn new(
        config: &'a Config,
        store: &'a CredentialStore,
        transport: &'a T,
        clock: &'a C,
    ) -> Self {
        TokenLifecycle {
            store,
            clock,
            authorization: AuthorizationFlow::new(config, transport, clock),
            refresh: RefreshFlow::new(config, transport, clock),
        }
    }

    /// Classifies the stored credential against the clock without touching
    /// the network.
    ///
    /// # Errors
    ///
    /// A store that exists but cannot be read yields
    /// [`Error::CorruptStore`](crate::Error::CorruptStore) or
    /// [`Error::MissingField`](crate::Error::MissingField). It is never
    /// treated as [`TokenState::NoCredential`].
    pub async fn state(&self) -> Res<TokenState> {
        if !self.store.exists().await {
            return Ok(TokenState::NoCredential);
        }

        let credential = self.store.read().await?;
        if credential.is_valid_at(self.clock.timestamp()) {
            Ok(TokenState::Valid(credential))
        } else {
            Ok(TokenState::Expired(credential))
        }
    }

    /// Returns an access token that is valid right now.
    ///
    /// Without a stored credential, or with an expired one that cannot be
    /// refreshed, this runs the authorization flow and asks `prompt` for the
    /// code.
    pub async fn get_access_token<P: CodePrompt>(&self, prompt: &P) -> Res<String> {
        let credential = match self.state().await? {
            TokenState::Valid(credential) => {
                debug!(
                    expires_at = credential.expires_at(),
                    "reusing cached access token"
                );
                return Ok(credential.access_token);
            }
            TokenState::Expired(prior) if prior.refresh_token().is_some() => {
                debug!(expired_at = prior.expires_at(), "access token expired, refreshing");
                self.refresh.refresh(&prior).await?
            }
            TokenState::Expired(_) => {
                debug!("access token expired and cannot be refreshed, re-authorizing");
                self.authorize(prompt).await?
            }
            TokenState::NoCredential => {
                debug!(path = %self.store.path().display(), "no stored credential, authorizing");
                self.authorize(prompt).await?
            }
        };

        self.store.write(&credential).await?;
        Ok(credential.access_token)
    }

    async fn authorize<P: CodePrompt>(&self, prompt: &P) -> Res<Credential> {
        let url = self.authorization.begin_authorization().await?;
        let code = prompt.request_code(&url).await?;
        self.authorization.complete_authorization(&code).await
    }
}
