mod common;

use common::*;
use nowplaying::{
    Error,
    http::{HttpResponse, Method},
    management::{CredentialStore, TokenLifecycle, TokenState},
    utils,
};
use serde_json::{Value, json};
use tempfile::tempdir;

fn stored_json(store: &CredentialStore) -> Value {
    serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap()
}

#[tokio::test]
async fn test_first_run_authorizes_and_second_run_reuses() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![
        HttpResponse::new(302, ""),
        HttpResponse::new(
            200,
            r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#,
        ),
    ]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("abc123");
    let lifecycle = TokenLifecycle::new(&config, &store, &transport, &clock);

    assert_eq!(lifecycle.state().await.unwrap(), TokenState::NoCredential);
    assert_eq!(lifecycle.get_access_token(&prompt).await.unwrap(), "T1");
    assert_eq!(
        stored_json(&store),
        json!({
            "access_token": "T1",
            "refresh_token": "R1",
            "expires_in": 3600,
            "issued_at": NOW,
        })
    );

    // immediate second call: cached, no network, no prompt
    assert_eq!(lifecycle.get_access_token(&prompt).await.unwrap(), "T1");
    assert_eq!(transport.calls(), 2);
    assert_eq!(prompt.calls(), 1);
}

#[tokio::test]
async fn test_authorization_requests_carry_client_and_code() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![
        HttpResponse::new(303, ""),
        HttpResponse::new(
            200,
            r#"{"access_token":"T1","token_type":"Bearer","scope":"user-read-playback-state","expires_in":3600,"refresh_token":"R1"}"#,
        ),
    ]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("abc123");

    TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&prompt)
        .await
        .unwrap();

    let requests = transport.requests();
    let authorize = &requests[0];
    assert_eq!(authorize.method, Method::Get);
    assert!(authorize.url.starts_with(AUTHORIZE_URL));
    assert_eq!(prompt.urls(), vec![authorize.url.clone()]);
    assert_eq!(utils::query_param(&authorize.url, "client_id").as_deref(), Some("id"));
    assert_eq!(utils::query_param(&authorize.url, "response_type").as_deref(), Some("code"));
    assert_eq!(
        utils::query_param(&authorize.url, "redirect_uri").as_deref(),
        Some("http://localhost:8080")
    );
    assert_eq!(
        utils::query_param(&authorize.url, "scope").as_deref(),
        Some("user-read-playback-state user-read-currently-playing")
    );

    let exchange = &requests[1];
    assert_eq!(exchange.method, Method::Post);
    assert_eq!(exchange.url, TOKEN_URL);
    assert_eq!(exchange.header_value("Authorization"), Some(BASIC_AUTH));
    assert_eq!(exchange.form_value("grant_type"), Some("authorization_code"));
    assert_eq!(exchange.form_value("code"), Some("abc123"));
    assert_eq!(exchange.form_value("redirect_uri"), Some("http://localhost:8080"));

    // provider extras are kept verbatim
    let stored = stored_json(&store);
    assert_eq!(stored["token_type"], "Bearer");
    assert_eq!(stored["scope"], "user-read-playback-state");
}

#[tokio::test]
async fn test_provider_issued_at_does_not_override_clock_stamp() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![
        HttpResponse::new(302, ""),
        HttpResponse::new(
            200,
            r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600,"issued_at":5}"#,
        ),
    ]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("abc123");
    let lifecycle = TokenLifecycle::new(&config, &store, &transport, &clock);

    assert_eq!(lifecycle.get_access_token(&prompt).await.unwrap(), "T1");

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(raw.matches("\"issued_at\"").count(), 1);
    let stored = store.read().await.unwrap();
    assert_eq!(stored.issued_at, NOW);
    assert!(stored.extra.is_empty());

    // still cached: no refresh, no second authorization
    assert_eq!(lifecycle.get_access_token(&prompt).await.unwrap(), "T1");
    assert_eq!(transport.calls(), 2);
    assert_eq!(prompt.calls(), 1);
}

#[tokio::test]
async fn test_valid_credential_needs_no_network() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    store
        .write(&credential("T1", Some("R1"), NOW - 3599))
        .await
        .unwrap();
    let transport = FakeTransport::new(vec![]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("unused");
    let lifecycle = TokenLifecycle::new(&config, &store, &transport, &clock);

    assert!(matches!(lifecycle.state().await.unwrap(), TokenState::Valid(_)));
    assert_eq!(lifecycle.get_access_token(&prompt).await.unwrap(), "T1");
    assert_eq!(transport.calls(), 0);
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_expired_credential_keeps_refresh_token_when_omitted() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    store
        .write(&credential("T1", Some("R1"), NOW - 7200))
        .await
        .unwrap();
    let transport = FakeTransport::new(vec![HttpResponse::new(
        200,
        r#"{"access_token":"T2","expires_in":3600}"#,
    )]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("unused");
    let lifecycle = TokenLifecycle::new(&config, &store, &transport, &clock);

    assert!(matches!(lifecycle.state().await.unwrap(), TokenState::Expired(_)));
    assert_eq!(lifecycle.get_access_token(&prompt).await.unwrap(), "T2");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, TOKEN_URL);
    assert_eq!(requests[0].header_value("Authorization"), Some(BASIC_AUTH));
    assert_eq!(requests[0].form_value("grant_type"), Some("refresh_token"));
    assert_eq!(requests[0].form_value("refresh_token"), Some("R1"));

    let stored = store.read().await.unwrap();
    assert_eq!(stored.access_token, "T2");
    assert_eq!(stored.refresh_token.as_deref(), Some("R1"));
    assert_eq!(stored.issued_at, NOW);
    assert_eq!(prompt.calls(), 0);
}

#[tokio::test]
async fn test_rotated_refresh_token_replaces_prior() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    store
        .write(&credential("T1", Some("R1"), NOW - 7200))
        .await
        .unwrap();
    let transport = FakeTransport::new(vec![HttpResponse::new(
        200,
        r#"{"access_token":"T2","refresh_token":"R2","expires_in":1800}"#,
    )]);
    let clock = FixedClock(NOW);

    TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&ScriptedPrompt::new("unused"))
        .await
        .unwrap();

    let stored = store.read().await.unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("R2"));
    assert_eq!(stored.expires_in, 1800);
}

#[tokio::test]
async fn test_token_expires_exactly_at_the_deadline() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    store
        .write(&credential("T1", Some("R1"), NOW - 3600))
        .await
        .unwrap();
    let transport = FakeTransport::new(vec![]);
    let clock = FixedClock(NOW);

    let state = TokenLifecycle::new(&config, &store, &transport, &clock)
        .state()
        .await
        .unwrap();
    assert!(matches!(state, TokenState::Expired(_)));
}

#[tokio::test]
async fn test_failed_refresh_leaves_store_untouched() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    store
        .write(&credential("T1", Some("R1"), NOW - 7200))
        .await
        .unwrap();
    let before = std::fs::read(store.path()).unwrap();
    let transport = FakeTransport::new(vec![HttpResponse::new(
        400,
        r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#,
    )]);
    let clock = FixedClock(NOW);

    let err = TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&ScriptedPrompt::new("unused"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Refresh { status: Some(400), .. }));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_expired_without_refresh_token_reauthorizes() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    store
        .write(&credential("T0", None, NOW - 7200))
        .await
        .unwrap();
    let transport = FakeTransport::new(vec![
        HttpResponse::new(302, ""),
        HttpResponse::new(
            200,
            r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#,
        ),
    ]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("abc123");

    let token = TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&prompt)
        .await
        .unwrap();

    assert_eq!(token, "T1");
    assert_eq!(prompt.calls(), 1);
    assert_eq!(store.read().await.unwrap().refresh_token.as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_authorize_without_redirect_fails_before_prompting() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![HttpResponse::new(400, "bad client")]);
    let clock = FixedClock(NOW);
    let prompt = ScriptedPrompt::new("abc123");

    let err = TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authorization { status: Some(400), .. }));
    assert_eq!(prompt.calls(), 0);
    assert!(!store.exists().await);
}

#[tokio::test]
async fn test_rejected_code_is_not_persisted() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![
        HttpResponse::new(302, ""),
        HttpResponse::new(400, r#"{"error":"invalid_grant"}"#),
    ]);
    let clock = FixedClock(NOW);

    let err = TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&ScriptedPrompt::new("expired-code"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authorization { status: Some(400), .. }));
    assert!(!store.exists().await);
}

#[tokio::test]
async fn test_blank_code_skips_the_exchange() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![HttpResponse::new(302, "")]);
    let clock = FixedClock(NOW);

    let err = TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&ScriptedPrompt::new("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authorization { status: None, .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_corrupt_store_is_fatal_without_network() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::write(&config.credentials_path, "{not json").unwrap();
    let store = CredentialStore::new(&config.credentials_path);
    let transport = FakeTransport::new(vec![]);
    let clock = FixedClock(NOW);

    let err = TokenLifecycle::new(&config, &store, &transport, &clock)
        .get_access_token(&ScriptedPrompt::new("abc123"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::CorruptStore { .. }));
    assert_eq!(transport.calls(), 0);
}
