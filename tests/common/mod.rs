#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io,
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use chrono::{DateTime, Utc};
use nowplaying::{
    Error, Res,
    config::{ClientApplication, Config, Endpoints},
    http::{HttpRequest, HttpResponse, Transport},
    spotify::CodePrompt,
    types::Credential,
    utils::Clock,
};
use serde_json::Map;

pub const NOW: i64 = 1_700_000_000;
pub const AUTHORIZE_URL: &str = "https://accounts.example.test/authorize";
pub const TOKEN_URL: &str = "https://accounts.example.test/api/token";
pub const API_URL: &str = "https://api.example.test/v1";
// base64("id:secret")
pub const BASIC_AUTH: &str = "Basic aWQ6c2VjcmV0";

pub fn test_config(dir: &Path) -> Config {
    Config {
        client: ClientApplication {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080".to_string(),
        },
        endpoints: Endpoints {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_url: API_URL.to_string(),
        },
        credentials_path: dir.join("credentials"),
    }
}

pub fn credential(access: &str, refresh: Option<&str>, issued_at: i64) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_in: 3600,
        issued_at,
        extra: Map::new(),
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap()
    }
}

/// Answers requests from a script and records what was sent.
pub struct FakeTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        FakeTransport {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Res<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        next.ok_or_else(|| Error::Io(io::Error::other("no scripted response left")))
    }
}

/// Hands out a fixed code and counts how often it was asked.
pub struct ScriptedPrompt {
    code: String,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(code: &str) -> Self {
        ScriptedPrompt {
            code: code.to_string(),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl CodePrompt for ScriptedPrompt {
    async fn request_code(&self, authorize_url: &str) -> Res<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(authorize_url.to_string());
        Ok(self.code.clone())
    }
}
