#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use carebell_assistant::{AssistantConfig, DialogueBridge};
use carebell_db::{create_pool, DbPool, DbRuntimeSettings};
use carebell_server::{app, middleware::RateLimiter, AppState};
use carebell_voice::{LiveKitConfig, TokenService};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const LIVEKIT_URL: &str = "wss://livekit.carebell.test";
pub const LIVEKIT_KEY: &str = "devkey";
pub const LIVEKIT_SECRET: &str = "server-test-secret-long-enough";

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
}

pub struct Options {
    pub rate_limit_per_minute: u32,
    pub voice: LiveKitConfig,
    pub assistant: AssistantConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 1_000,
            voice: LiveKitConfig::new(LIVEKIT_URL, LIVEKIT_KEY, LIVEKIT_SECRET),
            assistant: AssistantConfig::default(),
        }
    }
}

pub fn test_app(options: Options) -> TestApp {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        carebell_db::run_migrations(&conn).unwrap();
    }

    let state = AppState {
        pool: pool.clone(),
        token_service: Arc::new(TokenService::new(options.voice)),
        bridge: Arc::new(DialogueBridge::new(options.assistant).unwrap()),
        rate_limiter: RateLimiter::new(),
        rate_limit_per_minute: options.rate_limit_per_minute,
        session_ttl: chrono::Duration::hours(1),
    };

    TestApp {
        router: app(state),
        pool,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_from(
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            method,
            uri,
            token,
            body,
        )
        .await
    }

    pub async fn send_from(
        &self,
        ip: IpAddr,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(ip, 40_000)));

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Registers a user and returns `(token, user_id)`.
    pub async fn sign_up(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "hunter22",
                    "name": "Margaret",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Creates a medication with a reminder and returns the reminder id.
    pub async fn add_medication(&self, token: &str, name: &str, time: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/medications",
                Some(token),
                Some(json!({ "name": name, "dose": "10mg", "time": time })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}

/// Requests seen by the fake completion gateway, and its scripted replies.
#[derive(Default)]
pub struct Gateway {
    pub requests: Mutex<Vec<Value>>,
    pub replies: Mutex<Vec<(StatusCode, Value)>>,
}

impl Gateway {
    pub fn reply(&self, status: StatusCode, body: Value) {
        self.replies.lock().unwrap().push((status, body));
    }

    pub fn reply_text(&self, text: &str) {
        self.reply(
            StatusCode::OK,
            json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] }),
        );
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn completions(
    State(gateway): State<Arc<Gateway>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    gateway.requests.lock().unwrap().push(body);
    let mut replies = gateway.replies.lock().unwrap();
    let (status, body) = if replies.is_empty() {
        (
            StatusCode::OK,
            json!({ "choices": [{ "message": { "content": "default reply" } }] }),
        )
    } else {
        replies.remove(0)
    };
    (status, Json(body))
}

/// Starts a fake chat-completion endpoint and returns a config pointing at it.
pub async fn fake_gateway() -> (AssistantConfig, Arc<Gateway>) {
    let gateway = Arc::new(Gateway::default());
    let router = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(gateway.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = AssistantConfig::new(format!("http://{addr}/v1/chat/completions"), "gateway-key");
    (config, gateway)
}
