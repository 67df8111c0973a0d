use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use carebell_assistant::{
    build_context, build_context_entries, AssistantConfig, AssistantError, DialogueBridge,
    ReminderSource,
};
use carebell_types::ScheduledDose;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the fake completion server saw and how it should answer.
#[derive(Default)]
struct Gateway {
    requests: Mutex<Vec<(Option<String>, Value)>>,
    replies: Mutex<Vec<(StatusCode, Value)>>,
}

impl Gateway {
    fn reply(&self, status: StatusCode, body: Value) {
        self.replies.lock().unwrap().push((status, body));
    }

    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

fn content(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

async fn completions(
    State(gateway): State<Arc<Gateway>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    gateway.requests.lock().unwrap().push((auth, body));

    let mut replies = gateway.replies.lock().unwrap();
    let (status, body) = if replies.is_empty() {
        (StatusCode::OK, content("default reply"))
    } else {
        replies.remove(0)
    };
    (status, Json(body))
}

async fn bridge() -> (DialogueBridge, Arc<Gateway>) {
    let gateway = Arc::new(Gateway::default());
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(gateway.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = AssistantConfig::new(format!("http://{addr}/v1/chat/completions"), "test-key");
    (DialogueBridge::new(config).unwrap(), gateway)
}

struct FixedSchedule(Vec<ScheduledDose>);

impl ReminderSource for FixedSchedule {
    async fn active_reminders(&self, limit: u32) -> Result<Vec<ScheduledDose>, AssistantError> {
        Ok(self.0.iter().take(limit as usize).cloned().collect())
    }
}

struct BrokenSchedule;

impl ReminderSource for BrokenSchedule {
    async fn active_reminders(&self, _limit: u32) -> Result<Vec<ScheduledDose>, AssistantError> {
        Err(AssistantError::Context("database is locked".to_string()))
    }
}

fn dose(name: &str, time: &str) -> ScheduledDose {
    ScheduledDose {
        name: name.to_string(),
        dose: "10mg".to_string(),
        scheduled_time: time.to_string(),
    }
}

#[tokio::test]
async fn respond_sends_persona_and_context() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::OK, content("Take your Aspirin at eight."));

    let exchange = bridge
        .respond("When is my next pill?", "Aspirin at 08:00")
        .await
        .unwrap();
    assert_eq!(exchange.reply, "Take your Aspirin at eight.");
    assert_eq!(exchange.utterance, "When is my next pill?");
    assert_eq!(exchange.context, "Aspirin at 08:00");

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "google/gemini-2.5-flash");
    assert_eq!(body["max_tokens"], 300);
    assert!((body["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    let system = messages[0]["content"].as_str().unwrap();
    assert!(system.contains("elderly users"));
    assert!(system.ends_with("Current context: Aspirin at 08:00"));
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "When is my next pill?");
}

#[tokio::test]
async fn empty_context_uses_fallback_in_prompt() {
    let (bridge, gateway) = bridge().await;
    bridge.respond("hello", "").await.unwrap();

    let (_, body) = &gateway.requests()[0];
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.ends_with("Current context: No medications scheduled right now"));
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::TOO_MANY_REQUESTS, json!({ "error": "slow down" }));

    let err = bridge.respond("hello", "").await.unwrap_err();
    assert!(matches!(err, AssistantError::RateLimited), "got {err:?}");
    assert_eq!(gateway.requests().len(), 1, "no retry");
}

#[tokio::test]
async fn payment_required_maps_to_quota_exceeded() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::PAYMENT_REQUIRED, json!({}));

    let err = bridge.respond("hello", "").await.unwrap_err();
    assert!(matches!(err, AssistantError::QuotaExceeded));
}

#[tokio::test]
async fn server_error_maps_to_unavailable() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::BAD_GATEWAY, json!({}));

    let err = bridge.respond("hello", "").await.unwrap_err();
    assert!(matches!(err, AssistantError::Unavailable(_)));
}

#[tokio::test]
async fn missing_content_is_malformed() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::OK, json!({ "choices": [] }));

    let err = bridge.respond("hello", "").await.unwrap_err();
    assert!(matches!(err, AssistantError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let bridge = DialogueBridge::new(AssistantConfig::new(format!("http://{addr}/"), "k")).unwrap();
    let err = bridge.respond("hello", "").await.unwrap_err();
    assert!(matches!(err, AssistantError::Unavailable(_)));
}

#[tokio::test]
async fn blank_utterance_is_rejected_without_a_request() {
    let (bridge, gateway) = bridge().await;
    let err = bridge.respond("   ", "ctx").await.unwrap_err();
    assert!(matches!(err, AssistantError::InvalidInput(_)));
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn context_without_reminders_is_placeholder() {
    let context = build_context(&FixedSchedule(Vec::new()), 5).await.unwrap();
    assert_eq!(context, "No medications scheduled");
}

#[tokio::test]
async fn context_honours_limit() {
    let schedule = FixedSchedule(vec![
        dose("Aspirin", "08:00"),
        dose("Metformin", "12:00"),
        dose("Statin", "21:00"),
    ]);
    assert_eq!(
        build_context(&schedule, 2).await.unwrap(),
        "Aspirin at 08:00, Metformin at 12:00"
    );
    let entries = build_context_entries(&schedule, 5).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].name, "Statin");
}

#[tokio::test]
async fn converse_builds_context_from_source() {
    let (bridge, gateway) = bridge().await;
    let schedule = FixedSchedule(vec![dose("Aspirin", "08:00")]);

    let exchange = bridge.converse(&schedule, "What do I take?").await.unwrap();
    assert_eq!(exchange.context, "Aspirin at 08:00");

    let (_, body) = &gateway.requests()[0];
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.ends_with("Current context: Aspirin at 08:00"));
}

#[tokio::test]
async fn converse_surfaces_context_failure() {
    let (bridge, gateway) = bridge().await;
    let err = bridge.converse(&BrokenSchedule, "hi").await.unwrap_err();
    assert!(matches!(err, AssistantError::Context(_)));
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn reminder_weaves_quote_into_message() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::OK, content("Every day is a gift."));
    gateway.reply(StatusCode::OK, content("Time for Aspirin, 10mg. Every day is a gift."));

    let message = bridge.compose_reminder("Aspirin", "10mg", "08:00").await.unwrap();
    assert_eq!(message.quote, "Every day is a gift.");
    assert_eq!(message.reminder, "Time for Aspirin, 10mg. Every day is a gift.");

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    let second_prompt = requests[1].1["messages"][1]["content"].as_str().unwrap();
    assert!(second_prompt.contains("Medicine: Aspirin, Dose: 10mg, Time: 08:00"));
    assert!(second_prompt.ends_with("Include this quote: Every day is a gift."));
    assert!(requests[1].1.get("max_tokens").is_none());
}

#[tokio::test]
async fn reminder_stops_after_failed_quote() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::TOO_MANY_REQUESTS, json!({}));

    let err = bridge.compose_reminder("Aspirin", "10mg", "08:00").await.unwrap_err();
    assert!(matches!(err, AssistantError::RateLimited));
    assert_eq!(gateway.requests().len(), 1);
}

#[tokio::test]
async fn summary_mentions_counts() {
    let (bridge, gateway) = bridge().await;
    gateway.reply(StatusCode::OK, content("Great job today!"));

    let summary = bridge.summarize_day(3, 1).await.unwrap();
    assert_eq!(summary, "Great job today!");

    let (_, body) = &gateway.requests()[0];
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Completed 3 reminders, Missed 1 reminders"));
}
