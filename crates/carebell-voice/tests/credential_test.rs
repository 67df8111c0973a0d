use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use carebell_types::CallRole;
use carebell_voice::{CredentialProvider, HttpCredentialProvider};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn issue(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer session-123");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "token": format!("jwt-{}-{}", body["channelName"].as_str().unwrap_or(""), body["role"].as_str().unwrap_or("")),
            "uid": 0,
            "appId": "wss://livekit.test",
            "channel": body["channelName"],
        })),
    )
}

#[tokio::test]
async fn fetches_credential_with_bearer_session() {
    let base = serve(Router::new().route("/api/voice/token", post(issue))).await;
    // A trailing slash on the base URL must not double up.
    let provider = HttpCredentialProvider::new(&format!("{base}/"), "session-123").unwrap();

    let credential = provider.fetch("room-A", CallRole::Publisher).await.unwrap();
    assert_eq!(credential.token, "jwt-room-A-publisher");
    assert_eq!(credential.app_id, "wss://livekit.test");
    assert_eq!(credential.channel, "room-A");
}

#[tokio::test]
async fn rejected_session_surfaces_status() {
    let base = serve(Router::new().route("/api/voice/token", post(issue))).await;
    let provider = HttpCredentialProvider::new(&base, "wrong").unwrap();

    let err = provider.fetch("room-A", CallRole::Publisher).await.unwrap_err();
    assert!(err.to_string().contains("401"), "{err}");
}

#[tokio::test]
async fn server_error_is_a_transport_error() {
    let app = Router::new().route(
        "/api/voice/token",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(app).await;
    let provider = HttpCredentialProvider::new(&base, "session-123").unwrap();

    let err = provider.fetch("room-A", CallRole::Publisher).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("boom"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_a_transport_error() {
    let app = Router::new().route(
        "/api/voice/token",
        post(|| async { Json(json!({ "unexpected": true })) }),
    );
    let base = serve(app).await;
    let provider = HttpCredentialProvider::new(&base, "session-123").unwrap();

    let err = provider.fetch("room-A", CallRole::Publisher).await.unwrap_err();
    assert!(err.to_string().contains("malformed"), "{err}");
}
