use carebell_types::CallRole;
use carebell_voice::{LiveKitConfig, TokenService, VoiceError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;

const URL: &str = "wss://livekit.carebell.test";
const KEY: &str = "devkey";
const SECRET: &str = "secret-that-is-long-enough-for-hs256";

#[derive(Deserialize)]
struct Claims {
    sub: String,
    name: String,
    iss: String,
    exp: usize,
    nbf: usize,
    video: VideoClaims,
}

#[derive(Deserialize)]
struct VideoClaims {
    #[serde(rename = "roomJoin")]
    room_join: bool,
    room: String,
    #[serde(rename = "canPublish")]
    can_publish: bool,
    #[serde(rename = "canSubscribe")]
    can_subscribe: bool,
    #[serde(rename = "canPublishData")]
    can_publish_data: bool,
}

fn service() -> TokenService {
    TokenService::new(LiveKitConfig::new(URL, KEY, SECRET))
}

fn claims(token: &str) -> Claims {
    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(SECRET.as_bytes());
    decode::<Claims>(token, &key, &validation)
        .expect("token should verify with the API secret")
        .claims
}

#[test]
fn publisher_token_grants_publish_and_subscribe() {
    let credential = service()
        .issue("room-A", "user-1", "Ada", CallRole::Publisher, 7)
        .unwrap();

    assert_eq!(credential.uid, 7);
    assert_eq!(credential.app_id, URL);
    assert_eq!(credential.channel, "room-A");

    let claims = claims(&credential.token);
    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.name, "Ada");
    assert_eq!(claims.iss, KEY);
    assert!(claims.video.room_join);
    assert_eq!(claims.video.room, "room-A");
    assert!(claims.video.can_publish);
    assert!(claims.video.can_publish_data);
    assert!(claims.video.can_subscribe);
}

#[test]
fn subscriber_token_cannot_publish() {
    let credential = service()
        .issue("room-A", "user-2", "Grace", CallRole::Subscriber, 0)
        .unwrap();

    let claims = claims(&credential.token);
    assert!(!claims.video.can_publish);
    assert!(!claims.video.can_publish_data);
    assert!(claims.video.can_subscribe);
}

#[test]
fn token_expires_after_configured_ttl() {
    let config = LiveKitConfig::new(URL, KEY, SECRET).with_token_ttl(Duration::from_secs(600));
    let credential = TokenService::new(config)
        .issue("room-A", "user-1", "Ada", CallRole::Publisher, 0)
        .unwrap();

    let claims = claims(&credential.token);
    let lifetime = claims.exp - claims.nbf;
    assert!((590..=610).contains(&lifetime), "lifetime was {lifetime}");
}

#[test]
fn channel_is_trimmed() {
    let credential = service()
        .issue("  room-A  ", "user-1", "Ada", CallRole::Publisher, 0)
        .unwrap();
    assert_eq!(credential.channel, "room-A");
    assert_eq!(claims(&credential.token).video.room, "room-A");
}

#[test]
fn blank_channel_is_rejected() {
    let err = service()
        .issue("   ", "user-1", "Ada", CallRole::Publisher, 0)
        .unwrap_err();
    assert!(matches!(err, VoiceError::Config(_)));
}

#[test]
fn missing_credentials_disable_the_service() {
    let service = TokenService::new(LiveKitConfig::new(URL, KEY, ""));
    assert!(!service.is_enabled());

    let err = service
        .issue("room-A", "user-1", "Ada", CallRole::Publisher, 0)
        .unwrap_err();
    assert!(matches!(err, VoiceError::Config(_)));
    assert!(!TokenService::new(LiveKitConfig::default()).is_enabled());
}

#[test]
fn config_debug_redacts_secret() {
    let rendered = format!("{:?}", LiveKitConfig::new(URL, KEY, SECRET));
    assert!(!rendered.contains(SECRET));
    assert!(rendered.contains("[REDACTED]"));
}
