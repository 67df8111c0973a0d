use crate::collaborator::AudioProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Server-side LiveKit credentials behind `POST /api/voice/token`.
///
/// The server signs a room-join token per request with `api_key` and
/// `api_secret`; `url` is returned to the caller as the credential's `appId`
/// so the client knows where to connect. Unset keys leave voice disabled
/// rather than failing startup.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    /// Lifetime of an issued join token. One day covers a long call plus
    /// late rejoins after a dropped connection.
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: 86_400,
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl_seconds = ttl.as_secs();
        self
    }

    /// Join tokens can be signed only once both halves of the key are set.
    pub fn has_signing_keys(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }
}

/// Client-side settings for [`CallController`](crate::CallController).
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// App identifier passed to the transport on join. When empty, the one
    /// returned with the join credential is used.
    pub app_id: String,
    /// Upper bound on credential acquisition plus connection setup.
    pub join_timeout: Duration,
    /// Upper bound on each teardown or mute step.
    pub control_timeout: Duration,
    /// Capture profile for the local microphone track.
    pub audio_profile: AudioProfile,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            join_timeout: Duration::from_secs(10),
            control_timeout: Duration::from_secs(5),
            audio_profile: AudioProfile::default(),
        }
    }
}

impl CallConfig {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }
}
