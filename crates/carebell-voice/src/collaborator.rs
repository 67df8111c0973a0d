//! Seams between the call controller and the outside world.
//!
//! Async methods are declared as `impl Future + Send` so a controller over
//! concrete collaborators can be held across `.await` in multi-threaded
//! runtimes such as axum handlers.

use crate::error::TransportError;
use crate::token::JoinCredential;
use carebell_types::CallRole;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Microphone capture quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioProfile {
    /// 48 kHz mono, tuned for speech.
    Speech,
    /// 48 kHz stereo at a high bitrate.
    #[default]
    HighQualityStereo,
}

/// Source of join credentials, keyed by room and role.
pub trait CredentialProvider: Send + Sync {
    fn fetch(
        &self,
        channel: &str,
        role: CallRole,
    ) -> impl Future<Output = Result<JoinCredential, TransportError>> + Send;
}

/// A local audio capture handle. Closing consumes it.
pub trait LocalAudioTrack: Send + Sync {
    /// Enables or disables sending audio without releasing the device.
    fn set_enabled(&mut self, enabled: bool)
        -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Stops capture and releases the device.
    fn close(self) -> Result<(), TransportError>;
}

/// A real-time media connection to one room.
pub trait MediaTransport: Send + Sync {
    type Track: LocalAudioTrack;

    fn join(
        &self,
        app_id: &str,
        channel: &str,
        token: &str,
        uid: u32,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn create_microphone_track(
        &self,
        profile: AudioProfile,
    ) -> impl Future<Output = Result<Self::Track, TransportError>> + Send;

    fn publish(&self, track: &Self::Track) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn leave(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Fetches join credentials from the Carebell server's token endpoint.
#[derive(Debug, Clone)]
pub struct HttpCredentialProvider {
    client: reqwest::Client,
    endpoint: String,
    session_token: String,
}

impl HttpCredentialProvider {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str, session_token: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TransportError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/voice/token", base_url.trim_end_matches('/')),
            session_token: session_token.into(),
        })
    }
}

impl CredentialProvider for HttpCredentialProvider {
    async fn fetch(&self, channel: &str, role: CallRole) -> Result<JoinCredential, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.session_token)
            .json(&serde_json::json!({ "channelName": channel, "role": role.as_str() }))
            .send()
            .await
            .map_err(|e| TransportError::new(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::new(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<JoinCredential>()
            .await
            .map_err(|e| TransportError::new(format!("malformed token response: {e}")))
    }
}
