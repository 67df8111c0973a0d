use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use carebell_types::CallRole;
use livekit_api::access_token::{AccessToken, VideoGrants};
use serde::{Deserialize, Serialize};

/// Everything a client needs to join a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCredential {
    pub token: String,
    #[serde(default)]
    pub uid: u32,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub channel: String,
}

/// Signs LiveKit join tokens for authenticated users.
#[derive(Debug, Clone)]
pub struct TokenService {
    config: LiveKitConfig,
}

impl TokenService {
    pub fn new(config: LiveKitConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.has_signing_keys()
    }

    pub fn app_id(&self) -> &str {
        &self.config.url
    }

    /// Issues a credential for `identity` to join `channel` with `role`.
    ///
    /// Publishers get publish rights; every role may subscribe. `uid` is the
    /// caller-chosen numeric participant id and is echoed back unchanged.
    pub fn issue(
        &self,
        channel: &str,
        identity: &str,
        display_name: &str,
        role: CallRole,
        uid: u32,
    ) -> Result<JoinCredential, VoiceError> {
        if !self.is_enabled() {
            return Err(VoiceError::Config(
                "LiveKit API key and secret are not configured".to_string(),
            ));
        }
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(VoiceError::Config("channel name must not be empty".to_string()));
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_name(display_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: channel.to_string(),
                can_publish: role.can_publish(),
                can_subscribe: true,
                can_publish_data: role.can_publish(),
                ..Default::default()
            })
            .with_ttl(self.config.token_ttl())
            .to_jwt()?;

        tracing::debug!(
            channel,
            identity,
            role = role.as_str(),
            ttl_seconds = self.config.token_ttl_seconds,
            "issued join token"
        );

        Ok(JoinCredential {
            token,
            uid,
            app_id: self.config.url.clone(),
            channel: channel.to_string(),
        })
    }
}
