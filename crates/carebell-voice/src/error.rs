use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// The join credential could not be obtained.
    #[error("could not obtain join credential: {0}")]
    Credential(String),

    /// Connecting, capturing, or publishing failed after a credential was
    /// obtained. Partial resources have already been released.
    #[error("failed to join call: {0}")]
    Join(String),

    #[error("already connected to room '{room}'")]
    AlreadyConnected { room: String },

    #[error("invalid voice configuration: {0}")]
    Config(String),

    #[error("LiveKit token error: {0}")]
    Token(#[from] livekit_api::access_token::AccessTokenError),
}

/// Failure reported by a credential or media collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
