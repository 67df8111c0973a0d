//! Voice calls for Carebell.
//!
//! Two halves live here. On the server, [`TokenService`] issues short-lived
//! LiveKit join credentials for a room. On the client, [`CallController`]
//! owns the lifecycle of a single call: it fetches a credential, connects to
//! the room, captures and publishes the microphone, toggles mute, and tears
//! everything down again.
//!
//! The controller does not talk to a media SDK directly. It drives the
//! [`CredentialProvider`] and [`MediaTransport`] traits, so any real-time
//! audio stack that can join, publish, mute and leave can sit underneath it.

pub mod collaborator;
pub mod config;
pub mod controller;
pub mod error;
pub mod token;

pub use collaborator::{
    AudioProfile, CredentialProvider, HttpCredentialProvider, LocalAudioTrack, MediaTransport,
};
pub use config::{CallConfig, LiveKitConfig};
pub use controller::{CallController, CallSession, CallStatus, ConnectionState, LeaveReport};
pub use error::{TransportError, VoiceError};
pub use token::{JoinCredential, TokenService};
