//! Lifecycle of a single voice call.
//!
//! ```text
//! Idle --join--> Joining --connected, published--> Active --leave--> Leaving --> Idle
//!                   \--any failure, resources released--> Idle
//! ```
//!
//! The local microphone track is owned by the controller only while the call
//! is `Active`. Every operation takes the same async lock, so a `join` that
//! arrives while another is in flight waits for it and then sees the result.
//!
//! A `join` or `leave` future dropped part way through still ends `Idle`: the
//! track it held is closed on the spot and the room is left from a background
//! task, or by the next operation if that one gets the lock first.

use crate::collaborator::{CredentialProvider, LocalAudioTrack, MediaTransport};
use crate::config::CallConfig;
use crate::error::{TransportError, VoiceError};
use crate::token::JoinCredential;
use carebell_types::CallRole;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

/// Where a call is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Joining,
    Active,
    Leaving,
}

/// Observable snapshot of the controller, published on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStatus {
    pub state: ConnectionState,
    pub room_id: Option<String>,
    pub muted: bool,
}

impl CallStatus {
    fn idle() -> Self {
        Self {
            state: ConnectionState::Idle,
            room_id: None,
            muted: false,
        }
    }
}

/// The call that a successful `join` established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSession {
    pub room_id: String,
    pub uid: u32,
    pub state: ConnectionState,
    pub muted: bool,
}

/// What happened during `leave`. Failures were logged and did not stop teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveReport {
    /// The room that was left, `None` if there was no call.
    pub room_id: Option<String>,
    pub failures: Vec<String>,
}

impl LeaveReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct LiveCall<T> {
    room_id: String,
    credential: JoinCredential,
    track: T,
    muted: bool,
}

type CallSlot<T> = Arc<Mutex<Option<LiveCall<T>>>>;

/// Drives one call at a time over a credential provider and media transport.
pub struct CallController<C, M: MediaTransport> {
    credentials: C,
    transport: Arc<M>,
    config: CallConfig,
    call: CallSlot<M::Track>,
    /// Set while an interrupted join or leave still owes `transport.leave()`.
    /// Only read or written with `call` locked.
    release_pending: Arc<AtomicBool>,
    status: watch::Sender<CallStatus>,
}

impl<C, M> CallController<C, M>
where
    C: CredentialProvider,
    M: MediaTransport + 'static,
    M::Track: 'static,
{
    pub fn new(credentials: C, transport: M, config: CallConfig) -> Self {
        let (status, _) = watch::channel(CallStatus::idle());
        Self {
            credentials,
            transport: Arc::new(transport),
            config,
            call: Arc::new(Mutex::new(None)),
            release_pending: Arc::new(AtomicBool::new(false)),
            status,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn status(&self) -> CallStatus {
        self.status.borrow().clone()
    }

    pub fn is_muted(&self) -> bool {
        self.status.borrow().muted
    }

    pub fn current_room(&self) -> Option<String> {
        self.status.borrow().room_id.clone()
    }

    /// Receives every state transition from now on.
    pub fn subscribe(&self) -> watch::Receiver<CallStatus> {
        self.status.subscribe()
    }

    /// Whether a local capture track is currently held. Waits for any
    /// in-flight operation to finish.
    pub async fn has_local_track(&self) -> bool {
        self.call.lock().await.is_some()
    }

    /// The join credential of the active call, if any.
    pub async fn credential(&self) -> Option<JoinCredential> {
        self.call
            .lock()
            .await
            .as_ref()
            .map(|live| live.credential.clone())
    }

    pub fn transport(&self) -> &M {
        self.transport.as_ref()
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    /// Joins `room` as a publisher and starts sending microphone audio.
    ///
    /// # Errors
    ///
    /// - `AlreadyConnected` if a call is active; the active call is untouched.
    /// - `Credential` if the credential could not be fetched in time.
    /// - `Join` if connecting, capturing, or publishing failed. Anything
    ///   acquired up to that point has been released.
    pub async fn join(&self, room: &str) -> Result<CallSession, VoiceError> {
        let mut call = self.call.lock().await;
        self.finish_interrupted_release().await;
        if let Some(live) = call.as_ref() {
            tracing::warn!(
                room,
                active_room = %live.room_id,
                "join rejected, a call is already active"
            );
            return Err(VoiceError::AlreadyConnected {
                room: live.room_id.clone(),
            });
        }

        let room = room.trim();
        if room.is_empty() {
            return Err(VoiceError::Join("room name must not be empty".to_string()));
        }

        let deadline = Instant::now() + self.config.join_timeout;
        let credential = match tokio::time::timeout_at(
            deadline,
            self.credentials.fetch(room, CallRole::Publisher),
        )
        .await
        {
            Ok(Ok(credential)) => credential,
            Ok(Err(e)) => return Err(VoiceError::Credential(e.to_string())),
            Err(_) => {
                return Err(VoiceError::Credential(format!(
                    "timed out after {:?}",
                    self.config.join_timeout
                )))
            }
        };
        if credential.token.is_empty() {
            return Err(VoiceError::Credential("empty join token".to_string()));
        }

        let app_id = if self.config.app_id.is_empty() {
            credential.app_id.clone()
        } else {
            self.config.app_id.clone()
        };
        if app_id.is_empty() {
            return Err(VoiceError::Credential(
                "no app id configured or returned with the credential".to_string(),
            ));
        }

        self.publish_status(ConnectionState::Joining, Some(room), false);
        tracing::info!(room, uid = credential.uid, "joining voice call");

        let mut rollback = self.rollback(room);
        match self
            .connect(&app_id, room, &credential, deadline, &mut rollback)
            .await
        {
            Ok(track) => {
                rollback.disarm();
                let session = CallSession {
                    room_id: room.to_string(),
                    uid: credential.uid,
                    state: ConnectionState::Active,
                    muted: false,
                };
                *call = Some(LiveCall {
                    room_id: room.to_string(),
                    credential,
                    track,
                    muted: false,
                });
                self.publish_status(ConnectionState::Active, Some(room), false);
                tracing::info!(room, "voice call active");
                Ok(session)
            }
            Err(e) => {
                self.unwind(rollback).await;
                self.publish_status(ConnectionState::Idle, None, false);
                tracing::warn!(room, error = %e, "voice call join failed");
                Err(e)
            }
        }
    }

    /// Connects, captures, and publishes. Whatever has been acquired stays
    /// with `rollback` until the track is handed back on success.
    async fn connect(
        &self,
        app_id: &str,
        room: &str,
        credential: &JoinCredential,
        deadline: Instant,
        rollback: &mut Rollback<'_, M>,
    ) -> Result<M::Track, VoiceError> {
        bounded(
            deadline,
            self.transport
                .join(app_id, room, &credential.token, credential.uid),
        )
        .await
        .map_err(|reason| VoiceError::Join(format!("connecting to room failed: {reason}")))?;

        let track = bounded(
            deadline,
            self.transport
                .create_microphone_track(self.config.audio_profile),
        )
        .await
        .map_err(|reason| VoiceError::Join(format!("microphone capture failed: {reason}")))?;

        let track = rollback.hold_track(track);
        bounded(deadline, self.transport.publish(track))
            .await
            .map_err(|reason| VoiceError::Join(format!("publishing microphone failed: {reason}")))?;

        rollback
            .take_track()
            .ok_or_else(|| VoiceError::Join("microphone track lost during join".to_string()))
    }

    /// Closes anything `rollback` still holds and leaves the room.
    async fn unwind(&self, mut rollback: Rollback<'_, M>) {
        if let Some(track) = rollback.take_track() {
            if let Err(e) = track.close() {
                tracing::warn!(room = %rollback.room, error = %e, "failed to close microphone track during rollback");
            }
        }
        self.release_connection().await;
        rollback.disarm();
    }

    /// Closes the local track, then leaves the room. Always ends `Idle`.
    pub async fn leave(&self) -> LeaveReport {
        let mut call = self.call.lock().await;
        self.finish_interrupted_release().await;
        let Some(live) = call.take() else {
            return LeaveReport::default();
        };

        let LiveCall {
            room_id,
            track,
            muted,
            ..
        } = live;
        self.publish_status(ConnectionState::Leaving, Some(&room_id), muted);
        let rollback = self.rollback(&room_id);

        let mut failures = Vec::new();
        if let Err(e) = track.close() {
            tracing::warn!(room = %room_id, error = %e, "failed to close microphone track");
            failures.push(format!("closing microphone track: {e}"));
        }
        if let Some(failure) = self.release_connection().await {
            failures.push(failure);
        }
        rollback.disarm();

        self.publish_status(ConnectionState::Idle, None, false);
        tracing::info!(room = %room_id, clean = failures.is_empty(), "left voice call");

        LeaveReport {
            room_id: Some(room_id),
            failures,
        }
    }

    /// Flips the local track between enabled and disabled and returns the new
    /// muted flag. Without an active call nothing happens.
    pub async fn toggle_mute(&self) -> bool {
        let mut call = self.call.lock().await;
        let Some(live) = call.as_mut() else {
            return self.is_muted();
        };

        let target = !live.muted;
        match tokio::time::timeout(self.config.control_timeout, live.track.set_enabled(!target))
            .await
        {
            Ok(Ok(())) => {
                live.muted = target;
                self.publish_status(ConnectionState::Active, Some(&live.room_id), target);
                tracing::debug!(room = %live.room_id, muted = target, "toggled mute");
            }
            Ok(Err(e)) => {
                tracing::warn!(room = %live.room_id, error = %e, "failed to toggle mute");
            }
            Err(_) => {
                tracing::warn!(room = %live.room_id, "timed out toggling mute");
            }
        }
        live.muted
    }

    /// Best-effort `transport.leave()`. Returns a description of the failure.
    async fn release_connection(&self) -> Option<String> {
        release(self.transport.as_ref(), self.config.control_timeout).await
    }

    /// Leaves the room an interrupted operation was still connected to.
    /// Must be called with `call` locked.
    async fn finish_interrupted_release(&self) {
        if self.release_pending.load(Ordering::SeqCst) {
            tracing::info!("leaving room held by an interrupted call");
            self.release_connection().await;
            self.release_pending.store(false, Ordering::SeqCst);
        }
    }

    fn rollback(&self, room: &str) -> Rollback<'_, M> {
        Rollback {
            status: &self.status,
            transport: &self.transport,
            call: &self.call,
            release_pending: &self.release_pending,
            control_timeout: self.config.control_timeout,
            room: room.to_string(),
            track: None,
            armed: true,
        }
    }

    fn publish_status(&self, state: ConnectionState, room_id: Option<&str>, muted: bool) {
        self.status.send_replace(CallStatus {
            state,
            room_id: room_id.map(str::to_string),
            muted,
        });
    }
}

/// Undoes a partly built or partly torn down call unless disarmed. Dropping
/// it armed closes the held track, publishes `Idle`, and schedules
/// `transport.leave()` behind the call lock.
struct Rollback<'a, M>
where
    M: MediaTransport + 'static,
    M::Track: 'static,
{
    status: &'a watch::Sender<CallStatus>,
    transport: &'a Arc<M>,
    call: &'a CallSlot<M::Track>,
    release_pending: &'a Arc<AtomicBool>,
    control_timeout: Duration,
    room: String,
    track: Option<M::Track>,
    armed: bool,
}

impl<M> Rollback<'_, M>
where
    M: MediaTransport + 'static,
    M::Track: 'static,
{
    fn hold_track(&mut self, track: M::Track) -> &M::Track {
        self.track.insert(track)
    }

    fn take_track(&mut self) -> Option<M::Track> {
        self.track.take()
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<M> Drop for Rollback<'_, M>
where
    M: MediaTransport + 'static,
    M::Track: 'static,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(track) = self.track.take() {
            if let Err(e) = track.close() {
                tracing::warn!(room = %self.room, error = %e, "failed to close microphone track of interrupted call");
            }
        }
        self.release_pending.store(true, Ordering::SeqCst);
        self.status.send_replace(CallStatus::idle());
        tracing::warn!(room = %self.room, "voice call interrupted before it settled");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let transport = Arc::clone(self.transport);
        let call = Arc::clone(self.call);
        let pending = Arc::clone(self.release_pending);
        let timeout = self.control_timeout;
        runtime.spawn(async move {
            let _call = call.lock_owned().await;
            if pending.load(Ordering::SeqCst) {
                release(transport.as_ref(), timeout).await;
                pending.store(false, Ordering::SeqCst);
            }
        });
    }
}

async fn release<M: MediaTransport>(transport: &M, timeout: Duration) -> Option<String> {
    match tokio::time::timeout(timeout, transport.leave()).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "failed to leave room");
            Some(format!("leaving room: {e}"))
        }
        Err(_) => {
            tracing::warn!("timed out leaving room");
            Some("leaving room: timed out".to_string())
        }
    }
}

async fn bounded<T>(
    deadline: Instant,
    step: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, String> {
    match tokio::time::timeout_at(deadline, step).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("timed out".to_string()),
    }
}
