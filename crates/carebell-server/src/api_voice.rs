use crate::api::ApiError;
use crate::middleware::UserContext;
use crate::AppState;
use axum::{extract::Extension, Json};
use carebell_types::CallRole;
use carebell_voice::JoinCredential;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTokenRequest {
    pub channel_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub uid: Option<u32>,
}

/// Handler for `POST /api/voice/token`.
///
/// The participant identity is the authenticated user's id; the role
/// defaults to `publisher`.
pub async fn issue_token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
    Json(payload): Json<VoiceTokenRequest>,
) -> Result<Json<JoinCredential>, ApiError> {
    if !state.token_service.is_enabled() {
        return Err(ApiError::ServiceUnavailable(
            "voice is not configured on this server".to_string(),
        ));
    }

    let role = match payload.role.as_deref() {
        Some(raw) => raw
            .parse::<CallRole>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => CallRole::default(),
    };

    let credential = state.token_service.issue(
        &payload.channel_name,
        &user.id,
        &user.name,
        role,
        payload.uid.unwrap_or(0),
    )?;

    tracing::info!(
        user_id = %user.id,
        channel = %credential.channel,
        role = role.as_str(),
        "issued voice token"
    );
    Ok(Json(credential))
}
