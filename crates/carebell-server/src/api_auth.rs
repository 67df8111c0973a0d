//! Sign-up, sign-in and session handlers.

use crate::api::{with_conn, ApiError};
use crate::middleware::UserContext;
use crate::AppState;
use axum::{extract::Extension, http::StatusCode, Json};
use carebell_accounts::{NewUser, Session};
use carebell_types::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub user: User,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
            user: session.user,
        }
    }
}

/// Handler for `POST /api/auth/signup`. Registers and signs in in one step.
pub async fn sign_up_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let ttl = state.session_ttl;
    let session = with_conn(&state.pool, move |conn| {
        let new_user = NewUser {
            email: payload.email,
            password: payload.password,
            name: payload.name,
            phone: payload.phone,
        };
        carebell_accounts::sign_up(conn, &new_user)?;
        Ok(carebell_accounts::sign_in(conn, &new_user.email, &new_user.password, ttl)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Handler for `POST /api/auth/signin`.
pub async fn sign_in_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let ttl = state.session_ttl;
    let session = with_conn(&state.pool, move |conn| {
        Ok(carebell_accounts::sign_in(
            conn,
            &payload.email,
            &payload.password,
            ttl,
        )?)
    })
    .await?;

    Ok(Json(session.into()))
}

/// Handler for `POST /api/auth/signout`. Ends the session that authenticated
/// the request.
pub async fn sign_out_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<StatusCode, ApiError> {
    let UserContext { user, token } = ctx;
    with_conn(&state.pool, move |conn| {
        Ok(carebell_accounts::sign_out(conn, &token)?)
    })
    .await?;
    tracing::info!(user_id = %user.id, "user signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `GET /api/auth/me`.
pub async fn me_handler(Extension(ctx): Extension<UserContext>) -> Json<User> {
    Json(ctx.user)
}
