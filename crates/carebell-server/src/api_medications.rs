//! Medication, reminder and dose-log handlers. Every query is scoped to the
//! authenticated user.

use crate::api::{with_conn, ApiError};
use crate::middleware::UserContext;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use carebell_meds::NewMedication;
use carebell_types::{DoseStatus, Medication, ReminderLog, ReminderWithMedication};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderRequest {
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogDoseRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// Handler for `POST /api/medications`.
pub async fn create_medication_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
    Json(payload): Json<NewMedication>,
) -> Result<(StatusCode, Json<ReminderWithMedication>), ApiError> {
    let created = with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::create_medication(conn, &user.id, &payload)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for `GET /api/medications`.
pub async fn list_medications_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
) -> Result<Json<Vec<Medication>>, ApiError> {
    let medications = with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::list_medications(conn, &user.id)?)
    })
    .await?;
    Ok(Json(medications))
}

/// Handler for `GET /api/reminders`. Active reminders only, earliest first.
pub async fn list_reminders_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
) -> Result<Json<Vec<ReminderWithMedication>>, ApiError> {
    let reminders = with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::list_active_reminders(conn, &user.id, None)?)
    })
    .await?;
    Ok(Json(reminders))
}

/// Handler for `PATCH /api/reminders/{reminderId}`.
pub async fn update_reminder_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
    Path(reminder_id): Path<String>,
    Json(payload): Json<UpdateReminderRequest>,
) -> Result<Json<ReminderWithMedication>, ApiError> {
    let updated = with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::set_reminder_active(
            conn,
            &user.id,
            &reminder_id,
            payload.is_active,
        )?)
    })
    .await?;
    Ok(Json(updated))
}

/// Handler for `POST /api/reminders/{reminderId}/log`. Status defaults to
/// `completed`.
pub async fn log_dose_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
    Path(reminder_id): Path<String>,
    payload: Option<Json<LogDoseRequest>>,
) -> Result<(StatusCode, Json<ReminderLog>), ApiError> {
    let status = match payload.and_then(|Json(body)| body.status) {
        Some(raw) => raw
            .parse::<DoseStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => DoseStatus::default(),
    };

    let log = with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::record_dose(
            conn,
            &user.id,
            &reminder_id,
            status,
            chrono::Utc::now(),
        )?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(log)))
}
