//! Assistant chat, spoken reminders and the daily summary.

use crate::api::{with_conn, ApiError};
use crate::middleware::UserContext;
use crate::AppState;
use axum::{extract::Extension, Json};
use carebell_assistant::{AssistantError, ReminderMessage, ReminderSource};
use carebell_db::DbPool;
use carebell_types::{DailySummary, ReminderWithMedication, ScheduledDose};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One user's active reminders, read from the database.
#[derive(Clone)]
pub struct PoolReminderSource {
    pool: DbPool,
    user_id: String,
}

impl PoolReminderSource {
    pub fn new(pool: DbPool, user_id: impl Into<String>) -> Self {
        Self {
            pool,
            user_id: user_id.into(),
        }
    }
}

impl ReminderSource for PoolReminderSource {
    async fn active_reminders(&self, limit: u32) -> Result<Vec<ScheduledDose>, AssistantError> {
        let pool = self.pool.clone();
        let user_id = self.user_id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AssistantError::Context(e.to_string()))?;
            let rows = carebell_meds::list_active_reminders(&conn, &user_id, Some(limit))
                .map_err(|e| AssistantError::Context(e.to_string()))?;
            Ok(rows.iter().map(ReminderWithMedication::scheduled_dose).collect())
        })
        .await
        .map_err(|e| AssistantError::Context(e.to_string()))?
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Client-built context. Built from the user's reminders when absent.
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub context: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub medicine_name: String,
    pub dose: String,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: String,
    pub completed_count: u32,
    pub missed_count: u32,
}

fn ensure_enabled(state: &AppState) -> Result<(), ApiError> {
    if state.bridge.config().is_enabled() {
        Ok(())
    } else {
        Err(ApiError::ServiceUnavailable(
            "assistant is not configured on this server".to_string(),
        ))
    }
}

/// Handler for `POST /api/assistant/chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    ensure_enabled(&state)?;

    let exchange = match payload.context.filter(|c| !c.trim().is_empty()) {
        Some(context) => state.bridge.respond(&payload.message, &context).await?,
        None => {
            let source = PoolReminderSource::new(state.pool.clone(), user.id.clone());
            state.bridge.converse(&source, &payload.message).await?
        }
    };

    tracing::info!(user_id = %user.id, "assistant replied");
    Ok(Json(ChatResponse {
        message: exchange.reply,
        context: exchange.context,
    }))
}

/// Handler for `POST /api/assistant/reminder`.
pub async fn reminder_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
    Json(payload): Json<ReminderRequest>,
) -> Result<Json<ReminderMessage>, ApiError> {
    ensure_enabled(&state)?;

    let message = state
        .bridge
        .compose_reminder(&payload.medicine_name, &payload.dose, &payload.time)
        .await?;
    tracing::debug!(user_id = %user.id, medicine = %payload.medicine_name, "composed reminder");
    Ok(Json(message))
}

/// Handler for `POST /api/assistant/summary`.
///
/// Counts today's (UTC) completed and missed doses, asks the assistant for an
/// encouraging summary and stores it as today's daily summary.
pub async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(UserContext { user, .. }): Extension<UserContext>,
) -> Result<Json<SummaryResponse>, ApiError> {
    ensure_enabled(&state)?;

    let today = chrono::Utc::now().date_naive();
    let user_id = user.id.clone();
    let counts = with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::day_counts(conn, &user_id, today)?)
    })
    .await?;

    let summary = state
        .bridge
        .summarize_day(counts.completed, counts.missed)
        .await?;

    let record = DailySummary {
        user_id: user.id.clone(),
        date: today.format("%Y-%m-%d").to_string(),
        completed_count: counts.completed,
        missed_count: counts.missed,
        notes: Some(summary.clone()),
    };
    with_conn(&state.pool, move |conn| {
        Ok(carebell_meds::upsert_daily_summary(conn, &record)?)
    })
    .await?;

    tracing::info!(
        user_id = %user.id,
        completed = counts.completed,
        missed = counts.missed,
        "stored daily summary"
    );
    Ok(Json(SummaryResponse {
        summary,
        completed_count: counts.completed,
        missed_count: counts.missed,
    }))
}
