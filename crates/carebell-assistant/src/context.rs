use crate::error::AssistantError;
use carebell_types::ScheduledDose;
use std::future::Future;

/// Returned by [`build_context`] when the user has nothing scheduled.
pub const NO_MEDICATIONS: &str = "No medications scheduled";

/// Read access to one user's active reminders.
///
/// Implementations return at most `limit` entries, earliest scheduled time
/// first.
pub trait ReminderSource: Send + Sync {
    fn active_reminders(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ScheduledDose>, AssistantError>> + Send;
}

pub async fn build_context_entries<S: ReminderSource>(
    source: &S,
    limit: u32,
) -> Result<Vec<ScheduledDose>, AssistantError> {
    let mut entries = source.active_reminders(limit).await?;
    entries.truncate(limit as usize);
    Ok(entries)
}

/// Renders up to `limit` active reminders as `"<name> at <time>"`, comma
/// separated.
pub async fn build_context<S: ReminderSource>(
    source: &S,
    limit: u32,
) -> Result<String, AssistantError> {
    let entries = build_context_entries(source, limit).await?;
    Ok(render(&entries))
}

pub(crate) fn render(entries: &[ScheduledDose]) -> String {
    if entries.is_empty() {
        return NO_MEDICATIONS.to_string();
    }
    entries
        .iter()
        .map(|e| format!("{} at {}", e.name, e.scheduled_time))
        .collect::<Vec<_>>()
        .join(", ")
}
