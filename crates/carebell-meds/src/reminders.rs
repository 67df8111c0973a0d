use crate::medications::map_row_to_medication;
use crate::MedsError;
use carebell_types::{DoseStatus, Reminder, ReminderLog, ReminderWithMedication};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const JOINED_COLUMNS: &str = "r.id, r.medication_id, r.time, r.days_of_week, r.is_active, r.created_at,
     m.id, m.user_id, m.name, m.dose, m.instructions, m.created_at";

fn map_row_to_joined(row: &Row) -> rusqlite::Result<ReminderWithMedication> {
    Ok(ReminderWithMedication {
        reminder: Reminder {
            id: row.get(0)?,
            medication_id: row.get(1)?,
            time: row.get(2)?,
            days_of_week: row.get(3)?,
            is_active: row.get(4)?,
            created_at: row.get(5)?,
        },
        medication: map_row_to_medication(row, 6)?,
    })
}

pub(crate) fn get_reminder_with_medication(
    conn: &Connection,
    user_id: &str,
    reminder_id: &str,
) -> Result<ReminderWithMedication, MedsError> {
    conn.query_row(
        &format!(
            "SELECT {JOINED_COLUMNS}
             FROM reminders r JOIN medications m ON m.id = r.medication_id
             WHERE r.id = ?1 AND m.user_id = ?2"
        ),
        params![reminder_id, user_id],
        map_row_to_joined,
    )
    .optional()?
    .ok_or_else(|| MedsError::NotFound(format!("reminder {reminder_id}")))
}

/// Lists a user's active reminders joined with their medications, earliest
/// time of day first, at most `limit` rows when given.
pub fn list_active_reminders(
    conn: &Connection,
    user_id: &str,
    limit: Option<u32>,
) -> Result<Vec<ReminderWithMedication>, MedsError> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(i64::from).unwrap_or(-1);

    let mut stmt = conn.prepare(&format!(
        "SELECT {JOINED_COLUMNS}
         FROM reminders r JOIN medications m ON m.id = r.medication_id
         WHERE m.user_id = ?1 AND r.is_active = 1
         ORDER BY r.time ASC, m.name ASC, r.id ASC
         LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![user_id, limit], map_row_to_joined)?;
    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(row?);
    }
    Ok(reminders)
}

/// Turns a reminder on or off.
pub fn set_reminder_active(
    conn: &Connection,
    user_id: &str,
    reminder_id: &str,
    active: bool,
) -> Result<ReminderWithMedication, MedsError> {
    let updated = conn.execute(
        "UPDATE reminders SET is_active = ?1
         WHERE id = ?2 AND medication_id IN (SELECT id FROM medications WHERE user_id = ?3)",
        params![active, reminder_id, user_id],
    )?;
    if updated == 0 {
        return Err(MedsError::NotFound(format!("reminder {reminder_id}")));
    }
    get_reminder_with_medication(conn, user_id, reminder_id)
}

/// Records the outcome of a dose against one of the user's reminders.
pub fn record_dose(
    conn: &Connection,
    user_id: &str,
    reminder_id: &str,
    status: DoseStatus,
    at: DateTime<Utc>,
) -> Result<ReminderLog, MedsError> {
    // Ownership check; NotFound for reminders of other users as well.
    get_reminder_with_medication(conn, user_id, reminder_id)?;

    let log = ReminderLog {
        id: uuid::Uuid::new_v4().to_string(),
        reminder_id: reminder_id.to_string(),
        status,
        timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    conn.execute(
        "INSERT INTO reminder_logs (id, reminder_id, status, timestamp) VALUES (?1, ?2, ?3, ?4)",
        params![log.id, log.reminder_id, log.status.as_str(), log.timestamp],
    )?;

    tracing::debug!(user_id, reminder_id, status = status.as_str(), "recorded dose");

    Ok(log)
}
