use crate::reminders::get_reminder_with_medication;
use crate::validation::{self, ALL_DAYS, MAX_DOSE_LEN, MAX_INSTRUCTIONS_LEN, MAX_NAME_LEN};
use crate::MedsError;
use carebell_types::{Medication, ReminderWithMedication};
use rusqlite::{params, Connection, Row};
use serde::Deserialize;

/// A medication together with its first reminder schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dose: String,
    #[serde(default)]
    pub instructions: Option<String>,
    /// Reminder time of day, `HH:MM`.
    pub time: String,
    /// Reminder weekdays; every day when omitted.
    #[serde(default)]
    pub days: Option<String>,
}

/// Validates and stores a medication plus an active reminder for it.
///
/// Both rows are written in one transaction: a medication is never left
/// without its reminder.
pub fn create_medication(
    conn: &Connection,
    user_id: &str,
    new: &NewMedication,
) -> Result<ReminderWithMedication, MedsError> {
    let name = validation::required("name", &new.name, MAX_NAME_LEN)?;
    let dose = validation::required("dose", &new.dose, MAX_DOSE_LEN)?;
    let instructions =
        validation::optional("instructions", new.instructions.as_deref(), MAX_INSTRUCTIONS_LEN)?;
    let time = validation::normalize_time(&new.time)?;
    let days = validation::normalize_days(new.days.as_deref().unwrap_or(ALL_DAYS))?;

    let medication_id = uuid::Uuid::new_v4().to_string();
    let reminder_id = uuid::Uuid::new_v4().to_string();

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO medications (id, user_id, name, dose, instructions) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![medication_id, user_id, name, dose, instructions],
    )?;
    tx.execute(
        "INSERT INTO reminders (id, medication_id, time, days_of_week, is_active) VALUES (?1, ?2, ?3, ?4, 1)",
        params![reminder_id, medication_id, time, days],
    )?;
    tx.commit()?;

    tracing::info!(
        user_id,
        medication_id = %medication_id,
        reminder_id = %reminder_id,
        "created medication with reminder"
    );

    get_reminder_with_medication(conn, user_id, &reminder_id)
}

/// Lists a user's medications, oldest first.
pub fn list_medications(conn: &Connection, user_id: &str) -> Result<Vec<Medication>, MedsError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, dose, instructions, created_at
         FROM medications WHERE user_id = ?1
         ORDER BY created_at ASC, name ASC",
    )?;

    let rows = stmt.query_map([user_id], |row| map_row_to_medication(row, 0))?;
    let mut medications = Vec::new();
    for row in rows {
        medications.push(row?);
    }
    Ok(medications)
}

/// Maps six medication columns starting at `offset`.
pub(crate) fn map_row_to_medication(row: &Row, offset: usize) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(offset)?,
        user_id: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        dose: row.get(offset + 3)?,
        instructions: row.get(offset + 4)?,
        created_at: row.get(offset + 5)?,
    })
}
