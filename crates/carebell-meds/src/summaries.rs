use crate::MedsError;
use carebell_types::DailySummary;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

/// Completed and missed dose counts for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayCounts {
    pub completed: u32,
    pub missed: u32,
}

/// Counts a user's completed and missed logs whose UTC timestamp falls on `date`.
pub fn day_counts(conn: &Connection, user_id: &str, date: NaiveDate) -> Result<DayCounts, MedsError> {
    let day = date.format("%Y-%m-%d").to_string();
    let (completed, missed): (u32, u32) = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN l.status = 'completed' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN l.status = 'missed' THEN 1 ELSE 0 END), 0)
         FROM reminder_logs l
         JOIN reminders r ON r.id = l.reminder_id
         JOIN medications m ON m.id = r.medication_id
         WHERE m.user_id = ?1 AND substr(l.timestamp, 1, 10) = ?2",
        params![user_id, day],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(DayCounts { completed, missed })
}

/// Inserts or replaces the summary for `(user_id, date)`.
pub fn upsert_daily_summary(conn: &Connection, summary: &DailySummary) -> Result<(), MedsError> {
    conn.execute(
        "INSERT INTO daily_summaries (user_id, date, completed_count, missed_count, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id, date) DO UPDATE SET
            completed_count = excluded.completed_count,
            missed_count = excluded.missed_count,
            notes = excluded.notes,
            updated_at = datetime('now')",
        params![
            summary.user_id,
            summary.date,
            summary.completed_count,
            summary.missed_count,
            summary.notes,
        ],
    )?;
    Ok(())
}

pub fn get_daily_summary(
    conn: &Connection,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<DailySummary>, MedsError> {
    let summary = conn
        .query_row(
            "SELECT user_id, date, completed_count, missed_count, notes
             FROM daily_summaries WHERE user_id = ?1 AND date = ?2",
            params![user_id, date.format("%Y-%m-%d").to_string()],
            |row| {
                Ok(DailySummary {
                    user_id: row.get(0)?,
                    date: row.get(1)?,
                    completed_count: row.get(2)?,
                    missed_count: row.get(3)?,
                    notes: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(summary)
}
