//! Medication, reminder, and adherence records for Carebell.
//!
//! A medication belongs to a user; reminders schedule a medication at a time
//! of day on a set of weekdays; reminder logs record what happened to a dose;
//! daily summaries roll the logs up per day. Every function takes the acting
//! user's ID and only touches rows reachable from that user.

mod medications;
mod reminders;
mod summaries;
mod validation;

pub use medications::{create_medication, list_medications, NewMedication};
pub use reminders::{list_active_reminders, record_dose, set_reminder_active};
pub use summaries::{day_counts, get_daily_summary, upsert_daily_summary, DayCounts};
pub use validation::{
    normalize_days, normalize_time, ALL_DAYS, MAX_DOSE_LEN, MAX_INSTRUCTIONS_LEN, MAX_NAME_LEN,
};

use thiserror::Error;

/// Errors that can occur during medication operations.
#[derive(Debug, Error)]
pub enum MedsError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
}
