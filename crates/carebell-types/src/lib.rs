//! Shared record types for the Carebell platform.
//!
//! Every crate in the workspace that passes medications, reminders, dose logs,
//! or call roles across a crate boundary uses the definitions here. The
//! persistence layer maps rows into these types and the HTTP layer serializes
//! them directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned by the `FromStr` impls when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// The kind of value being parsed (e.g. "dose status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Outcome recorded against a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    /// The dose was taken.
    #[default]
    Completed,
    /// The dose was not taken.
    Missed,
    /// The user asked to be reminded again later.
    Snoozed,
}

impl DoseStatus {
    /// Returns the string stored in the database for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Snoozed => "snoozed",
        }
    }
}

impl FromStr for DoseStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "missed" => Ok(Self::Missed),
            "snoozed" => Ok(Self::Snoozed),
            other => Err(UnknownVariant {
                kind: "dose status",
                value: other.to_string(),
            }),
        }
    }
}

/// Role a participant takes when joining a voice room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallRole {
    /// May publish a local audio track.
    #[default]
    Publisher,
    /// Listen-only participant.
    Subscriber,
}

impl CallRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Subscriber => "subscriber",
        }
    }

    /// Whether participants with this role may publish media.
    pub fn can_publish(self) -> bool {
        matches!(self, Self::Publisher)
    }
}

impl FromStr for CallRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publisher" => Ok(Self::Publisher),
            "subscriber" => Ok(Self::Subscriber),
            other => Err(UnknownVariant {
                kind: "call role",
                value: other.to_string(),
            }),
        }
    }
}

/// Public view of a registered user. Never carries credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
}

/// A medication owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub dose: String,
    pub instructions: Option<String>,
    pub created_at: String,
}

/// A reminder schedule row for one medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub medication_id: String,
    /// Time of day, `HH:MM` in 24-hour form.
    pub time: String,
    /// Comma-separated ISO weekdays, 1 = Monday through 7 = Sunday.
    pub days_of_week: String,
    pub is_active: bool,
    pub created_at: String,
}

/// A reminder joined with the medication it schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderWithMedication {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub medication: Medication,
}

impl ReminderWithMedication {
    /// Projects this row into the shape the assistant context is built from.
    pub fn scheduled_dose(&self) -> ScheduledDose {
        ScheduledDose {
            name: self.medication.name.clone(),
            dose: self.medication.dose.clone(),
            scheduled_time: self.reminder.time.clone(),
        }
    }
}

/// A recorded outcome for a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderLog {
    pub id: String,
    pub reminder_id: String,
    pub status: DoseStatus,
    /// When the outcome happened (RFC 3339).
    pub timestamp: String,
}

/// Per-day adherence summary for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub user_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub completed_count: u32,
    pub missed_count: u32,
    pub notes: Option<String>,
}

/// One entry of the medication context handed to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDose {
    pub name: String,
    pub dose: String,
    pub scheduled_time: String,
}
