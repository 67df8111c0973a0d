//! Input rules for medication and reminder fields.

use crate::MedsError;
use chrono::NaiveTime;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DOSE_LEN: usize = 50;
pub const MAX_INSTRUCTIONS_LEN: usize = 500;

/// Every weekday, the default reminder schedule.
pub const ALL_DAYS: &str = "1,2,3,4,5,6,7";

pub(crate) fn required(field: &str, value: &str, max: usize) -> Result<String, MedsError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MedsError::Invalid(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(MedsError::Invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

pub(crate) fn optional(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, MedsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() > max => Err(MedsError::Invalid(format!(
            "{field} must be at most {max} characters"
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Parses a time of day and returns it as zero-padded `HH:MM`.
///
/// Accepts `H:MM`, `HH:MM` and `HH:MM:SS` (seconds are dropped).
pub fn normalize_time(time: &str) -> Result<String, MedsError> {
    let time = time.trim();
    let parsed = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| MedsError::Invalid(format!("time must be HH:MM, got '{time}'")))?;
    Ok(parsed.format("%H:%M").to_string())
}

/// Parses a comma-separated weekday list (1 = Monday .. 7 = Sunday) into a
/// sorted, de-duplicated canonical form.
pub fn normalize_days(days: &str) -> Result<String, MedsError> {
    let mut parsed = Vec::new();
    for part in days.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<u8>() {
            Ok(day @ 1..=7) => parsed.push(day),
            _ => {
                return Err(MedsError::Invalid(format!(
                    "days must be numbers 1-7, got '{part}'"
                )))
            }
        }
    }
    if parsed.is_empty() {
        return Err(MedsError::Invalid("days are required".to_string()));
    }
    parsed.sort_unstable();
    parsed.dedup();

    Ok(parsed
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(","))
}
