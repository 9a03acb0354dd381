//! Due date/time validation for the creation flow.
//!
//! Accepts the fixed `YYYY-MM-DD HH:mm` pattern. Components are
//! range-checked individually but days are not cross-checked against the
//! month: an overflowing day rolls into the following month, so
//! `2025-02-30 10:00` resolves to 2025-03-02 10:00. The resulting instant
//! must be strictly in the future.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Validation failures for a due date/time string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DueDateError {
    /// Input does not match `YYYY-MM-DD HH:mm`.
    #[error("expected `YYYY-MM-DD HH:mm`")]
    Pattern,

    /// A component is outside its accepted range.
    #[error("{0} out of range")]
    OutOfRange(&'static str),

    /// The instant is not strictly in the future.
    #[error("due date must be in the future")]
    InPast,
}

/// Parses and validates a due date/time relative to `now`.
///
/// Year must be exactly four digits in [2000, 2100]; month, day, and hour
/// take one or two digits; minute takes exactly two. The date and time
/// parts are separated by whitespace.
///
/// # Errors
///
/// Returns [`DueDateError::Pattern`] for shape violations,
/// [`DueDateError::OutOfRange`] naming the offending component, and
/// [`DueDateError::InPast`] when the instant is not after `now`.
pub fn parse_due(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, DueDateError> {
    let mut parts = input.split_whitespace();
    let date = parts.next().ok_or(DueDateError::Pattern)?;
    let time = parts.next().ok_or(DueDateError::Pattern)?;
    if parts.next().is_some() {
        return Err(DueDateError::Pattern);
    }

    let mut date_fields = date.split('-');
    let year = component(date_fields.next(), 4, 4)?;
    let month = component(date_fields.next(), 1, 2)?;
    let day = component(date_fields.next(), 1, 2)?;
    if date_fields.next().is_some() {
        return Err(DueDateError::Pattern);
    }

    let mut time_fields = time.split(':');
    let hour = component(time_fields.next(), 1, 2)?;
    let minute = component(time_fields.next(), 2, 2)?;
    if time_fields.next().is_some() {
        return Err(DueDateError::Pattern);
    }

    if !(2000..=2100).contains(&year) {
        return Err(DueDateError::OutOfRange("year"));
    }
    if !(1..=12).contains(&month) {
        return Err(DueDateError::OutOfRange("month"));
    }
    if !(1..=31).contains(&day) {
        return Err(DueDateError::OutOfRange("day"));
    }
    if hour > 23 {
        return Err(DueDateError::OutOfRange("hour"));
    }
    if minute > 59 {
        return Err(DueDateError::OutOfRange("minute"));
    }

    // Anchor on the first of the month, then add the day offset so that an
    // overflowing day (e.g. Feb 30) rolls into the next month instead of
    // being rejected.
    #[allow(clippy::cast_possible_wrap)]
    let due = Utc
        .with_ymd_and_hms(year as i32, month, 1, hour, minute, 0)
        .single()
        .ok_or(DueDateError::Pattern)?
        + Duration::days(i64::from(day) - 1);

    if due <= now {
        return Err(DueDateError::InPast);
    }
    Ok(due)
}

/// Parses an all-digit component with a length in `[min_len, max_len]`.
fn component(field: Option<&str>, min_len: usize, max_len: usize) -> Result<u32, DueDateError> {
    let field = field.ok_or(DueDateError::Pattern)?;
    if field.len() < min_len || field.len() > max_len {
        return Err(DueDateError::Pattern);
    }
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DueDateError::Pattern);
    }
    field.parse().map_err(|_| DueDateError::Pattern)
}
