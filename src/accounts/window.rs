//! Date handling for inactive account sweeps.

use chrono::{DateTime, NaiveTime, Utc};

use crate::error::{FxaError, Result};

/// Truncate a millisecond timestamp to midnight UTC of the same day.
///
/// # Errors
///
/// Returns `FxaError::BadRequest` if the timestamp is outside the range chrono
/// can represent.
pub fn set_date_to_utc(timestamp_ms: i64) -> Result<DateTime<Utc>> {
    let date = DateTime::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
        FxaError::bad_request(format!("timestamp out of range: {}", timestamp_ms))
    })?;

    Ok(date.date_naive().and_time(NaiveTime::MIN).and_utc())
}

/// The account population an inactive account sweep looks at.
///
/// Accounts created in `[start, end)` are candidates; any activity on or after
/// `active_by` makes an account active. All three bounds are midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactiveAccountWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub active_by: DateTime<Utc>,
}

impl InactiveAccountWindow {
    /// Build a window from millisecond timestamps, normalising each to midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns `FxaError::BadRequest` if a timestamp is out of range or the
    /// range is empty after normalisation.
    pub fn new(start_ms: i64, end_ms: i64, active_by_ms: i64) -> Result<Self> {
        let window = Self {
            start: set_date_to_utc(start_ms)?,
            end: set_date_to_utc(end_ms)?,
            active_by: set_date_to_utc(active_by_ms)?,
        };

        if window.start >= window.end {
            return Err(FxaError::bad_request(format!(
                "start date {} must be before end date {}",
                window.start.date_naive(),
                window.end.date_naive()
            )));
        }

        Ok(window)
    }

    #[must_use]
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    #[must_use]
    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    #[must_use]
    pub fn active_by_ms(&self) -> i64 {
        self.active_by.timestamp_millis()
    }

    /// Check if an account created at `created_at_ms` falls in the window.
    #[must_use]
    pub fn contains(&self, created_at_ms: i64) -> bool {
        created_at_ms >= self.start_ms() && created_at_ms < self.end_ms()
    }
}
