//! Calendar helpers for expiry dates.

use chrono::NaiveDate;

/// Days from `today` until `date`; negative once the date has passed.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Whether `date` is today or later.
pub fn is_future_or_today(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}
