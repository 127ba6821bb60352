//! Daily activity streaks.

use chrono::NaiveDate;

/// Compute the streak after activity on `today`.
///
/// Activity on consecutive days extends the streak, a second activity on the
/// same day keeps it, and any gap resets it to one.
pub fn next_streak(last_active: Option<NaiveDate>, current: i32, today: NaiveDate) -> i32 {
    match last_active {
        Some(last) if last == today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current + 1,
        _ => 1,
    }
}
