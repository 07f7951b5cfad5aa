use crate::storage::Config;

/// Whether reminders may fire at local time `now` (`HH:MM`).
///
/// The window is `[start, end)`. A window whose start is later than its end
/// wraps past midnight, e.g. `22:00`-`03:00`. Comparison is lexical, which
/// is correct for zero-padded times.
pub fn within_work_hours(config: &Config, now: &str) -> bool {
    if !config.work_hours_enabled {
        return true;
    }
    let start = config.work_hours_start.as_str();
    let end = config.work_hours_end.as_str();
    if start <= end {
        now >= start && now < end
    } else {
        now >= start || now < end
    }
}
