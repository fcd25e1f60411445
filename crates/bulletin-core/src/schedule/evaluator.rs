use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};

use super::models::{Frequency, ScheduleConfig, ScheduleConfigError};

/// Parse a strict "HH:MM" time of day
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ScheduleConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ScheduleConfigError::InvalidTime(value.to_string()))
}

/// Decide whether a dispatch should fire at `now`.
///
/// Matching is at minute resolution and keeps no state, so callers must
/// evaluate at least once per minute or a window can be missed. A weekly or
/// monthly rule without its day never matches.
pub fn should_dispatch_now(
    config: Option<&ScheduleConfig>,
    now: NaiveDateTime,
) -> Result<bool, ScheduleConfigError> {
    let config = match config {
        Some(config) if config.active => config,
        _ => return Ok(false),
    };

    if config.frequency == Frequency::Minute {
        return Ok(true);
    }

    let at = parse_time_of_day(&config.time_of_day)?;
    let time_matches = now.hour() == at.hour() && now.minute() == at.minute();

    let day_matches = match config.frequency {
        Frequency::Minute | Frequency::Daily => true,
        Frequency::Weekly => match config.day_of_week {
            Some(day) => now.weekday().num_days_from_monday() == u32::from(day),
            None => false,
        },
        Frequency::Monthly => match config.day_of_month {
            Some(day) => now.day() == u32::from(day),
            None => false,
        },
    };

    Ok(time_matches && day_matches)
}
