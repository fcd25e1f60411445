use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::evaluator::parse_time_of_day;

/// Malformed schedule fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleConfigError {
    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("day of week must be 0 (Monday) to 6 (Sunday), got {0}")]
    DayOfWeekOutOfRange(u8),

    #[error("day of month must be 1 to 31, got {0}")]
    DayOfMonthOutOfRange(u8),

    #[error("unknown frequency '{0}', expected minute, daily, weekly or monthly")]
    UnknownFrequency(String),
}

/// How often the newsletter goes out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every evaluation tick
    Minute,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Minute => "minute",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ScheduleConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(Frequency::Minute),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(ScheduleConfigError::UnknownFrequency(other.to_string())),
        }
    }
}

/// Recurrence rule consulted at dispatch-decision time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub frequency: Frequency,
    /// 0 = Monday ... 6 = Sunday (weekly only)
    pub day_of_week: Option<u8>,
    /// 1..=31 (monthly only)
    pub day_of_month: Option<u8>,
    /// Local time of day as "HH:MM"
    pub time_of_day: String,
    pub active: bool,
}

impl ScheduleConfig {
    /// Check field formats and ranges.
    ///
    /// A weekly or monthly rule without its day is accepted; it simply never
    /// fires (see [`ScheduleConfig::is_reachable`]).
    pub fn validate(&self) -> Result<(), ScheduleConfigError> {
        parse_time_of_day(&self.time_of_day)?;

        if let Some(day) = self.day_of_week {
            if day > 6 {
                return Err(ScheduleConfigError::DayOfWeekOutOfRange(day));
            }
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(ScheduleConfigError::DayOfMonthOutOfRange(day));
            }
        }

        Ok(())
    }

    /// Whether the rule can ever match
    pub fn is_reachable(&self) -> bool {
        match self.frequency {
            Frequency::Minute | Frequency::Daily => true,
            Frequency::Weekly => self.day_of_week.is_some(),
            Frequency::Monthly => self.day_of_month.is_some(),
        }
    }

    /// Human readable description, e.g. "weekly on Wednesday at 09:00"
    pub fn describe(&self) -> String {
        const DAYS: [&str; 7] = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ];

        match self.frequency {
            Frequency::Minute => "every minute".to_string(),
            Frequency::Daily => format!("daily at {}", self.time_of_day),
            Frequency::Weekly => match self.day_of_week.and_then(|d| DAYS.get(d as usize)) {
                Some(day) => format!("weekly on {} at {}", day, self.time_of_day),
                None => format!("weekly at {} (no day set, never fires)", self.time_of_day),
            },
            Frequency::Monthly => match self.day_of_month {
                Some(day) => format!("monthly on day {} at {}", day, self.time_of_day),
                None => format!("monthly at {} (no day set, never fires)", self.time_of_day),
            },
        }
    }
}

/// Persisted schedule row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub config: ScheduleConfig,
    /// Watermark of the last scheduled dispatch
    pub last_dispatched_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly(day: Option<u8>) -> ScheduleConfig {
        ScheduleConfig {
            frequency: Frequency::Weekly,
            day_of_week: day,
            day_of_month: None,
            time_of_day: "09:00".to_string(),
            active: true,
        }
    }

    #[test]
    fn test_frequency_from_str() {
        assert_eq!("Daily".parse::<Frequency>(), Ok(Frequency::Daily));
        assert_eq!(" monthly ".parse::<Frequency>(), Ok(Frequency::Monthly));
        assert_eq!(
            "hourly".parse::<Frequency>(),
            Err(ScheduleConfigError::UnknownFrequency("hourly".to_string()))
        );
    }

    #[test]
    fn test_validate_ranges() {
        assert!(weekly(Some(6)).validate().is_ok());
        assert_eq!(
            weekly(Some(7)).validate(),
            Err(ScheduleConfigError::DayOfWeekOutOfRange(7))
        );

        let mut monthly = weekly(None);
        monthly.frequency = Frequency::Monthly;
        monthly.day_of_month = Some(0);
        assert_eq!(
            monthly.validate(),
            Err(ScheduleConfigError::DayOfMonthOutOfRange(0))
        );

        let mut bad_time = weekly(Some(1));
        bad_time.time_of_day = "9am".to_string();
        assert!(matches!(
            bad_time.validate(),
            Err(ScheduleConfigError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_missing_day_is_valid_but_unreachable() {
        let config = weekly(None);
        assert!(config.validate().is_ok());
        assert!(!config.is_reachable());
        assert!(weekly(Some(2)).is_reachable());
    }

    #[test]
    fn test_describe() {
        assert_eq!(weekly(Some(2)).describe(), "weekly on Wednesday at 09:00");
    }
}
