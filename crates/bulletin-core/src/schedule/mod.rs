mod evaluator;
mod models;

pub use evaluator::{parse_time_of_day, should_dispatch_now};
pub use models::{Frequency, Schedule, ScheduleConfig, ScheduleConfigError};
