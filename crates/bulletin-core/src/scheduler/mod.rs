mod service;
pub mod tasks;

pub use service::{SchedulerEvent, SchedulerService};
pub use tasks::{dispatch_now, evaluate_and_dispatch, DispatchReport, TickOutcome};
