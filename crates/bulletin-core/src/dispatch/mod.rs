mod dispatcher;
mod models;
mod sequence;

pub use dispatcher::Dispatcher;
pub use models::{DispatchRecord, DispatchStatus, DispatchTrigger, NewDispatchRecord, PartialDispatch};
pub use sequence::{dispatch, DispatchError, DispatchOutcome};
