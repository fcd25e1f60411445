use anyhow::Result;
use chrono::Local;

use bulletin_core::{dispatch::Dispatcher, scheduler::evaluate_and_dispatch, storage::Database};

/// Prints one status word; exits with 1 only when something went wrong
pub async fn run(db: &Database, dispatcher: &Dispatcher) -> Result<()> {
    let failed = match evaluate_and_dispatch(db, dispatcher, Local::now()).await {
        Ok(outcome) => {
            let status = outcome.status();
            println!("{}", status);
            status.starts_with("error")
        }
        Err(e) => {
            println!("error: {}", e);
            true
        }
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
