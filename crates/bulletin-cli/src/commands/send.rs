use anyhow::{bail, Result};
use chrono::Local;

use bulletin_core::{
    dispatch::{DispatchTrigger, Dispatcher},
    scheduler::dispatch_now,
    storage::Database,
};

pub async fn run(db: &Database, dispatcher: &Dispatcher) -> Result<()> {
    println!("Sending newsletter...");

    let Some(report) = dispatch_now(db, dispatcher, DispatchTrigger::Manual, Local::now()).await?
    else {
        bail!("no active recipients");
    };

    if let Some(failure) = &report.failure {
        println!(
            "Sent to {} of {} recipients before failing.",
            report.record.sent_count,
            report.record.recipients.len()
        );
        bail!("newsletter dispatch failed: {}", failure);
    }

    println!(
        "Newsletter sent to {} recipients: {}",
        report.record.sent_count, report.record.subject
    );
    println!("History entry: {}", report.id);

    Ok(())
}
