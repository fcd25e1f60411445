use anyhow::{Context, Result};
use uuid::Uuid;

use bulletin_core::{
    dispatch::DispatchRecord,
    storage::{Database, HistoryRepository},
    Error,
};

pub async fn list(db: &Database, page: u32, per_page: u32) -> Result<()> {
    let repo = HistoryRepository::new(db);
    let total = repo.count().await?;
    let records = repo.list_recent(page, per_page).await?;

    if records.is_empty() {
        if total == 0 {
            println!("No dispatches yet.");
        } else {
            println!("Page {} is empty ({} dispatches in total).", page, total);
        }
        return Ok(());
    }

    let pages = total.div_ceil(per_page.max(1));
    println!("Dispatch history (page {} of {}, {} total):\n", page.max(1), pages, total);

    for record in &records {
        println!(
            "  {}  {}  {:<9}  {:<7}  {}/{} sent",
            record.id,
            record.dispatched_at.format("%Y-%m-%d %H:%M"),
            record.trigger.as_str(),
            record.status.as_str(),
            record.sent_count,
            record.recipients.len()
        );
        if let Some(error) = &record.error {
            println!("      {}", error);
        }
    }

    Ok(())
}

pub async fn show(db: &Database, id: &str) -> Result<()> {
    let id = Uuid::parse_str(id.trim()).with_context(|| format!("invalid history id '{}'", id))?;

    let record = HistoryRepository::new(db)
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

    print_record(&record);
    Ok(())
}

fn print_record(record: &DispatchRecord) {
    println!("Dispatch {}", record.id);
    println!("  When:    {}", record.dispatched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Trigger: {}", record.trigger);
    println!("  Status:  {}", record.status);
    if let Some(error) = &record.error {
        println!("  Error:   {}", error);
    }
    println!("  Subject: {}", record.subject);
    println!(
        "  Sent:    {} of {}",
        record.sent_count,
        record.recipients.len()
    );
    for address in &record.recipients {
        println!("    - {}", address);
    }

    if !record.content.is_empty() {
        println!("\n{}", record.content);
    }
}
