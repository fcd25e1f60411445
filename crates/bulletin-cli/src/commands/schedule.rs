use anyhow::Result;

use bulletin_core::{
    schedule::{Frequency, ScheduleConfig},
    storage::{Database, ScheduleRepository},
};

pub async fn show(db: &Database) -> Result<()> {
    let Some(schedule) = ScheduleRepository::new(db).get().await? else {
        println!("No schedule configured.");
        println!("\nTo set one, run:");
        println!("  bulletin schedule set --frequency weekly --day-of-week 0 --time 09:00");
        return Ok(());
    };

    let config = &schedule.config;
    println!("Schedule: {}", config.describe());
    println!("  Status: {}", if config.active { "active" } else { "inactive" });
    if let Some(last) = schedule.last_dispatched_at {
        println!("  Last scheduled send: {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("  Updated: {}", schedule.updated_at.format("%Y-%m-%d %H:%M UTC"));

    Ok(())
}

pub async fn set(
    db: &Database,
    frequency: Frequency,
    time_of_day: String,
    day_of_week: Option<u8>,
    day_of_month: Option<u8>,
    active: bool,
) -> Result<()> {
    let config = ScheduleConfig {
        frequency,
        day_of_week,
        day_of_month,
        time_of_day,
        active,
    };

    let schedule = ScheduleRepository::new(db).save(&config).await?;
    println!("Schedule saved: {}", schedule.config.describe());

    if !schedule.config.is_reachable() {
        println!("Warning: no day set, this schedule will never fire.");
    }

    Ok(())
}

pub async fn set_active(db: &Database, active: bool) -> Result<()> {
    if !ScheduleRepository::new(db).set_active(active).await? {
        println!("No schedule configured.");
        return Ok(());
    }

    if active {
        println!("Schedule enabled.");
    } else {
        println!("Schedule disabled.");
    }
    Ok(())
}
