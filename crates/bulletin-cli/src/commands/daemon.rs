use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::info;

use bulletin_core::{
    dispatch::Dispatcher,
    scheduler::{SchedulerEvent, SchedulerService},
    storage::Database,
    AppConfig,
};

/// Get the PID file path
fn pid_file_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("bulletin")
        .join("daemon.pid")
}

/// PID of a daemon that is still alive, if any
fn running_daemon() -> Option<u32> {
    let pid_path = pid_file_path();
    let mut contents = String::new();
    fs::File::open(&pid_path)
        .ok()?
        .read_to_string(&mut contents)
        .ok()?;
    let pid: u32 = contents.trim().parse().ok()?;

    #[cfg(unix)]
    {
        let alive = std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if alive {
            return Some(pid);
        }
    }

    #[cfg(not(unix))]
    {
        return Some(pid);
    }

    // Stale PID file
    let _ = fs::remove_file(&pid_path);
    None
}

fn write_pid_file() -> Result<()> {
    let pid_path = pid_file_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(&pid_path)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(pid_file_path());
}

/// Run the scheduler in the foreground until Ctrl+C
pub async fn start(db: Arc<Database>, dispatcher: Dispatcher, config: Arc<AppConfig>) -> Result<()> {
    // A second daemon would send every scheduled issue twice
    if let Some(pid) = running_daemon() {
        println!("Daemon is already running (PID: {})", pid);
        return Ok(());
    }

    write_pid_file()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SchedulerEvent::Dispatched {
                    id,
                    status,
                    sent_count,
                } => println!("Scheduled dispatch {}: {} ({} sent)", id, status, sent_count),
                SchedulerEvent::NoRecipients => {
                    println!("Scheduled dispatch skipped: no active recipients")
                }
                SchedulerEvent::Error { task, message } => {
                    println!("Scheduler error ({}): {}", task, message)
                }
            }
        }
    });

    println!(
        "Daemon started (PID: {}). Press Ctrl+C to stop.",
        std::process::id()
    );
    println!("  Tick interval: {} seconds", config.scheduler.tick_interval_secs);

    SchedulerService::new(db, dispatcher, config)
        .with_event_sender(event_tx)
        .run(shutdown_rx)
        .await;

    remove_pid_file();
    println!("Daemon stopped.");

    Ok(())
}
