use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dispatch::{DispatchStatus, Dispatcher};
use crate::storage::Database;

use super::tasks::{evaluate_and_dispatch, TickOutcome};

/// Events emitted by the scheduler
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A scheduled dispatch was attempted and recorded
    Dispatched {
        id: Uuid,
        status: DispatchStatus,
        sent_count: u32,
    },
    /// The schedule was due but nobody is subscribed
    NoRecipients,
    /// An error occurred while evaluating the schedule
    Error { task: String, message: String },
}

/// Background service that evaluates the schedule on a fixed tick
pub struct SchedulerService {
    db: Arc<Database>,
    dispatcher: Dispatcher,
    config: Arc<AppConfig>,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            dispatcher,
            config,
            event_tx: None,
        }
    }

    /// Set the event sender for dispatch notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Evaluate the schedule every tick until the shutdown signal.
    ///
    /// The first evaluation happens immediately.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let tick_secs = self.config.scheduler.tick_interval_secs.clamp(1, 60);
        info!("Scheduler started: tick={}s", tick_secs);

        let mut interval = tokio::time::interval(Duration::from_secs(tick_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Scheduler stopped");
    }

    async fn tick(&self) {
        debug!("Evaluating schedule");
        match evaluate_and_dispatch(&self.db, &self.dispatcher, Local::now()).await {
            Ok(TickOutcome::Inactive) | Ok(TickOutcome::NotDue) => {}
            Ok(TickOutcome::NoRecipients) => {
                warn!("Schedule due but there are no active recipients");
                self.send_event(SchedulerEvent::NoRecipients);
            }
            Ok(TickOutcome::Dispatched(report)) => {
                match &report.failure {
                    None => info!(
                        "Scheduled dispatch sent to {} recipients",
                        report.record.sent_count
                    ),
                    Some(e) => error!("Scheduled dispatch failed: {}", e),
                }
                self.send_event(SchedulerEvent::Dispatched {
                    id: report.id,
                    status: report.record.status,
                    sent_count: report.record.sent_count,
                });
            }
            Err(e) => {
                error!("Schedule evaluation failed: {}", e);
                self.send_event(SchedulerEvent::Error {
                    task: "dispatch".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
}
