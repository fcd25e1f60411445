use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};
use uuid::Uuid;

use crate::dispatch::{DispatchError, DispatchOutcome, DispatchTrigger, Dispatcher, NewDispatchRecord};
use crate::schedule::{should_dispatch_now, Frequency, Schedule};
use crate::storage::{Database, HistoryRepository, RecipientRepository, ScheduleRepository};
use crate::Result;

/// A dispatch attempt that has been written to history
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub id: Uuid,
    pub record: NewDispatchRecord,
    pub failure: Option<DispatchError>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// What a single schedule evaluation did
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// No schedule, or the schedule is switched off
    Inactive,
    /// The schedule is active but does not match now
    NotDue,
    /// Due, but there was nobody to send to
    NoRecipients,
    Dispatched(DispatchReport),
}

impl TickOutcome {
    /// Short status word for cron logs
    pub fn status(&self) -> String {
        match self {
            TickOutcome::Inactive => "inactive".to_string(),
            TickOutcome::NotDue => "not-due".to_string(),
            TickOutcome::NoRecipients => "no-recipients".to_string(),
            TickOutcome::Dispatched(report) => match &report.failure {
                None => "success".to_string(),
                Some(e) => format!("error: {}", e),
            },
        }
    }
}

/// Dispatch to the current active recipients and append the attempt to
/// history. Returns `None` when there are no active recipients.
pub async fn dispatch_now(
    db: &Database,
    dispatcher: &Dispatcher,
    trigger: DispatchTrigger,
    now: DateTime<Local>,
) -> Result<Option<DispatchReport>> {
    let recipients = RecipientRepository::new(db).list_active().await?;

    match dispatcher.dispatch(&recipients, trigger, now).await {
        DispatchOutcome::NoRecipients => Ok(None),
        DispatchOutcome::Attempted { record, failure } => {
            let id = HistoryRepository::new(db).append(&record).await?;
            Ok(Some(DispatchReport {
                id,
                record,
                failure,
            }))
        }
    }
}

/// Evaluate the stored schedule against `now` and dispatch if it is due
pub async fn evaluate_and_dispatch(
    db: &Database,
    dispatcher: &Dispatcher,
    now: DateTime<Local>,
) -> Result<TickOutcome> {
    let schedule_repo = ScheduleRepository::new(db);
    let schedule = schedule_repo.get().await?;

    let Some(schedule) = schedule.filter(|s| s.config.active) else {
        return Ok(TickOutcome::Inactive);
    };

    let local_now = now.naive_local();
    if !should_dispatch_now(Some(&schedule.config), local_now)? {
        return Ok(TickOutcome::NotDue);
    }

    if already_fired(&schedule, local_now) {
        tracing::debug!("Schedule already fired this minute");
        return Ok(TickOutcome::NotDue);
    }

    tracing::info!("Schedule due: {}", schedule.config.describe());

    match dispatch_now(db, dispatcher, DispatchTrigger::Scheduled, now).await? {
        None => Ok(TickOutcome::NoRecipients),
        Some(report) => {
            // Already sent and recorded, so this only logs
            if let Err(e) = schedule_repo.mark_dispatched(now.with_timezone(&Utc)).await {
                tracing::error!("Failed to record schedule watermark: {}", e);
            }
            Ok(TickOutcome::Dispatched(report))
        }
    }
}

/// A daily, weekly or monthly schedule fires at most once per calendar minute
fn already_fired(schedule: &Schedule, now: NaiveDateTime) -> bool {
    if schedule.config.frequency == Frequency::Minute {
        return false;
    }

    match schedule.last_dispatched_at {
        Some(last) => {
            let last = last.with_timezone(&Local).naive_local();
            last.date() == now.date() && last.hour() == now.hour() && last.minute() == now.minute()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchStatus;
    use crate::mail::MailSender;
    use crate::news::{Article, ContentProvider};
    use crate::recipient::NewRecipient;
    use crate::render::{sample_articles, HtmlDocument, HtmlRenderer};
    use crate::schedule::ScheduleConfig;
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Mutex};

    struct StaticProvider(Vec<Article>);

    #[async_trait]
    impl ContentProvider for StaticProvider {
        async fn fetch(&self, _query: &str) -> Vec<Article> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        fail_for: Option<String>,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailSender for RecordingSender {
        async fn send(&self, _subject: &str, _document: &HtmlDocument, to: &str) -> Result<()> {
            self.sent.lock().unwrap().push(to.to_string());
            if self.fail_for.as_deref() == Some(to) {
                return Err(Error::Mail("connection reset".to_string()));
            }
            Ok(())
        }
    }

    fn dispatcher(articles: Vec<Article>, sender: Arc<RecordingSender>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(StaticProvider(articles)),
            Arc::new(HtmlRenderer::default()),
            sender,
            "bay area",
        )
    }

    async fn add_recipients(db: &Database, emails: &[&str]) {
        let repo = RecipientRepository::new(db);
        for email in emails {
            repo.create(&NewRecipient::parse(email).unwrap()).await.unwrap();
        }
    }

    fn daily_at(time: &str) -> ScheduleConfig {
        ScheduleConfig {
            frequency: Frequency::Daily,
            day_of_week: None,
            day_of_month: None,
            time_of_day: time.to_string(),
            active: true,
        }
    }

    fn local(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 4, 17, hour, minute, second)
            .single()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_now_records_success() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com", "b@example.com"]).await;
        let sender = Arc::new(RecordingSender::default());

        let report = dispatch_now(
            &db,
            &dispatcher(sample_articles(), sender.clone()),
            DispatchTrigger::Manual,
            Local::now(),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(report.is_success());
        assert_eq!(sender.sent.lock().unwrap().len(), 2);

        let stored = HistoryRepository::new(&db)
            .find_by_id(report.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, DispatchStatus::Success);
        assert_eq!(stored.trigger, DispatchTrigger::Manual);
        assert_eq!(stored.recipients, vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn test_dispatch_now_without_recipients_writes_nothing() {
        let db = Database::new_in_memory().await.unwrap();
        let sender = Arc::new(RecordingSender::default());

        let report = dispatch_now(
            &db,
            &dispatcher(sample_articles(), sender.clone()),
            DispatchTrigger::Manual,
            Local::now(),
        )
        .await
        .unwrap();

        assert!(report.is_none());
        assert_eq!(HistoryRepository::new(&db).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_now_records_delivery_failure() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com", "b@example.com", "c@example.com"]).await;
        let sender = Arc::new(RecordingSender {
            fail_for: Some("b@example.com".to_string()),
            ..RecordingSender::default()
        });

        let report = dispatch_now(
            &db,
            &dispatcher(sample_articles(), sender.clone()),
            DispatchTrigger::Manual,
            Local::now(),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.record.sent_count, 1);
        assert_eq!(sender.sent.lock().unwrap().len(), 2);
        assert_eq!(HistoryRepository::new(&db).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_history_snapshot_survives_recipient_edits() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com", "b@example.com", "c@example.com"]).await;
        let sender = Arc::new(RecordingSender::default());

        let report = dispatch_now(
            &db,
            &dispatcher(sample_articles(), sender),
            DispatchTrigger::Manual,
            Local::now(),
        )
        .await
        .unwrap()
        .unwrap();

        let recipients = RecipientRepository::new(&db);
        let b = recipients.find_by_email("b@example.com").await.unwrap().unwrap();
        let c = recipients.find_by_email("c@example.com").await.unwrap().unwrap();
        assert!(recipients.delete(b.id).await.unwrap());
        assert!(recipients.set_active(c.id, false).await.unwrap());

        let stored = HistoryRepository::new(&db)
            .find_by_id(report.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.recipients,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
        assert_eq!(stored.sent_count, 3);
    }

    #[tokio::test]
    async fn test_watermark_failure_keeps_dispatch_result() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com"]).await;
        ScheduleRepository::new(&db).save(&daily_at("09:00")).await.unwrap();
        sqlx::query(
            r#"
            CREATE TRIGGER reject_watermark BEFORE UPDATE OF last_dispatched_at ON schedule
            BEGIN
                SELECT RAISE(ABORT, 'watermark rejected');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();
        let sender = Arc::new(RecordingSender::default());

        let outcome = evaluate_and_dispatch(&db, &dispatcher(sample_articles(), sender.clone()), local(9, 0, 0))
            .await
            .unwrap();

        assert!(matches!(&outcome, TickOutcome::Dispatched(report) if report.is_success()));
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
        assert_eq!(HistoryRepository::new(&db).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tick_without_schedule_is_inactive() {
        let db = Database::new_in_memory().await.unwrap();
        let sender = Arc::new(RecordingSender::default());

        let outcome = evaluate_and_dispatch(&db, &dispatcher(sample_articles(), sender), local(9, 0, 0))
            .await
            .unwrap();

        assert!(matches!(outcome, TickOutcome::Inactive));
        assert_eq!(outcome.status(), "inactive");
    }

    #[tokio::test]
    async fn test_tick_not_due() {
        let db = Database::new_in_memory().await.unwrap();
        ScheduleRepository::new(&db).save(&daily_at("09:00")).await.unwrap();
        let sender = Arc::new(RecordingSender::default());

        let outcome = evaluate_and_dispatch(&db, &dispatcher(sample_articles(), sender), local(8, 59, 0))
            .await
            .unwrap();

        assert_eq!(outcome.status(), "not-due");
    }

    #[tokio::test]
    async fn test_tick_fires_once_per_minute() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com"]).await;
        ScheduleRepository::new(&db).save(&daily_at("09:00")).await.unwrap();
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = dispatcher(sample_articles(), sender.clone());

        let first = evaluate_and_dispatch(&db, &dispatcher, local(9, 0, 5)).await.unwrap();
        assert_eq!(first.status(), "success");

        let second = evaluate_and_dispatch(&db, &dispatcher, local(9, 0, 35)).await.unwrap();
        assert!(matches!(second, TickOutcome::NotDue));

        assert_eq!(sender.sent.lock().unwrap().len(), 1);
        assert_eq!(HistoryRepository::new(&db).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_minute_frequency_ignores_watermark() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com"]).await;
        let mut config = daily_at("00:00");
        config.frequency = Frequency::Minute;
        ScheduleRepository::new(&db).save(&config).await.unwrap();
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = dispatcher(sample_articles(), sender.clone());

        let now = local(13, 37, 0);
        evaluate_and_dispatch(&db, &dispatcher, now).await.unwrap();
        evaluate_and_dispatch(&db, &dispatcher, now + Duration::seconds(20))
            .await
            .unwrap();

        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_tick_due_without_recipients() {
        let db = Database::new_in_memory().await.unwrap();
        ScheduleRepository::new(&db).save(&daily_at("09:00")).await.unwrap();
        let sender = Arc::new(RecordingSender::default());

        let outcome = evaluate_and_dispatch(&db, &dispatcher(sample_articles(), sender), local(9, 0, 0))
            .await
            .unwrap();

        assert_eq!(outcome.status(), "no-recipients");
        let schedule = ScheduleRepository::new(&db).get().await.unwrap().unwrap();
        assert!(schedule.last_dispatched_at.is_none());
    }

    #[tokio::test]
    async fn test_tick_without_content_reports_error() {
        let db = Database::new_in_memory().await.unwrap();
        add_recipients(&db, &["a@example.com"]).await;
        ScheduleRepository::new(&db).save(&daily_at("09:00")).await.unwrap();
        let sender = Arc::new(RecordingSender::default());

        let outcome = evaluate_and_dispatch(&db, &dispatcher(Vec::new(), sender.clone()), local(9, 0, 0))
            .await
            .unwrap();

        assert_eq!(outcome.status(), "error: no articles found to send");
        assert!(sender.sent.lock().unwrap().is_empty());

        let history = HistoryRepository::new(&db).list_recent(1, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, DispatchStatus::Error);
        assert_eq!(history[0].trigger, DispatchTrigger::Scheduled);
    }
}
