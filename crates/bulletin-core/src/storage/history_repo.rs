use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::retry::with_retry;
use super::Database;
use crate::dispatch::{DispatchRecord, NewDispatchRecord};
use crate::{Error, Result};

/// Append-only repository for dispatch history
pub struct HistoryRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct HistoryRow {
    id: String,
    dispatched_at: DateTime<Utc>,
    trigger_kind: String,
    subject: String,
    content: String,
    recipients: String,
    sent_count: i64,
    status: String,
    error: Option<String>,
}

impl TryFrom<HistoryRow> for DispatchRecord {
    type Error = Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        Ok(DispatchRecord {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            dispatched_at: row.dispatched_at,
            trigger: row.trigger_kind.parse()?,
            subject: row.subject,
            content: row.content,
            recipients: serde_json::from_str(&row.recipients)?,
            sent_count: row.sent_count.max(0) as u32,
            status: row.status.parse()?,
            error: row.error,
        })
    }
}

impl<'a> HistoryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append one record; history rows are never updated afterwards
    pub async fn append(&self, record: &NewDispatchRecord) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let pool = self.db.pool().clone();
        let id_str = id.to_string();
        let recipients = serde_json::to_string(&record.recipients)?;

        with_retry(|| {
            let pool = pool.clone();
            let id_str = id_str.clone();
            let recipients = recipients.clone();
            let record = record.clone();
            async move {
                sqlx::query(
                    r#"
                    INSERT INTO dispatch_history
                    (id, dispatched_at, trigger_kind, subject, content, recipients, sent_count, status, error)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id_str)
                .bind(record.dispatched_at)
                .bind(record.trigger.as_str())
                .bind(record.subject)
                .bind(record.content)
                .bind(recipients)
                .bind(i64::from(record.sent_count))
                .bind(record.status.as_str())
                .bind(record.error)
                .execute(&pool)
                .await
                .map(|_| ())
            }
        })
        .await?;

        tracing::debug!("Recorded {} dispatch {}", record.status, id);
        Ok(id)
    }

    /// Find a record by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DispatchRecord>> {
        let row: Option<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, dispatched_at, trigger_kind, subject, content, recipients,
                   sent_count, status, error
            FROM dispatch_history
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(DispatchRecord::try_from).transpose()
    }

    /// One page of history, most recent first. `page` starts at 1.
    pub async fn list_recent(&self, page: u32, per_page: u32) -> Result<Vec<DispatchRecord>> {
        let per_page = per_page.max(1);
        let offset = i64::from(page.max(1) - 1) * i64::from(per_page);

        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, dispatched_at, trigger_kind, subject, content, recipients,
                   sent_count, status, error
            FROM dispatch_history
            ORDER BY dispatched_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(DispatchRecord::try_from).collect()
    }

    /// Total number of records
    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dispatch_history")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchStatus, DispatchTrigger};
    use chrono::Duration;

    fn record(minutes_ago: i64, status: DispatchStatus) -> NewDispatchRecord {
        NewDispatchRecord {
            dispatched_at: Utc::now() - Duration::minutes(minutes_ago),
            trigger: DispatchTrigger::Scheduled,
            subject: format!("Issue {}", minutes_ago),
            content: "<html></html>".to_string(),
            recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            sent_count: 2,
            status,
            error: match status {
                DispatchStatus::Success => None,
                DispatchStatus::Error => Some("boom".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_append_and_find() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = HistoryRepository::new(&db);

        let new = record(0, DispatchStatus::Error);
        let id = repo.append(&new).await.unwrap();

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.trigger, DispatchTrigger::Scheduled);
        assert_eq!(stored.status, DispatchStatus::Error);
        assert_eq!(stored.error.as_deref(), Some("boom"));
        assert_eq!(stored.recipients, new.recipients);
        assert_eq!(stored.sent_count, 2);
        assert_eq!(stored.subject, new.subject);
    }

    #[tokio::test]
    async fn test_list_recent_paginates_newest_first() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = HistoryRepository::new(&db);

        for minutes_ago in [30, 10, 20, 0, 40] {
            repo.append(&record(minutes_ago, DispatchStatus::Success))
                .await
                .unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 5);

        let first: Vec<String> = repo
            .list_recent(1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.subject)
            .collect();
        assert_eq!(first, vec!["Issue 0", "Issue 10"]);

        let third: Vec<String> = repo
            .list_recent(3, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.subject)
            .collect();
        assert_eq!(third, vec!["Issue 40"]);

        assert!(repo.list_recent(4, 2).await.unwrap().is_empty());
    }
}
