use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::recipient::{NewRecipient, Recipient};
use crate::{Error, Result};

/// Repository for recipient CRUD operations
pub struct RecipientRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct RecipientRow {
    id: String,
    email: String,
    active: i32,
    created_at: DateTime<Utc>,
}

impl From<RecipientRow> for Recipient {
    fn from(row: RecipientRow) -> Self {
        Recipient {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            email: row.email,
            active: row.active != 0,
            created_at: row.created_at,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

impl<'a> RecipientRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Add a recipient (active by default)
    pub async fn create(&self, new_recipient: &NewRecipient) -> Result<Recipient> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO recipients (id, email, active, created_at)
            VALUES (?, ?, 1, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_recipient.email)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateRecipient(new_recipient.email.clone())
            } else {
                Error::Database(e)
            }
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::RecipientNotFound(id.to_string()))
    }

    /// Find a recipient by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipient>> {
        let row: Option<RecipientRow> = sqlx::query_as(
            r#"
            SELECT id, email, active, created_at
            FROM recipients
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Recipient::from))
    }

    /// Find a recipient by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Recipient>> {
        let row: Option<RecipientRow> = sqlx::query_as(
            r#"
            SELECT id, email, active, created_at
            FROM recipients
            WHERE email = ?
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Recipient::from))
    }

    /// All recipients in the order they were added
    pub async fn list_all(&self) -> Result<Vec<Recipient>> {
        let rows: Vec<RecipientRow> = sqlx::query_as(
            r#"
            SELECT id, email, active, created_at
            FROM recipients
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    /// Active recipients in the order they were added
    pub async fn list_active(&self) -> Result<Vec<Recipient>> {
        let rows: Vec<RecipientRow> = sqlx::query_as(
            r#"
            SELECT id, email, active, created_at
            FROM recipients
            WHERE active = 1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    /// Activate or deactivate a recipient
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE recipients SET active = ? WHERE id = ?")
            .bind(active as i32)
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a recipient. History snapshots are not touched.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipients WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count recipients (all, or active only)
    pub async fn count(&self, active_only: bool) -> Result<u32> {
        let query = if active_only {
            "SELECT COUNT(*) FROM recipients WHERE active = 1"
        } else {
            "SELECT COUNT(*) FROM recipients"
        };

        let count: (i64,) = sqlx::query_as(query).fetch_one(self.db.pool()).await?;

        Ok(count.0 as u32)
    }
}
