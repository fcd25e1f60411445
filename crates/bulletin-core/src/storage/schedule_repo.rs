use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::retry::with_retry;
use super::Database;
use crate::schedule::{Frequency, Schedule, ScheduleConfig};
use crate::{Error, Result};

/// Repository for the single schedule row
pub struct ScheduleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ScheduleRow {
    frequency: String,
    day_of_week: Option<i64>,
    day_of_month: Option<i64>,
    time_of_day: String,
    active: i32,
    last_dispatched_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = Error;

    fn try_from(row: ScheduleRow) -> Result<Self> {
        let day = |value: Option<i64>| value.and_then(|v| u8::try_from(v).ok());

        Ok(Schedule {
            config: ScheduleConfig {
                frequency: row.frequency.parse::<Frequency>()?,
                day_of_week: day(row.day_of_week),
                day_of_month: day(row.day_of_month),
                time_of_day: row.time_of_day,
                active: row.active != 0,
            },
            last_dispatched_at: row.last_dispatched_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> ScheduleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load the schedule, if one has been configured
    pub async fn get(&self) -> Result<Option<Schedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            r#"
            SELECT frequency, day_of_week, day_of_month, time_of_day, active,
                   last_dispatched_at, updated_at
            FROM schedule
            WHERE id = 1
            "#,
        )
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Schedule::try_from).transpose()
    }

    /// Replace the schedule wholesale after validating it.
    ///
    /// The dispatch watermark survives the update.
    pub async fn save(&self, config: &ScheduleConfig) -> Result<Schedule> {
        config.validate()?;

        let pool = self.db.pool().clone();
        let frequency = config.frequency.as_str();
        let day_of_week = config.day_of_week.map(i64::from);
        let day_of_month = config.day_of_month.map(i64::from);
        let time_of_day = config.time_of_day.trim().to_string();
        let active = config.active as i32;

        with_retry(|| {
            let pool = pool.clone();
            let time_of_day = time_of_day.clone();
            async move {
                sqlx::query(
                    r#"
                    INSERT INTO schedule (id, frequency, day_of_week, day_of_month, time_of_day, active, updated_at)
                    VALUES (1, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        frequency = excluded.frequency,
                        day_of_week = excluded.day_of_week,
                        day_of_month = excluded.day_of_month,
                        time_of_day = excluded.time_of_day,
                        active = excluded.active,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(frequency)
                .bind(day_of_week)
                .bind(day_of_month)
                .bind(time_of_day)
                .bind(active)
                .bind(Utc::now())
                .execute(&pool)
                .await
                .map(|_| ())
            }
        })
        .await?;

        tracing::info!("Schedule updated: {}", config.describe());

        self.get()
            .await?
            .ok_or_else(|| Error::Other("schedule missing after save".to_string()))
    }

    /// Toggle the schedule on or off. Returns false when no schedule exists.
    pub async fn set_active(&self, active: bool) -> Result<bool> {
        let pool = self.db.pool().clone();

        let affected = with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query("UPDATE schedule SET active = ?, updated_at = ? WHERE id = 1")
                    .bind(active as i32)
                    .bind(Utc::now())
                    .execute(&pool)
                    .await
                    .map(|r| r.rows_affected())
            }
        })
        .await?;

        Ok(affected > 0)
    }

    /// Record that a scheduled dispatch fired at `at`
    pub async fn mark_dispatched(&self, at: DateTime<Utc>) -> Result<()> {
        let pool = self.db.pool().clone();

        with_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query("UPDATE schedule SET last_dispatched_at = ? WHERE id = 1")
                    .bind(at)
                    .execute(&pool)
                    .await
                    .map(|_| ())
            }
        })
        .await?;

        Ok(())
    }
}
