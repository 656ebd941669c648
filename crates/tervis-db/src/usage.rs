//! Append-only search usage log (`tervis_usage`).

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Pool, Postgres};
use tervis_core::error::AppError;
use tervis_core::models::{Identity, SearchMode, UsageRecord};
use tervis_core::traits::UsageStore;

#[derive(Clone)]
pub struct UsageRepository {
    pool: Pool<Postgres>,
}

impl UsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Counts attempts by user id or, for anonymous visitors, by session id.
    pub async fn count(
        &self,
        identity: &Identity,
        mode: SearchMode,
        day: NaiveDate,
    ) -> Result<u32, AppError> {
        let (count,): (i64,) = sqlx::query_as(count_query(identity))
            .bind(identity.key())
            .bind(mode.as_str())
            .bind(day)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub async fn insert(&self, record: &UsageRecord) -> Result<(), AppError> {
        let (user_id, session_id) = identity_columns(record);

        sqlx::query(
            r#"
            INSERT INTO tervis_usage (user_id, session_id, search_type, query, date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .bind(record.mode.as_str())
        .bind(&record.query)
        .bind(record.day)
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(())
    }
}

/// Anonymous counts skip rows written for a signed-in user, even when they
/// carry the same browser session.
fn count_query(identity: &Identity) -> &'static str {
    match identity {
        Identity::User(_) => {
            "SELECT COUNT(*) FROM tervis_usage WHERE user_id = $1 AND search_type = $2 AND date = $3"
        }
        Identity::Session(_) => {
            "SELECT COUNT(*) FROM tervis_usage WHERE session_id = $1 AND user_id IS NULL AND search_type = $2 AND date = $3"
        }
    }
}

/// `(user_id, session_id)` column values for a record.
fn identity_columns(record: &UsageRecord) -> (Option<&str>, Option<&str>) {
    match &record.identity {
        Identity::User(id) => (Some(id.as_str()), record.session_id.as_deref()),
        Identity::Session(id) => (None, Some(record.session_id.as_deref().unwrap_or(id))),
    }
}

#[async_trait]
impl UsageStore for UsageRepository {
    async fn count_attempts(
        &self,
        identity: &Identity,
        mode: SearchMode,
        day: NaiveDate,
    ) -> Result<u32, AppError> {
        self.count(identity, mode, day).await
    }

    async fn record_attempt(&self, record: &UsageRecord) -> Result<(), AppError> {
        self.insert(record).await
    }
}
