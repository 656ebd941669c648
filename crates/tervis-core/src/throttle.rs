//! Daily search ceilings per identity.
//!
//! Advisory cost control for the model backend, not an authorization
//! mechanism. Counting and recording are two separate store calls, so two
//! concurrent attempts from the same identity can both pass at the ceiling.
//! Days are UTC calendar dates.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ThrottleConfig;
use crate::error::AppError;
use crate::models::{Identity, SearchMode, UsageRecord};
use crate::traits::UsageStore;

/// Result of one throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrottleDecision {
    pub allowed: bool,
    /// Attempts counted today, including this one when it was allowed.
    pub used: u32,
    pub limit: u32,
}

#[derive(Clone)]
pub struct UsageThrottle {
    store: Arc<dyn UsageStore>,
    text_limit: u32,
    voice_limit: u32,
}

impl UsageThrottle {
    pub fn new(store: Arc<dyn UsageStore>, config: &ThrottleConfig) -> Self {
        Self {
            store,
            text_limit: config.text_daily_limit,
            voice_limit: config.voice_daily_limit,
        }
    }

    pub fn limit_for(&self, mode: SearchMode) -> u32 {
        match mode {
            SearchMode::Text => self.text_limit,
            SearchMode::Voice => self.voice_limit,
        }
    }

    /// Checks today's (UTC) count and records the attempt when allowed.
    pub async fn check_and_record(
        &self,
        identity: &Identity,
        session_id: Option<&str>,
        mode: SearchMode,
        query: &str,
    ) -> Result<ThrottleDecision, AppError> {
        self.check_and_record_on(identity, session_id, mode, query, Utc::now().date_naive())
            .await
    }

    /// Same as [`check_and_record`](Self::check_and_record) for an explicit day.
    pub async fn check_and_record_on(
        &self,
        identity: &Identity,
        session_id: Option<&str>,
        mode: SearchMode,
        query: &str,
        day: NaiveDate,
    ) -> Result<ThrottleDecision, AppError> {
        let limit = self.limit_for(mode);
        let used = self.store.count_attempts(identity, mode, day).await?;

        if used >= limit {
            info!(
                "Daily {} limit reached for {} ({}/{})",
                mode,
                identity.key(),
                used,
                limit
            );
            return Ok(ThrottleDecision {
                allowed: false,
                used,
                limit,
            });
        }

        let record = UsageRecord {
            identity: identity.clone(),
            session_id: session_id.map(str::to_string),
            mode,
            query: query.to_string(),
            day,
        };
        self.store.record_attempt(&record).await?;
        debug!("Recorded {} search {}/{} for {}", mode, used + 1, limit, identity.key());

        Ok(ThrottleDecision {
            allowed: true,
            used: used + 1,
            limit,
        })
    }

    /// Attempts counted today for `identity` in `mode`, without recording.
    pub async fn usage_today(&self, identity: &Identity, mode: SearchMode) -> Result<u32, AppError> {
        self.store
            .count_attempts(identity, mode, Utc::now().date_naive())
            .await
    }
}

/// Usage log kept in process memory; used by tests and the CLI.
#[derive(Default)]
pub struct InMemoryUsageStore {
    records: tokio::sync::Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn count_attempts(
        &self,
        identity: &Identity,
        mode: SearchMode,
        day: NaiveDate,
    ) -> Result<u32, AppError> {
        let records = self.records.lock().await;
        let count = records
            .iter()
            .filter(|r| &r.identity == identity && r.mode == mode && r.day == day)
            .count();
        Ok(count as u32)
    }

    async fn record_attempt(&self, record: &UsageRecord) -> Result<(), AppError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}
