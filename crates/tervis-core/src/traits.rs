//! Seams between the services and their collaborators.
//!
//! The services in this crate only see these traits; `tervis-db` and
//! `tervis-client` provide the production implementations and tests provide
//! in-memory ones.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{
    Identity, Language, Location, NewsArticle, Professional, SearchMode, UsageRecord,
};

/// Read access to the location reference table.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Returns locations whose country, state, city or display string
    /// contains `folded_term` (already lowercased and stripped of diacritics).
    async fn search_locations(
        &self,
        folded_term: &str,
        limit: usize,
    ) -> Result<Vec<Location>, AppError>;
}

/// Read access to verified directory entries.
#[async_trait]
pub trait ProfessionalStore: Send + Sync {
    /// Returns at most `limit` verified professionals. When `folded_locality`
    /// is set, only those whose city or state contains it are returned.
    async fn find_verified(
        &self,
        folded_locality: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Professional>, AppError>;
}

/// Append-only usage log.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Number of attempts recorded for `identity` in `mode` on `day`.
    async fn count_attempts(
        &self,
        identity: &Identity,
        mode: SearchMode,
        day: NaiveDate,
    ) -> Result<u32, AppError>;

    async fn record_attempt(&self, record: &UsageRecord) -> Result<(), AppError>;
}

/// Domain-to-language reference data (the `countries` table).
#[async_trait]
pub trait DomainLanguageLookup: Send + Sync {
    async fn language_for_host(&self, hostname: &str) -> Result<Option<Language>, AppError>;
}

/// Key-value store for persisted language preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_language(&self, key: &str) -> Result<Option<Language>, AppError>;

    async fn set_language(&self, key: &str, language: Language) -> Result<(), AppError>;
}

/// Single-turn text generation (prompt in, text out).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// Health news feed for the landing page.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Latest articles in `language`. Implementations degrade instead of failing.
    async fn latest(&self, language: Language) -> Vec<NewsArticle>;
}
