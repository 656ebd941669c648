//! Country domains and persisted language preferences.

use async_trait::async_trait;
use sqlx::{PgPool, Pool, Postgres};
use tervis_core::error::AppError;
use tervis_core::models::Language;
use tervis_core::text::contains_pattern;
use tervis_core::traits::{DomainLanguageLookup, PreferenceStore};

/// Reads the `countries` table: one row per storefront domain.
#[derive(Clone)]
pub struct CountryRepository {
    pool: Pool<Postgres>,
}

impl CountryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Language of the first country whose domain contains `hostname`.
    ///
    /// Unknown language codes in the table are treated as no match.
    pub async fn language_for_host(&self, hostname: &str) -> Result<Option<Language>, AppError> {
        let code: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT language_code
            FROM countries
            WHERE domain ILIKE $1
            ORDER BY domain
            LIMIT 1
            "#,
        )
        .bind(contains_pattern(&hostname.to_lowercase()))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(code.and_then(|(c,)| Language::from_code(&c)))
    }
}

#[async_trait]
impl DomainLanguageLookup for CountryRepository {
    async fn language_for_host(&self, hostname: &str) -> Result<Option<Language>, AppError> {
        CountryRepository::language_for_host(self, hostname).await
    }
}

/// Language choice per session key (`language_preferences`).
#[derive(Clone)]
pub struct PreferenceRepository {
    pool: Pool<Postgres>,
}

impl PreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Language>, AppError> {
        let stored: Option<(String,)> =
            sqlx::query_as("SELECT language FROM language_preferences WHERE session_key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::DatabaseError)?;

        Ok(stored.and_then(|(code,)| Language::from_code(&code)))
    }

    pub async fn upsert(&self, key: &str, language: Language) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO language_preferences (session_key, language, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (session_key)
            DO UPDATE SET
                language = EXCLUDED.language,
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(language.code())
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn get_language(&self, key: &str) -> Result<Option<Language>, AppError> {
        self.get(key).await
    }

    async fn set_language(&self, key: &str, language: Language) -> Result<(), AppError> {
        self.upsert(key, language).await
    }
}
