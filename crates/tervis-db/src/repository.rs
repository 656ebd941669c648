//! Directory repositories: verified professionals and the location table.
//!
//! Both read paths compare folded search terms against
//! `unaccent(lower(column))`, so the caller passes terms that are already
//! lowercased and stripped of diacritics (see `tervis_core::text::fold`).
//!
//! # Testing
//!
//! The unit tests below cover row mapping only. The SQL itself is exercised
//! against a live database through the `tervis` binary.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};
use tervis_core::error::AppError;
use tervis_core::models::{Address, Location, Professional};
use tervis_core::text::contains_pattern;
use tervis_core::traits::{LocationStore, ProfessionalStore};
use uuid::Uuid;

/// Repository for the `professionals` table joined with `profiles`.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use tervis_db::ProfessionalRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/tervis")
///     .await?;
///
/// let repo = ProfessionalRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProfessionalRepository {
    pool: Pool<Postgres>,
}

impl ProfessionalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns verified professionals, optionally restricted to a city or state
    /// containing `folded_locality`.
    pub async fn find_verified(
        &self,
        folded_locality: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Professional>, AppError> {
        let pattern = folded_locality.map(contains_pattern);

        let rows: Vec<ProfessionalRow> = sqlx::query_as(
            r#"
            SELECT
                p.id,
                p.professional_type,
                p.description,
                p.address,
                p.verified,
                COALESCE(pr.full_name, '') AS full_name,
                pr.avatar_url
            FROM professionals p
            JOIN profiles pr ON pr.id = p.profile_id
            WHERE p.verified = TRUE
              AND (
                $1::text IS NULL
                OR unaccent(lower(p.address->>'city')) LIKE $1
                OR unaccent(lower(p.address->>'state')) LIKE $1
              )
            ORDER BY pr.full_name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(rows.into_iter().map(Professional::from).collect())
    }
}

#[async_trait]
impl ProfessionalStore for ProfessionalRepository {
    async fn find_verified(
        &self,
        folded_locality: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Professional>, AppError> {
        ProfessionalRepository::find_verified(self, folded_locality, limit).await
    }
}

/// Repository for the `locations` reference table.
#[derive(Clone)]
pub struct LocationRepository {
    pool: Pool<Postgres>,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locations whose country, state, city or display string contains the term.
    pub async fn search(&self, folded_term: &str, limit: usize) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT country, state, city, full_location
            FROM locations
            WHERE unaccent(lower(country)) LIKE $1
               OR unaccent(lower(COALESCE(state, ''))) LIKE $1
               OR unaccent(lower(city)) LIKE $1
               OR unaccent(lower(full_location)) LIKE $1
            ORDER BY full_location
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(folded_term))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(locations)
    }
}

#[async_trait]
impl LocationStore for LocationRepository {
    async fn search_locations(
        &self,
        folded_term: &str,
        limit: usize,
    ) -> Result<Vec<Location>, AppError> {
        self.search(folded_term, limit).await
    }
}

/// Helper struct for deserializing directory rows
#[derive(sqlx::FromRow)]
struct ProfessionalRow {
    id: Uuid,
    professional_type: String,
    description: Option<String>,
    address: Option<Json<Value>>,
    verified: bool,
    full_name: String,
    avatar_url: Option<String>,
}

impl From<ProfessionalRow> for Professional {
    fn from(row: ProfessionalRow) -> Self {
        Professional {
            id: row.id,
            professional_type: row.professional_type,
            description: row.description,
            address: row.address.and_then(|Json(value)| address_from_json(&value)),
            verified: row.verified,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
        }
    }
}

/// Reads the address column without trusting its shape: JSON `null` or a
/// non-object yields no address, and non-string fields are dropped.
fn address_from_json(value: &Value) -> Option<Address> {
    let object = value.as_object()?;
    let field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    Some(Address {
        city: field("city"),
        state: field("state"),
        country: field("country"),
    })
}
