//! Tervis DB - PostgreSQL implementations of the core storage traits.
//!
//! Every repository wraps a shared [`sqlx::PgPool`] and maps failures to
//! [`tervis_core::AppError::DatabaseError`]. The schema lives in
//! `migrations/0001_init.sql` at the workspace root.

pub mod locale;
pub mod repository;
pub mod usage;

pub use locale::{CountryRepository, PreferenceRepository};
pub use repository::{LocationRepository, ProfessionalRepository};
pub use usage::UsageRepository;
