//! Tervis Core - Domain types, search services, and error handling.
//!
//! This crate holds everything the Tervis search endpoints decide on:
//!
//! - **Domain models**: [`Professional`], [`Location`], [`UsageRecord`], [`Language`], etc.
//! - **Services**: [`SearchService`] (directory filter + answer composer),
//!   [`LocationSuggestionService`], [`UsageThrottle`], [`LocaleResolver`]
//! - **Traits**: [`ProfessionalStore`], [`LocationStore`], [`UsageStore`],
//!   [`DomainLanguageLookup`], [`PreferenceStore`], [`TextGenerator`], [`NewsSource`]
//!   for dependency injection
//! - **News**: HTML extraction and fallback cards for the health news feed
//!
//! I/O lives elsewhere: `tervis-db` implements the stores on PostgreSQL and
//! `tervis-client` implements [`TextGenerator`] on the Gemini API.

pub mod compose;
pub mod config;
pub mod directory;
pub mod error;
pub mod locale;
pub mod models;
pub mod news;
pub mod query;
pub mod search;
pub mod suggest;
pub mod text;
pub mod throttle;
pub mod traits;

// Configuration
pub use config::{
    default_config_path, load_service_config, AiConfig, DbConfig, HttpConfig, NewsConfig,
    SearchConfig, ServiceConfig, ThrottleConfig,
};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{
    Address, Identity, Language, Location, NewsArticle, Professional, ProfessionalSummary,
    SearchMode, SearchResult, UsageRecord,
};

// Traits for dependency injection
pub use traits::{
    DomainLanguageLookup, LocationStore, NewsSource, PreferenceStore, ProfessionalStore,
    TextGenerator, UsageStore,
};

// Services
pub use compose::{AnswerComposer, Narrative, NarrativeSource};
pub use directory::{DirectoryFilter, DirectoryMatches};
pub use locale::{InMemoryPreferenceStore, LocaleResolver, StaticDomainTable};
pub use search::SearchService;
pub use suggest::{LocationSuggestionService, Suggestions};
pub use throttle::{InMemoryUsageStore, ThrottleDecision, UsageThrottle};
