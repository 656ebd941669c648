//! Domain records shared by every Tervis crate.
//!
//! Rows are validated at the store boundary and turned into these typed
//! records; nothing above the repositories handles loosely-typed JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Display language of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pt,
    It,
    Es,
    En,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Pt, Language::It, Language::Es, Language::En];

    /// Two-letter code as stored in `countries.language_code`.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::It => "it",
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// English name, used when instructing the model which language to answer in.
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::Pt => "Portuguese",
            Language::It => "Italian",
            Language::Es => "Spanish",
            Language::En => "English",
        }
    }

    /// Parses a stored code, accepting regional variants such as `pt-BR`.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "pt" => Some(Language::Pt),
            "it" => Some(Language::It),
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s)
            .ok_or_else(|| AppError::InvalidQuery(format!("Unsupported language: {}", s)))
    }
}

/// Reference place data used by the typeahead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub country: String,
    pub state: Option<String>,
    pub city: String,
    pub full_location: String,
}

/// Structured address attached to a professional profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// True when the address carries a city or a state to match against.
    pub fn has_locality(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.city) || filled(&self.state)
    }
}

/// A directory entry as read from the professionals table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Professional {
    pub id: Uuid,
    pub professional_type: String,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub verified: bool,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

/// What a search returns for one professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    pub id: Uuid,
    pub full_name: String,
    pub professional_type: String,
    pub description: String,
    pub avatar_url: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Input channel of a search attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Text,
    Voice,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Text => "text",
            SearchMode::Voice => "voice",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(SearchMode::Text),
            "voice" => Ok(SearchMode::Voice),
            other => Err(AppError::InvalidRecord(format!("Unknown search mode: {}", other))),
        }
    }
}

/// Who a usage record is counted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Authenticated user id supplied by the identity provider.
    User(String),
    /// Ephemeral browser session for anonymous visitors.
    Session(String),
}

impl Identity {
    /// Prefers the user id; falls back to the session id. Blank values are ignored.
    pub fn resolve(user_id: Option<&str>, session_id: Option<&str>) -> Option<Self> {
        fn non_blank(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        non_blank(user_id)
            .map(|u| Identity::User(u.to_string()))
            .or_else(|| non_blank(session_id).map(|s| Identity::Session(s.to_string())))
    }

    pub fn key(&self) -> &str {
        match self {
            Identity::User(id) | Identity::Session(id) => id,
        }
    }
}

/// One search attempt in the append-only usage log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub identity: Identity,
    /// Anonymous session the attempt came from, kept even for logged-in users.
    pub session_id: Option<String>,
    pub mode: SearchMode,
    pub query: String,
    pub day: NaiveDate,
}

/// Combined payload of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub professionals: Vec<ProfessionalSummary>,
    pub narrative: String,
    pub count: usize,
}

/// A health news teaser card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: DateTime<Utc>,
    pub description: String,
    pub image: String,
}
