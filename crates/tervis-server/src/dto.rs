//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use tervis_core::{Language, NewsArticle, ProfessionalSummary, SearchMode, SearchResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub mode: SearchMode,
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub professionals: Vec<ProfessionalSummary>,
    pub ai_response: String,
    pub count: usize,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            professionals: result.professionals,
            ai_response: result.narrative,
            count: result.count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocaleParams {
    pub session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocaleUpdate {
    pub session: String,
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct LocaleResponse {
    pub language: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRequest {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct NewsParams {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub status: &'static str,
    pub items: Vec<NewsArticle>,
}
