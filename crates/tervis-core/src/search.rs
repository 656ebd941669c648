//! Search service: directory filter plus narrative composition.

use tracing::info;

use crate::compose::AnswerComposer;
use crate::directory::DirectoryFilter;
use crate::error::AppError;
use crate::models::{Language, SearchResult};

/// Service for answering one free-text search.
///
/// # Example
///
/// ```ignore
/// use tervis_core::SearchService;
///
/// let search = SearchService::new(directory, composer);
/// let result = search.search("Dentista em São Paulo", Language::Pt).await?;
/// println!("{} found: {}", result.count, result.narrative);
/// ```
#[derive(Clone)]
pub struct SearchService {
    directory: DirectoryFilter,
    composer: AnswerComposer,
}

impl SearchService {
    pub fn new(directory: DirectoryFilter, composer: AnswerComposer) -> Self {
        Self {
            directory,
            composer,
        }
    }

    /// Runs the directory filter and composes the narrative for `query`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidQuery` for a blank query (no backend call is
    /// made) and propagates directory store failures. Model failures never
    /// surface here.
    pub async fn search(&self, query: &str, language: Language) -> Result<SearchResult, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidQuery("Query is required".to_string()));
        }

        let matches = self.directory.filter(query, language).await?;
        let narrative = self
            .composer
            .compose(
                query,
                language,
                matches.location.as_deref(),
                &matches.professionals,
            )
            .await;

        info!(
            "Search '{}' ({}): {} professionals, narrative from {:?}",
            query,
            language,
            matches.professionals.len(),
            narrative.source
        );

        Ok(SearchResult {
            count: matches.professionals.len(),
            professionals: matches.professionals,
            narrative: narrative.text,
        })
    }
}
