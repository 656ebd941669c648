//! Location typeahead.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::config::SearchConfig;
use crate::models::Location;
use crate::text::fold;
use crate::traits::LocationStore;

/// Outcome of one typeahead call.
///
/// A store failure degrades to an empty list with `error` set; it is never
/// surfaced as a failure the UI has to branch on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Suggestions {
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            locations: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[derive(Clone)]
pub struct LocationSuggestionService {
    store: Arc<dyn LocationStore>,
    max_suggestions: usize,
    min_chars: usize,
}

impl LocationSuggestionService {
    pub fn new(store: Arc<dyn LocationStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            max_suggestions: config.max_suggestions,
            min_chars: config.min_suggestion_chars,
        }
    }

    /// True when `query` is long enough to be sent to the store.
    pub fn accepts(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.min_chars
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Returns up to `max_suggestions` places matching `query` in any field.
    ///
    /// Matching is case- and diacritic-insensitive. Ordering is whatever the
    /// store returns.
    pub async fn suggest(&self, query: &str) -> Suggestions {
        if !self.accepts(query) {
            return Suggestions::default();
        }

        let term = fold(query);
        match self.store.search_locations(&term, self.max_suggestions).await {
            Ok(mut locations) => {
                locations.truncate(self.max_suggestions);
                Suggestions {
                    locations,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Location suggestion lookup failed: {}", e);
                Suggestions::degraded("Database error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryLocations {
        rows: Vec<Location>,
        calls: AtomicUsize,
    }

    impl MemoryLocations {
        fn new(rows: Vec<Location>) -> Self {
            Self {
                rows,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LocationStore for MemoryLocations {
        async fn search_locations(
            &self,
            folded_term: &str,
            limit: usize,
        ) -> Result<Vec<Location>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .iter()
                .filter(|l| {
                    [
                        Some(l.country.as_str()),
                        l.state.as_deref(),
                        Some(l.city.as_str()),
                        Some(l.full_location.as_str()),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|field| fold(field).contains(folded_term))
                })
                .take(limit)
                .cloned()
                .collect())
        }
    }

    struct BrokenLocations;

    #[async_trait]
    impl LocationStore for BrokenLocations {
        async fn search_locations(&self, _: &str, _: usize) -> Result<Vec<Location>, AppError> {
            Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
        }
    }

    fn place(city: &str, state: &str, country: &str) -> Location {
        Location {
            country: country.to_string(),
            state: Some(state.to_string()),
            city: city.to_string(),
            full_location: format!("{}, {}, {}", city, state, country),
        }
    }

    fn sample() -> Vec<Location> {
        vec![
            place("São Paulo", "SP", "Brasil"),
            place("Rio de Janeiro", "RJ", "Brasil"),
            place("Lisboa", "Lisboa", "Portugal"),
            place("Milano", "Lombardia", "Italia"),
        ]
    }

    #[tokio::test]
    async fn test_short_query_skips_store() {
        let store = Arc::new(MemoryLocations::new(sample()));
        let service = LocationSuggestionService::new(store.clone(), &SearchConfig::default());

        for q in ["", "s", " a ", "ã"] {
            let result = service.suggest(q).await;
            assert!(result.locations.is_empty());
            assert!(result.error.is_none());
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_matches_without_diacritics() {
        let service =
            LocationSuggestionService::new(Arc::new(MemoryLocations::new(sample())), &SearchConfig::default());
        let result = service.suggest("sao").await;
        assert_eq!(result.locations.len(), 1);
        assert_eq!(result.locations[0].city, "São Paulo");
    }

    #[tokio::test]
    async fn test_matches_any_field() {
        let service =
            LocationSuggestionService::new(Arc::new(MemoryLocations::new(sample())), &SearchConfig::default());
        assert_eq!(service.suggest("brasil").await.locations.len(), 2);
        assert_eq!(service.suggest("LOMB").await.locations.len(), 1);
    }

    #[tokio::test]
    async fn test_bounded_to_max_suggestions() {
        let rows: Vec<Location> = (0..50).map(|i| place(&format!("Vila {}", i), "MG", "Brasil")).collect();
        let service =
            LocationSuggestionService::new(Arc::new(MemoryLocations::new(rows)), &SearchConfig::default());
        assert_eq!(service.suggest("vila").await.locations.len(), 20);
    }

    #[tokio::test]
    async fn test_store_error_degrades() {
        let service = LocationSuggestionService::new(Arc::new(BrokenLocations), &SearchConfig::default());
        let result = service.suggest("rio").await;
        assert!(result.locations.is_empty());
        assert_eq!(result.error.as_deref(), Some("Database error"));
    }
}
