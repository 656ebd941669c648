//! Verified-professional lookup for free-text queries.

use std::sync::Arc;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::models::{Language, Professional, ProfessionalSummary};
use crate::query::extract_location;
use crate::text::{fold, truncate_chars};
use crate::traits::ProfessionalStore;

const DEFAULT_COUNTRY: &str = "Brasil";

/// Placeholder shown when a professional left the description blank.
pub fn default_description(language: Language) -> &'static str {
    match language {
        Language::Pt => "Profissional de saúde qualificado",
        Language::It => "Professionista sanitario qualificato",
        Language::Es => "Profesional de salud calificado",
        Language::En => "Qualified health professional",
    }
}

/// Directory matches for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryMatches {
    /// Location phrase extracted from the query, as typed (lowercased).
    pub location: Option<String>,
    pub professionals: Vec<ProfessionalSummary>,
}

#[derive(Clone)]
pub struct DirectoryFilter {
    store: Arc<dyn ProfessionalStore>,
    max_results: usize,
    description_max_chars: usize,
}

impl DirectoryFilter {
    pub fn new(store: Arc<dyn ProfessionalStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            max_results: config.max_results,
            description_max_chars: config.description_max_chars,
        }
    }

    /// Returns at most `max_results` verified professionals for `query`.
    ///
    /// When the query names a place ("... em Campinas"), only professionals
    /// whose city or state contains it are kept; entries without structured
    /// address data are dropped from such searches.
    pub async fn filter(&self, query: &str, language: Language) -> Result<DirectoryMatches, AppError> {
        let location = extract_location(query, language);
        let folded = location.as_deref().map(fold);

        let rows = self
            .store
            .find_verified(folded.as_deref(), self.max_results)
            .await?;
        let fetched = rows.len();

        let professionals: Vec<ProfessionalSummary> = rows
            .into_iter()
            .filter(|p| p.verified)
            .filter(|p| match &folded {
                Some(term) => matches_locality(p, term),
                None => true,
            })
            .take(self.max_results)
            .map(|p| self.summarize(p, language))
            .collect();

        debug!(
            "Directory filter: location={:?}, fetched={}, kept={}",
            location,
            fetched,
            professionals.len()
        );

        Ok(DirectoryMatches {
            location,
            professionals,
        })
    }

    fn summarize(&self, professional: Professional, language: Language) -> ProfessionalSummary {
        let address = professional.address.unwrap_or_default();
        let description = professional
            .description
            .filter(|d| !d.trim().is_empty())
            .map(|d| truncate_chars(d.trim(), self.description_max_chars))
            .unwrap_or_else(|| default_description(language).to_string());

        ProfessionalSummary {
            id: professional.id,
            full_name: professional.full_name,
            professional_type: professional.professional_type,
            description,
            avatar_url: professional.avatar_url,
            city: address.city.unwrap_or_default(),
            state: address.state.unwrap_or_default(),
            country: address
                .country
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }
}

fn matches_locality(professional: &Professional, folded_term: &str) -> bool {
    let Some(address) = professional.address.as_ref().filter(|a| a.has_locality()) else {
        return false;
    };
    [address.city.as_deref(), address.state.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| fold(field).contains(folded_term))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Address;
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Store double that ignores the filter and limit it is given, so the
    /// service's own guarantees are what the tests observe.
    pub(crate) struct CarelessStore {
        pub rows: Vec<Professional>,
    }

    #[async_trait]
    impl ProfessionalStore for CarelessStore {
        async fn find_verified(
            &self,
            _folded_locality: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<Professional>, AppError> {
            Ok(self.rows.clone())
        }
    }

    pub(crate) fn professional(kind: &str, city: Option<&str>, verified: bool) -> Professional {
        Professional {
            id: Uuid::new_v4(),
            professional_type: kind.to_string(),
            description: None,
            address: city.map(|c| Address {
                city: Some(c.to_string()),
                state: Some("SP".to_string()),
                country: Some("Brasil".to_string()),
            }),
            verified,
            full_name: format!("{} de {}", kind, city.unwrap_or("lugar nenhum")),
            avatar_url: None,
        }
    }

    fn filter_over(rows: Vec<Professional>) -> DirectoryFilter {
        DirectoryFilter::new(Arc::new(CarelessStore { rows }), &SearchConfig::default())
    }

    #[tokio::test]
    async fn test_never_more_than_twelve_and_all_verified() {
        let mut rows: Vec<Professional> = (0..20).map(|_| professional("Dentista", Some("Santos"), true)).collect();
        rows.extend((0..5).map(|_| professional("Dentista", Some("Santos"), false)));

        let result = filter_over(rows).filter("dentista", Language::Pt).await.unwrap();
        assert_eq!(result.professionals.len(), 12);
        assert!(result.location.is_none());
    }

    #[tokio::test]
    async fn test_unverified_rows_are_dropped() {
        let rows = vec![
            professional("Dentista", Some("Santos"), false),
            professional("Dentista", Some("Santos"), true),
        ];
        let result = filter_over(rows).filter("dentista", Language::Pt).await.unwrap();
        assert_eq!(result.professionals.len(), 1);
    }

    #[tokio::test]
    async fn test_location_constraint() {
        let rows = vec![
            professional("Dentista", Some("São Paulo"), true),
            professional("Dentista", Some("Campinas"), true),
            professional("Dentista", None, true),
        ];
        let result = filter_over(rows)
            .filter("Dentista em Sao Paulo", Language::Pt)
            .await
            .unwrap();
        assert_eq!(result.location.as_deref(), Some("sao paulo"));
        assert_eq!(result.professionals.len(), 1);
        assert_eq!(result.professionals[0].city, "São Paulo");
    }

    #[tokio::test]
    async fn test_state_matches_location() {
        let rows = vec![professional("Psicólogo", Some("Campinas"), true)];
        let result = filter_over(rows).filter("psicólogo em sp", Language::Pt).await.unwrap();
        assert_eq!(result.professionals.len(), 1);
    }

    #[tokio::test]
    async fn test_projection_defaults() {
        let mut p = professional("Nutricionista", None, true);
        p.description = Some("x".repeat(400));
        let rows = vec![p, professional("Nutricionista", None, true)];

        let result = filter_over(rows).filter("nutricionista", Language::Pt).await.unwrap();
        assert_eq!(result.professionals[0].description.chars().count(), 163);
        assert_eq!(result.professionals[1].description, "Profissional de saúde qualificado");
        assert_eq!(result.professionals[1].country, "Brasil");
        assert_eq!(result.professionals[1].city, "");
    }
}
