//! Display-language resolution.
//!
//! Order: persisted preference, then the domain the request arrived on, then
//! Portuguese. Whatever is resolved is written back so the next call for the
//! same session short-circuits on the stored preference.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::Language;
use crate::traits::{DomainLanguageLookup, PreferenceStore};

/// Pure resolution step, without any I/O.
pub fn choose_language(stored: Option<Language>, domain_match: Option<Language>) -> Language {
    stored.or(domain_match).unwrap_or_default()
}

/// Reduces a `Host` header value or a full URL to a bare lowercase hostname.
///
/// ```
/// use tervis_core::locale::hostname_of;
///
/// assert_eq!(hostname_of("Assinesaude.IT:8443").as_deref(), Some("assinesaude.it"));
/// assert_eq!(hostname_of("https://www.assinesaude.es/login").as_deref(), Some("www.assinesaude.es"));
/// ```
pub fn hostname_of(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = if raw.contains("://") {
        url::Url::parse(raw)
    } else {
        url::Url::parse(&format!("http://{}", raw))
    };

    parsed
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase()))
        .filter(|h| !h.is_empty())
}

/// Resolves and persists the active language for a session.
#[derive(Clone)]
pub struct LocaleResolver {
    preferences: Arc<dyn PreferenceStore>,
    domains: Arc<dyn DomainLanguageLookup>,
}

impl LocaleResolver {
    pub fn new(preferences: Arc<dyn PreferenceStore>, domains: Arc<dyn DomainLanguageLookup>) -> Self {
        Self {
            preferences,
            domains,
        }
    }

    /// Resolves the language for `session_key` arriving on `host`.
    ///
    /// Never fails: store and lookup errors are logged and treated as
    /// "nothing found".
    pub async fn resolve(&self, session_key: &str, host: Option<&str>) -> Language {
        let stored = match self.preferences.get_language(session_key).await {
            Ok(lang) => lang,
            Err(e) => {
                warn!("Failed to read language preference: {}", e);
                None
            }
        };

        if let Some(lang) = stored {
            return lang;
        }

        let domain_match = match host.and_then(hostname_of) {
            Some(hostname) => match self.domains.language_for_host(&hostname).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Error detecting language from domain {}: {}", hostname, e);
                    None
                }
            },
            None => None,
        };

        let language = choose_language(None, domain_match);
        debug!("Resolved language {} for session {}", language, session_key);

        if let Err(e) = self.preferences.set_language(session_key, language).await {
            warn!("Failed to persist language preference: {}", e);
        }

        language
    }

    /// Stores an explicit user choice.
    pub async fn set_preference(&self, session_key: &str, language: Language) -> Result<(), AppError> {
        self.preferences.set_language(session_key, language).await
    }
}

/// Process-local preference store, used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    entries: RwLock<HashMap<String, Language>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get_language(&self, key: &str) -> Result<Option<Language>, AppError> {
        Ok(self.entries.read().await.get(key).copied())
    }

    async fn set_language(&self, key: &str, language: Language) -> Result<(), AppError> {
        self.entries.write().await.insert(key.to_string(), language);
        Ok(())
    }
}

/// Domain lookup backed by a fixed table, matched as a substring of the domain.
#[derive(Default)]
pub struct StaticDomainTable {
    entries: Vec<(String, Language)>,
}

impl StaticDomainTable {
    pub fn new(entries: impl IntoIterator<Item = (String, Language)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

#[async_trait]
impl DomainLanguageLookup for StaticDomainTable {
    async fn language_for_host(&self, hostname: &str) -> Result<Option<Language>, AppError> {
        let hostname = hostname.to_ascii_lowercase();
        Ok(self
            .entries
            .iter()
            .find(|(domain, _)| domain.to_ascii_lowercase().contains(&hostname))
            .map(|(_, lang)| *lang))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        inner: StaticDomainTable,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DomainLanguageLookup for CountingLookup {
        async fn language_for_host(&self, hostname: &str) -> Result<Option<Language>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.language_for_host(hostname).await
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl DomainLanguageLookup for FailingLookup {
        async fn language_for_host(&self, _hostname: &str) -> Result<Option<Language>, AppError> {
            Err(AppError::NetworkError("countries table unreachable".to_string()))
        }
    }

    fn domains() -> Arc<CountingLookup> {
        Arc::new(CountingLookup {
            inner: StaticDomainTable::new([
                ("assinesaude.com.br".to_string(), Language::Pt),
                ("assinesaude.it".to_string(), Language::It),
                ("assinesaude.es".to_string(), Language::Es),
            ]),
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_choose_language_order() {
        assert_eq!(choose_language(Some(Language::En), Some(Language::It)), Language::En);
        assert_eq!(choose_language(None, Some(Language::It)), Language::It);
        assert_eq!(choose_language(None, None), Language::Pt);
    }

    #[test]
    fn test_hostname_of() {
        assert_eq!(hostname_of("localhost:3000").as_deref(), Some("localhost"));
        assert_eq!(hostname_of(""), None);
        assert_eq!(hostname_of("   "), None);
    }

    #[tokio::test]
    async fn test_resolves_from_domain_and_persists() {
        let prefs = Arc::new(InMemoryPreferenceStore::new());
        let lookup = domains();
        let resolver = LocaleResolver::new(prefs.clone(), lookup.clone());

        let lang = resolver.resolve("s1", Some("assinesaude.it")).await;
        assert_eq!(lang, Language::It);
        assert_eq!(prefs.get_language("s1").await.unwrap(), Some(Language::It));

        let again = resolver.resolve("s1", Some("assinesaude.es")).await;
        assert_eq!(again, Language::It);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stored_preference_is_idempotent() {
        let prefs = Arc::new(InMemoryPreferenceStore::new());
        prefs.set_language("s2", Language::En).await.unwrap();
        let lookup = domains();
        let resolver = LocaleResolver::new(prefs, lookup.clone());

        let first = resolver.resolve("s2", Some("assinesaude.it")).await;
        let second = resolver.resolve("s2", Some("assinesaude.it")).await;
        assert_eq!(first, Language::En);
        assert_eq!(second, Language::En);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_domain_defaults_to_portuguese() {
        let resolver = LocaleResolver::new(Arc::new(InMemoryPreferenceStore::new()), domains());
        assert_eq!(resolver.resolve("s3", Some("example.org")).await, Language::Pt);
        assert_eq!(resolver.resolve("s4", None).await, Language::Pt);
    }

    #[tokio::test]
    async fn test_lookup_error_falls_through_to_default() {
        let resolver =
            LocaleResolver::new(Arc::new(InMemoryPreferenceStore::new()), Arc::new(FailingLookup));
        assert_eq!(resolver.resolve("s5", Some("assinesaude.it")).await, Language::Pt);
    }

    #[tokio::test]
    async fn test_set_preference_overrides_domain() {
        let resolver = LocaleResolver::new(Arc::new(InMemoryPreferenceStore::new()), domains());
        resolver.set_preference("s6", Language::Es).await.unwrap();
        assert_eq!(resolver.resolve("s6", Some("assinesaude.it")).await, Language::Es);
    }
}
