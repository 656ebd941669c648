//! Narrative composition for search results.
//!
//! The narrative is never empty. It is either text produced by the model for
//! an open question with at least one directory match, or one of two fixed
//! templates chosen by whether the directory list is empty.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{Language, ProfessionalSummary};
use crate::query::{classify, QueryIntent};
use crate::traits::TextGenerator;

/// Subscription product every answer steers towards.
pub const PLATFORM_NAME: &str = "AssineSaúde";

const SAFETY_RULES: &str = "You are TERVIS.AI, the health assistant of the AssineSaúde marketplace. CRITICAL rules:
1. NEVER recommend a professional who is not in the list provided below.
2. NEVER give a medical diagnosis.
3. NEVER prescribe or recommend medication, remedies or supplements.
4. ALWAYS suggest that the user look for a suitable health professional.
5. ALWAYS encourage the user to subscribe on AssineSaúde to be seen by a professional.
6. Be brief and objective: at most 3-4 sentences.

If the question is about symptoms or health conditions, answer in an educational way but ALWAYS say that a professional must be consulted. Always end by suggesting the AssineSaúde platform.";

/// Text used when the directory has no match for the query.
pub fn zero_results_template(language: Language, location: Option<&str>) -> String {
    match (language, location) {
        (Language::Pt, Some(loc)) => format!(
            "Não encontramos profissionais cadastrados para sua busca em {}. Tente buscar em outras cidades próximas ou aguarde novos profissionais se cadastrarem na plataforma {}.",
            loc, PLATFORM_NAME
        ),
        (Language::Pt, None) => format!(
            "Não encontramos profissionais cadastrados para sua busca. Tente ampliar sua busca ou aguarde novos profissionais se cadastrarem na plataforma {}.",
            PLATFORM_NAME
        ),
        (Language::It, Some(loc)) => format!(
            "Non abbiamo trovato professionisti registrati per la tua ricerca a {}. Prova a cercare in città vicine o attendi che nuovi professionisti si registrino sulla piattaforma {}.",
            loc, PLATFORM_NAME
        ),
        (Language::It, None) => format!(
            "Non abbiamo trovato professionisti registrati per la tua ricerca. Prova ad ampliare la ricerca o attendi che nuovi professionisti si registrino sulla piattaforma {}.",
            PLATFORM_NAME
        ),
        (Language::Es, Some(loc)) => format!(
            "No encontramos profesionales registrados para tu búsqueda en {}. Intenta buscar en ciudades cercanas o espera a que nuevos profesionales se registren en la plataforma {}.",
            loc, PLATFORM_NAME
        ),
        (Language::Es, None) => format!(
            "No encontramos profesionales registrados para tu búsqueda. Intenta ampliar tu búsqueda o espera a que nuevos profesionales se registren en la plataforma {}.",
            PLATFORM_NAME
        ),
        (Language::En, Some(loc)) => format!(
            "We could not find registered professionals for your search in {}. Try nearby cities or wait for new professionals to join the {} platform.",
            loc, PLATFORM_NAME
        ),
        (Language::En, None) => format!(
            "We could not find registered professionals for your search. Try broadening your search or wait for new professionals to join the {} platform.",
            PLATFORM_NAME
        ),
    }
}

/// Text used when the directory matched `count` professionals and no model
/// answer is available.
pub fn results_template(language: Language, count: usize, location: Option<&str>) -> String {
    let place = |prep: &str| location.map(|l| format!(" {} {}", prep, l)).unwrap_or_default();
    match language {
        Language::Pt => format!(
            "Encontramos {} profissionais disponíveis{}. Faça uma assinatura no {} para ter acesso direto e contínuo ao profissional escolhido!",
            count,
            place("em"),
            PLATFORM_NAME
        ),
        Language::It => format!(
            "Abbiamo trovato {} professionisti disponibili{}. Abbonati a {} per avere accesso diretto e continuo al professionista scelto!",
            count,
            place("a"),
            PLATFORM_NAME
        ),
        Language::Es => format!(
            "Encontramos {} profesionales disponibles{}. ¡Suscríbete a {} para tener acceso directo y continuo al profesional elegido!",
            count,
            place("en"),
            PLATFORM_NAME
        ),
        Language::En => format!(
            "We found {} available professionals{}. Subscribe to {} for direct, ongoing access to the professional you choose!",
            count,
            place("in"),
            PLATFORM_NAME
        ),
    }
}

/// Builds the single-turn prompt sent to the model.
pub fn build_prompt(query: &str, language: Language, professionals: &[ProfessionalSummary]) -> String {
    let directory = if professionals.is_empty() {
        "(no professionals matched)".to_string()
    } else {
        professionals
            .iter()
            .map(|p| {
                let place = [p.city.as_str(), p.state.as_str()]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                if place.is_empty() {
                    format!("- {} ({})", p.full_name, p.professional_type)
                } else {
                    format!("- {} ({}, {})", p.full_name, p.professional_type, place)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{}\n\nAnswer in {}.\n\nProfessionals available on the platform:\n{}\n\nUser question: {}",
        SAFETY_RULES,
        language.english_name(),
        directory,
        query.trim()
    )
}

/// Where a narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeSource {
    Model,
    ZeroResultsTemplate,
    ResultsTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

/// Decides whether to consult the model and always returns a narrative.
#[derive(Clone)]
pub struct AnswerComposer {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl AnswerComposer {
    /// `generator` is `None` when no API key is configured.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Composes the narrative for `query` given the directory matches.
    ///
    /// Direct lookups never reach the model. Open questions get one bounded
    /// attempt; any failure, timeout or blank answer falls back to a template.
    /// An empty directory list always yields the zero-results template.
    pub async fn compose(
        &self,
        query: &str,
        language: Language,
        location: Option<&str>,
        professionals: &[ProfessionalSummary],
    ) -> Narrative {
        let generated = match (classify(query), &self.generator) {
            (QueryIntent::OpenQuestion, Some(generator)) => {
                self.ask_model(generator.as_ref(), query, language, professionals)
                    .await
            }
            (QueryIntent::DirectLookup, _) => {
                debug!("Direct lookup, skipping model");
                None
            }
            (QueryIntent::OpenQuestion, None) => None,
        };

        if professionals.is_empty() {
            return Narrative {
                text: zero_results_template(language, location),
                source: NarrativeSource::ZeroResultsTemplate,
            };
        }

        match generated {
            Some(text) => Narrative {
                text,
                source: NarrativeSource::Model,
            },
            None => Narrative {
                text: results_template(language, professionals.len(), location),
                source: NarrativeSource::ResultsTemplate,
            },
        }
    }

    async fn ask_model(
        &self,
        generator: &dyn TextGenerator,
        query: &str,
        language: Language,
        professionals: &[ProfessionalSummary],
    ) -> Option<String> {
        let prompt = build_prompt(query, language, professionals);
        match tokio::time::timeout(self.timeout, generator.generate(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(Ok(_)) => {
                warn!("Model returned an empty answer, using template");
                None
            }
            Ok(Err(e)) => {
                warn!("Model call failed, using template: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Model call exceeded {}s, using template",
                    self.timeout.as_secs()
                );
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    pub(crate) enum Behaviour {
        Answer(&'static str),
        Fail,
        Hang,
    }

    pub(crate) struct ScriptedModel {
        pub behaviour: Behaviour,
        pub calls: AtomicUsize,
        pub last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            match self.behaviour {
                Behaviour::Answer(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(AppError::GeminiError("HTTP 503".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }

    fn summaries(n: usize) -> Vec<ProfessionalSummary> {
        (0..n)
            .map(|i| ProfessionalSummary {
                id: Uuid::new_v4(),
                full_name: format!("Dra. Ana {}", i),
                professional_type: "Dentista".to_string(),
                description: "Clínica geral".to_string(),
                avatar_url: None,
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                country: "Brasil".to_string(),
            })
            .collect()
    }

    fn composer(model: &Arc<ScriptedModel>) -> AnswerComposer {
        let generator: Arc<dyn TextGenerator> = model.clone();
        AnswerComposer::new(Some(generator), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_direct_lookup_never_calls_model() {
        let model = ScriptedModel::new(Behaviour::Answer("model text"));
        let narrative = composer(&model)
            .compose("Dentista em São Paulo", Language::Pt, Some("são paulo"), &summaries(3))
            .await;

        assert_eq!(model.calls(), 0);
        assert_eq!(narrative.source, NarrativeSource::ResultsTemplate);
        assert_eq!(narrative.text, results_template(Language::Pt, 3, Some("são paulo")));
        assert!(narrative.text.contains("Encontramos 3 profissionais"));
    }

    #[tokio::test]
    async fn test_open_question_uses_model_text() {
        let model = ScriptedModel::new(Behaviour::Answer("  Procure um profissional.  "));
        let narrative = composer(&model)
            .compose("como dormir melhor", Language::Pt, None, &summaries(2))
            .await;

        assert_eq!(model.calls(), 1);
        assert_eq!(narrative.source, NarrativeSource::Model);
        assert_eq!(narrative.text, "Procure um profissional.");
    }

    #[tokio::test]
    async fn test_zero_results_with_failing_model() {
        let model = ScriptedModel::new(Behaviour::Fail);
        let narrative = composer(&model)
            .compose("dor de cabeça", Language::Pt, None, &[])
            .await;

        assert_eq!(model.calls(), 1);
        assert_eq!(narrative.source, NarrativeSource::ZeroResultsTemplate);
        assert_eq!(narrative.text, zero_results_template(Language::Pt, None));
    }

    #[tokio::test]
    async fn test_zero_results_overrides_model_text() {
        let model = ScriptedModel::new(Behaviour::Answer("some advice"));
        let narrative = composer(&model)
            .compose("dor de cabeça", Language::Pt, None, &[])
            .await;
        assert_eq!(narrative.text, zero_results_template(Language::Pt, None));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let model = ScriptedModel::new(Behaviour::Hang);
        let narrative = composer(&model)
            .compose("cansaço constante", Language::Pt, None, &summaries(4))
            .await;
        assert_eq!(narrative.source, NarrativeSource::ResultsTemplate);
        assert!(narrative.text.contains('4'));
    }

    #[tokio::test]
    async fn test_blank_model_answer_falls_back() {
        let model = ScriptedModel::new(Behaviour::Answer("   "));
        let narrative = composer(&model)
            .compose("insônia", Language::Pt, None, &summaries(1))
            .await;
        assert_eq!(narrative.source, NarrativeSource::ResultsTemplate);
    }

    #[tokio::test]
    async fn test_unconfigured_generator_uses_templates() {
        let composer = AnswerComposer::new(None, Duration::from_secs(1));
        let narrative = composer.compose("insônia", Language::En, None, &summaries(2)).await;
        assert_eq!(narrative.text, results_template(Language::En, 2, None));
    }

    #[tokio::test]
    async fn test_prompt_carries_rules_and_directory() {
        let model = ScriptedModel::new(Behaviour::Answer("ok"));
        composer(&model)
            .compose("ansiedade", Language::Es, None, &summaries(1))
            .await;

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("NEVER give a medical diagnosis"));
        assert!(prompt.contains("Answer in Spanish"));
        assert!(prompt.contains("Dra. Ana 0 (Dentista, São Paulo, SP)"));
        assert!(prompt.ends_with("User question: ansiedade"));
    }

    #[test]
    fn test_templates_never_empty() {
        for lang in Language::ALL {
            assert!(!zero_results_template(lang, None).is_empty());
            assert!(!zero_results_template(lang, Some("lisboa")).contains("  "));
            assert!(results_template(lang, 5, Some("lisboa")).contains("lisboa"));
            assert!(results_template(lang, 5, None).contains(PLATFORM_NAME));
        }
    }
}
