//! Free-text query parsing.
//!
//! # Location phrase grammar
//!
//! ```text
//! query   := word* PREP phrase
//! PREP    := "em" (pt) | "en" (es) | "in" (it) | "in" (en)
//! phrase  := word+            (trailing ?!.,;: removed)
//! ```
//!
//! The query is lowercased and split on whitespace. The first word equal to
//! the locale's preposition starts the phrase; everything after it is the
//! phrase. Only whole words count, so "problem" never matches "em".

use crate::models::Language;

/// Words that mean the user is already asking for a kind of professional.
///
/// Matched as lowercase substrings so plurals ("dentistas") count too.
const PROFESSION_KEYWORDS: &[&str] = &[
    // pt
    "profissional",
    "doutor",
    "médico",
    "medico",
    "dentista",
    "psicólogo",
    "psicologo",
    "psicóloga",
    "nutricionista",
    "fisioterapeuta",
    "enfermeir",
    "terapeuta",
    "cardiologista",
    "dermatologista",
    "pediatra",
    "ginecologista",
    "psiquiatra",
    // es
    "profesional",
    "doctor",
    "médica",
    // it
    "professionista",
    "dottore",
    "dottoressa",
    "psicologa",
    "infermier",
    // en
    "professional",
    "dentist",
    "psychologist",
    "physician",
    "therapist",
    "nurse",
];

/// How the answer composer should treat a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// The query names a profession; the directory list answers it.
    DirectLookup,
    /// Anything else; worth asking the model.
    OpenQuestion,
}

/// Classifies a query by looking for profession keywords.
pub fn classify(query: &str) -> QueryIntent {
    let lowered = query.to_lowercase();
    if PROFESSION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        QueryIntent::DirectLookup
    } else {
        QueryIntent::OpenQuestion
    }
}

/// The preposition that introduces a place in `language`.
pub fn location_preposition(language: Language) -> &'static str {
    match language {
        Language::Pt => "em",
        Language::Es => "en",
        Language::It | Language::En => "in",
    }
}

/// Extracts the location phrase from `query`, if any.
///
/// ```
/// use tervis_core::models::Language;
/// use tervis_core::query::extract_location;
///
/// assert_eq!(
///     extract_location("Dentista em São Paulo", Language::Pt).as_deref(),
///     Some("são paulo")
/// );
/// assert_eq!(extract_location("dor de cabeça", Language::Pt), None);
/// ```
pub fn extract_location(query: &str, language: Language) -> Option<String> {
    let preposition = location_preposition(language);
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    let start = words.iter().position(|w| *w == preposition)?;
    let phrase = words[start + 1..].join(" ");
    let phrase = phrase.trim_end_matches(['?', '!', '.', ',', ';', ':']).trim();

    if phrase.is_empty() {
        None
    } else {
        Some(phrase.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_portuguese() {
        assert_eq!(
            extract_location("Dentista em São Paulo", Language::Pt).as_deref(),
            Some("são paulo")
        );
        assert_eq!(
            extract_location("psicólogo em Belo Horizonte?", Language::Pt).as_deref(),
            Some("belo horizonte")
        );
    }

    #[test]
    fn test_extract_spanish() {
        assert_eq!(
            extract_location("Dentista en Buenos Aires", Language::Es).as_deref(),
            Some("buenos aires")
        );
    }

    #[test]
    fn test_extract_italian() {
        assert_eq!(
            extract_location("Psicologo in Milano.", Language::It).as_deref(),
            Some("milano")
        );
    }

    #[test]
    fn test_extract_english() {
        assert_eq!(
            extract_location("Dentist in New York", Language::En).as_deref(),
            Some("new york")
        );
    }

    #[test]
    fn test_preposition_must_be_whole_word() {
        assert_eq!(extract_location("problema emocional", Language::Pt), None);
        assert_eq!(extract_location("nutricionista", Language::It), None);
    }

    #[test]
    fn test_uses_first_preposition() {
        assert_eq!(
            extract_location("dentista em santos em sp", Language::Pt).as_deref(),
            Some("santos em sp")
        );
    }

    #[test]
    fn test_dangling_preposition_is_no_location() {
        assert_eq!(extract_location("dentista em", Language::Pt), None);
        assert_eq!(extract_location("dentista em ?", Language::Pt), None);
    }

    #[test]
    fn test_other_locale_preposition_ignored() {
        assert_eq!(extract_location("Dentista en Lima", Language::Pt), None);
    }

    #[test]
    fn test_classify_direct_lookup() {
        assert_eq!(classify("Dentista em São Paulo"), QueryIntent::DirectLookup);
        assert_eq!(classify("preciso de um MÉDICO"), QueryIntent::DirectLookup);
        assert_eq!(classify("find a professional"), QueryIntent::DirectLookup);
        assert_eq!(classify("Psicólogos no Rio"), QueryIntent::DirectLookup);
    }

    #[test]
    fn test_classify_open_question() {
        assert_eq!(classify("dor de cabeça"), QueryIntent::OpenQuestion);
        assert_eq!(classify("como dormir melhor?"), QueryIntent::OpenQuestion);
    }
}
