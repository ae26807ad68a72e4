//! Direction table and per-engine language tags.
//!
//! Two lookups live here:
//!
//! - [`DirectionResolver::resolve`] turns a user-facing label such as
//!   `"French → Mooré"` into a [`Direction`].
//! - [`engine_language_tag`] turns a [`LanguageCode`] into the tag a given
//!   engine understands.  Engines that cannot handle a language get an
//!   explicit substitute tag, flagged as such in the returned [`EngineTag`].
//!
//! | Engine        | French     | Mooré                    |
//! |---------------|------------|--------------------------|
//! | Transcription | `fr`       | `auto` (substitute)      |
//! | Translation   | `fra_Latn` | `mos_Latn`               |
//! | Synthesis     | `fr`       | `en` (substitute voice)  |

use thiserror::Error;

use crate::engine::EngineKind;

use super::{Direction, LanguageCode};

// ---------------------------------------------------------------------------
// ResolveError
// ---------------------------------------------------------------------------

/// Lookup failures of the direction table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The label is not one of the entries in [`DirectionResolver::labels`].
    #[error("unsupported translation direction: {0:?}")]
    UnsupportedDirection(String),
}

// ---------------------------------------------------------------------------
// DirectionResolver
// ---------------------------------------------------------------------------

/// Both supported directions, keyed by their display label.
const DIRECTIONS: [(&str, LanguageCode, LanguageCode); 2] = [
    ("French → Mooré", LanguageCode::French, LanguageCode::Moore),
    ("Mooré → French", LanguageCode::Moore, LanguageCode::French),
];

/// Static bidirectional direction table.
///
/// ```rust
/// use voice_translator::language::{DirectionResolver, LanguageCode};
///
/// let dir = DirectionResolver::resolve("Mooré → French").unwrap();
/// assert_eq!(dir.source(), LanguageCode::Moore);
/// assert_eq!(dir.target(), LanguageCode::French);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionResolver;

impl DirectionResolver {
    /// Resolve a direction label.
    ///
    /// Surrounding whitespace is ignored and `->` is accepted in place of
    /// `→`.  Anything else that is not in the table is a caller bug and
    /// fails with [`ResolveError::UnsupportedDirection`].
    pub fn resolve(label: &str) -> Result<Direction, ResolveError> {
        let normalized = label.trim().replace("->", "→");
        DIRECTIONS
            .iter()
            .find(|(l, _, _)| *l == normalized)
            .and_then(|&(_, source, target)| Direction::new(source, target).ok())
            .ok_or_else(|| ResolveError::UnsupportedDirection(label.to_string()))
    }

    /// Labels in table order, for populating a direction selector.
    pub fn labels() -> impl Iterator<Item = &'static str> {
        DIRECTIONS.iter().map(|(label, _, _)| *label)
    }

    /// All supported directions in table order.
    pub fn directions() -> Vec<Direction> {
        DIRECTIONS
            .iter()
            .filter_map(|&(_, source, target)| Direction::new(source, target).ok())
            .collect()
    }

    /// See [`engine_language_tag`].
    pub fn engine_language_tag(language: LanguageCode, kind: EngineKind) -> EngineTag {
        engine_language_tag(language, kind)
    }
}

// ---------------------------------------------------------------------------
// EngineTag
// ---------------------------------------------------------------------------

/// The language tag handed to one engine for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTag {
    /// Tag in the engine's own vocabulary.
    pub tag: &'static str,
    /// `true` when the engine has no native support for the language and
    /// `tag` names a stand-in.
    pub substitute: bool,
}

impl EngineTag {
    const fn direct(tag: &'static str) -> Self {
        Self {
            tag,
            substitute: false,
        }
    }

    const fn substitute(tag: &'static str) -> Self {
        Self {
            tag,
            substitute: true,
        }
    }
}

/// Map `language` to the tag expected by the engine of `kind`.
///
/// Whisper has no Mooré model, so Mooré speech is transcribed with language
/// detection (`"auto"`).  The synthesis engine has no Mooré voice and speaks
/// Mooré text with its English voice.
pub fn engine_language_tag(language: LanguageCode, kind: EngineKind) -> EngineTag {
    use EngineKind::*;
    use LanguageCode::*;

    match (kind, language) {
        (Transcription, French) => EngineTag::direct("fr"),
        (Transcription, Moore) => EngineTag::substitute("auto"),
        (Translation, French) => EngineTag::direct("fra_Latn"),
        (Translation, Moore) => EngineTag::direct("mos_Latn"),
        (Synthesis, French) => EngineTag::direct("fr"),
        (Synthesis, Moore) => EngineTag::substitute("en"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_direction_has_distinct_languages() {
        for label in DirectionResolver::labels() {
            let dir = DirectionResolver::resolve(label).unwrap();
            assert_ne!(dir.source(), dir.target(), "{label}");
        }
    }

    #[test]
    fn reverse_label_yields_swapped_pair() {
        let forward = DirectionResolver::resolve("French → Mooré").unwrap();
        let backward = DirectionResolver::resolve("Mooré → French").unwrap();
        assert_eq!(forward.reversed(), backward);
        assert_eq!(backward.source(), forward.target());
        assert_eq!(backward.target(), forward.source());
    }

    #[test]
    fn table_has_exactly_two_directions() {
        assert_eq!(DirectionResolver::directions().len(), 2);
        assert_eq!(DirectionResolver::labels().count(), 2);
    }

    #[test]
    fn ascii_arrow_and_whitespace_are_accepted() {
        let dir = DirectionResolver::resolve("  French -> Mooré ").unwrap();
        assert_eq!(dir.source(), LanguageCode::French);
    }

    #[test]
    fn unknown_label_is_unsupported() {
        let err = DirectionResolver::resolve("French → English").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsupportedDirection("French → English".into())
        );
    }

    #[test]
    fn label_round_trips_through_resolve() {
        for dir in DirectionResolver::directions() {
            assert_eq!(DirectionResolver::resolve(&dir.label()).unwrap(), dir);
        }
    }

    #[test]
    fn translation_tags_are_nllb_codes() {
        let fr = engine_language_tag(LanguageCode::French, EngineKind::Translation);
        let mos = engine_language_tag(LanguageCode::Moore, EngineKind::Translation);
        assert_eq!(fr, EngineTag::direct("fra_Latn"));
        assert_eq!(mos, EngineTag::direct("mos_Latn"));
    }

    #[test]
    fn moore_voice_is_an_explicit_substitute() {
        let tag = engine_language_tag(LanguageCode::Moore, EngineKind::Synthesis);
        assert_eq!(tag.tag, "en");
        assert!(tag.substitute);

        let fr = engine_language_tag(LanguageCode::French, EngineKind::Synthesis);
        assert_eq!(fr.tag, "fr");
        assert!(!fr.substitute);
    }

    #[test]
    fn moore_speech_uses_language_detection() {
        let tag = DirectionResolver::engine_language_tag(LanguageCode::Moore, EngineKind::Transcription);
        assert_eq!(tag, EngineTag::substitute("auto"));
    }
}
