//! Languages and translation directions.
//!
//! [`LanguageCode`] is the closed set of languages the translator works
//! with.  A [`Direction`] is an ordered `(source, target)` pair whose two
//! ends always differ; the only way to obtain one is [`Direction::new`] or
//! the [`DirectionResolver`] table.
//!
//! ```rust
//! use voice_translator::language::{Direction, LanguageCode};
//!
//! let dir = Direction::new(LanguageCode::French, LanguageCode::Moore).unwrap();
//! assert_eq!(dir.reversed().source(), LanguageCode::Moore);
//! assert!(Direction::new(LanguageCode::French, LanguageCode::French).is_err());
//! ```

pub mod resolver;

pub use resolver::{DirectionResolver, EngineTag, ResolveError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// LanguageCode
// ---------------------------------------------------------------------------

/// A language the pipeline can translate from or into.
///
/// Adding a variant forces every engine tag mapping in
/// [`engine_language_tag`](resolver::engine_language_tag) to be extended
/// (the match is exhaustive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageCode {
    /// French.
    French,
    /// Mooré (Moore), spoken in Burkina Faso.
    Moore,
}

impl LanguageCode {
    /// Every supported language, in table order.
    pub const ALL: [LanguageCode; 2] = [LanguageCode::French, LanguageCode::Moore];

    /// Display name used in direction labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageCode::French => "French",
            LanguageCode::Moore => "Mooré",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Returned when a direction would translate a language into itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("source and target language are both {0}")]
pub struct DirectionError(pub LanguageCode);

/// An ordered `(source, target)` language pair with `source != target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDirection", into = "RawDirection")]
pub struct Direction {
    source: LanguageCode,
    target: LanguageCode,
}

impl Direction {
    /// Build a direction, rejecting identical source and target.
    pub fn new(source: LanguageCode, target: LanguageCode) -> Result<Self, DirectionError> {
        if source == target {
            return Err(DirectionError(source));
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> LanguageCode {
        self.source
    }

    pub fn target(&self) -> LanguageCode {
        self.target
    }

    /// The same pair translated the other way round.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }

    /// User-facing label, e.g. `"French → Mooré"`.
    pub fn label(&self) -> String {
        format!("{} → {}", self.source, self.target)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}

#[derive(Serialize, Deserialize)]
struct RawDirection {
    source: LanguageCode,
    target: LanguageCode,
}

impl TryFrom<RawDirection> for Direction {
    type Error = DirectionError;

    fn try_from(raw: RawDirection) -> Result<Self, Self::Error> {
        Direction::new(raw.source, raw.target)
    }
}

impl From<Direction> for RawDirection {
    fn from(dir: Direction) -> Self {
        Self {
            source: dir.source,
            target: dir.target,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
