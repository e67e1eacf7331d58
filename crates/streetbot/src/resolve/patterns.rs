//! Ordered phrase patterns used to pull a place mention out of a longer message.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Which phrasing a pattern recognises.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhrasePatternKind {
    /// "near / at / around / in <place>"
    Preposition,
    /// "I'm at / I am / located near <place>"
    SelfLocated,
    /// "services / help / shelters / food banks near <place>"
    ServiceRequest,
    /// "closest <thing> to <place>"
    Proximity,
}

impl fmt::Display for PhrasePatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preposition => "preposition",
            Self::SelfLocated => "self-located",
            Self::ServiceRequest => "service-request",
            Self::Proximity => "proximity",
        })
    }
}

/// A regex plus the capture group holding the place phrase.
#[derive(Debug)]
pub struct PhrasePattern {
    pub kind: PhrasePatternKind,
    regex: Regex,
    group: usize,
}

impl PhrasePattern {
    fn new(kind: PhrasePatternKind, pattern: &str, group: usize) -> Self {
        Self {
            kind,
            regex: Regex::new(pattern).expect("Phrase pattern should compile"),
            group,
        }
    }

    /// The raw phrase this pattern captures from `message`, if it matches.
    pub fn extract<'m>(&self, message: &'m str) -> Option<&'m str> {
        self.regex
            .captures(message)
            .and_then(|caps| caps.get(self.group))
            .map(|m| m.as_str())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

// Phrases run to the next comma or period.
static PHRASE_PATTERNS: Lazy<[PhrasePattern; 4]> = Lazy::new(|| {
    [
        PhrasePattern::new(
            PhrasePatternKind::Preposition,
            r"(?i)\b(?:near|at|around|in)\s+([^,.]+)",
            1,
        ),
        PhrasePattern::new(
            PhrasePatternKind::SelfLocated,
            r"(?i)\b(?:i['’]?m|i\s+am|located)\s+(?:(?:at|near|around)\s+)?([^,.]+)",
            1,
        ),
        PhrasePattern::new(
            PhrasePatternKind::ServiceRequest,
            r"(?i)\b(?:services|help|resources|shelters?|food\s+banks?)\s+(?:near|around|at|in)\s+([^,.]+)",
            1,
        ),
        PhrasePattern::new(
            PhrasePatternKind::Proximity,
            r"(?i)\b(?:closest|nearest|nearby)\s+(.*?)\b(?:to|from|at|near)\s+([^,.]+)",
            2,
        ),
    ]
});

/// Patterns in evaluation order.
pub fn phrase_patterns() -> &'static [PhrasePattern] {
    PHRASE_PATTERNS.as_slice()
}

/// Trim a captured phrase down to a lookup key.
///
/// Trailing sentence punctuation other than the comma/period terminators is
/// dropped as well, so "union station?" looks up "union station".
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .trim()
        .trim_end_matches(['?', '!', ';', ':'])
        .trim()
        .to_lowercase()
}
