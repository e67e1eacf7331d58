//! Location intent resolution.
//!
//! [`LocationResolver`] turns a chat message into a [`LocationContext`] by
//! trying a fixed list of strategies against the [`Gazetteer`], stopping at the
//! first one that produces a match:
//!
//! 1. the whole message is a gazetteer key
//! 2. a two-word message, as-is or joined with "and" ("yonge dundas")
//! 3. a place phrase pulled out by the [phrase patterns](patterns::phrase_patterns),
//!    looked up exactly and then by substring containment
//!
//! Resolution never fails; a message without a recognisable place resolves to
//! `None`, which callers should treat as "ask the user where they are".
use std::{fmt, sync::Arc};

use rayon::prelude::*;
use streetbot_gazetteer::{Category, Coordinates};
use tracing::{debug, instrument, trace};

use crate::{
    gazetteer::{Gazetteer, GazetteerEntry, normalize},
    radius::DEFAULT_RADIUS_METERS,
};

pub mod patterns;

pub use patterns::{PhrasePattern, PhrasePatternKind, phrase_patterns};

/// Knobs for [`LocationResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Radius written into every resolved context, in meters
    pub default_radius_meters: u32,
    /// Fall back to substring containment when an extracted phrase is not a key
    pub substring_fallback: bool,
    /// Extracted phrases shorter than this (in characters) are ignored
    pub min_phrase_chars: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: DEFAULT_RADIUS_METERS,
            substring_fallback: true,
            min_phrase_chars: 1,
        }
    }
}

/// Where to search and what to echo back to the user.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LocationContext {
    pub coordinates: Coordinates,
    /// The matched gazetteer key
    pub address: String,
    /// Search radius in meters
    pub search_radius: u32,
}

impl fmt::Display for LocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) within {}m",
            self.address, self.coordinates, self.search_radius
        )
    }
}

/// The strategy that produced a match.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// The whole message is a key
    Direct,
    /// A two-word message with its whitespace collapsed
    Compound,
    /// A two-word message joined with "and"
    CompoundIntersection,
    /// A phrase pattern captured an exact key
    PatternExact(PhrasePatternKind),
    /// A phrase pattern captured text that contains, or is contained in, a key
    PatternContainment(PhrasePatternKind),
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Compound => f.write_str("compound"),
            Self::CompoundIntersection => f.write_str("compound-intersection"),
            Self::PatternExact(kind) => write!(f, "{kind}-exact"),
            Self::PatternContainment(kind) => write!(f, "{kind}-containment"),
        }
    }
}

/// A resolved location together with how it was found.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub context: LocationContext,
    pub strategy: MatchStrategy,
    /// Table the matched entry came from
    pub category: Category,
}

type Strategy = fn(&LocationResolver, &str) -> Option<(MatchStrategy, GazetteerEntry, String)>;

/// Strategies in precedence order. The first match wins.
const STRATEGIES: [(&str, Strategy); 3] = [
    ("direct", LocationResolver::direct_match),
    ("compound", LocationResolver::compound_match),
    ("phrase", LocationResolver::phrase_match),
];

/// Resolves chat messages against an injected gazetteer.
///
/// Cheap to clone; the gazetteer is shared.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    gazetteer: Arc<Gazetteer>,
    config: ResolveConfig,
}

impl LocationResolver {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self::with_config(gazetteer, ResolveConfig::default())
    }

    pub fn with_config(gazetteer: Arc<Gazetteer>, config: ResolveConfig) -> Self {
        Self { gazetteer, config }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolve `message` to a location, or `None` when no place is recognised.
    pub fn resolve(&self, message: &str) -> Option<LocationContext> {
        self.resolve_explained(message).map(|resolved| resolved.context)
    }

    /// Like [`resolve`](Self::resolve), also reporting the strategy and source category.
    #[instrument(name = "Resolve location", level = "debug", skip(self))]
    pub fn resolve_explained(&self, message: &str) -> Option<ResolvedLocation> {
        let (name, (strategy, entry, address)) = STRATEGIES
            .iter()
            .find_map(|(name, strategy)| strategy(self, message).map(|found| (*name, found)))?;

        debug!(%strategy, stage = name, %address, category = %entry.category, "Resolved location");
        Some(ResolvedLocation {
            context: LocationContext {
                coordinates: entry.coordinates,
                address,
                search_radius: self.config.default_radius_meters,
            },
            strategy,
            category: entry.category,
        })
    }

    /// Resolve many messages in parallel, keeping input order.
    pub fn resolve_batch<S>(&self, messages: &[S]) -> Vec<Option<LocationContext>>
    where
        S: AsRef<str> + Sync,
    {
        messages
            .par_iter()
            .map(|message| self.resolve(message.as_ref()))
            .collect()
    }

    fn direct_match(&self, message: &str) -> Option<(MatchStrategy, GazetteerEntry, String)> {
        let key = normalize(message);
        self.gazetteer
            .get_normalized(&key)
            .map(|entry| (MatchStrategy::Direct, entry.clone(), key))
    }

    fn compound_match(&self, message: &str) -> Option<(MatchStrategy, GazetteerEntry, String)> {
        let normalized = normalize(message);
        let mut words = normalized.split_whitespace();
        let (Some(first), Some(second), None) = (words.next(), words.next(), words.next()) else {
            return None;
        };

        [
            (MatchStrategy::Compound, format!("{first} {second}")),
            (MatchStrategy::CompoundIntersection, format!("{first} and {second}")),
        ]
        .into_iter()
        .find_map(|(strategy, key)| {
            self.gazetteer
                .get_normalized(&key)
                .map(|entry| (strategy, entry.clone(), key))
        })
    }

    fn phrase_match(&self, message: &str) -> Option<(MatchStrategy, GazetteerEntry, String)> {
        phrase_patterns().iter().find_map(|pattern| {
            let phrase = pattern.extract(message)?;
            trace!(kind = %pattern.kind, phrase, "Phrase pattern matched");
            self.match_phrase(pattern.kind, phrase)
        })
    }

    fn match_phrase(
        &self,
        kind: PhrasePatternKind,
        phrase: &str,
    ) -> Option<(MatchStrategy, GazetteerEntry, String)> {
        let phrase = patterns::normalize_phrase(phrase);
        if phrase.is_empty() || phrase.chars().count() < self.config.min_phrase_chars {
            return None;
        }

        if let Some(entry) = self.gazetteer.get_normalized(&phrase) {
            return Some((MatchStrategy::PatternExact(kind), entry.clone(), phrase));
        }
        if !self.config.substring_fallback {
            return None;
        }
        self.gazetteer.find_containing(&phrase).map(|entry| {
            (
                MatchStrategy::PatternContainment(kind),
                entry.clone(),
                entry.key.clone(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetbot_gazetteer::{CategoryTable, GazetteerRecord};

    fn table(category: Category, rows: &[(&str, f64, f64)]) -> CategoryTable {
        CategoryTable {
            category,
            records: rows
                .iter()
                .map(|&(name, lat, lng)| GazetteerRecord {
                    name: name.to_string(),
                    coordinates: Coordinates { lat, lng },
                })
                .collect(),
        }
    }

    fn small_gazetteer() -> Arc<Gazetteer> {
        Arc::new(
            Gazetteer::builder()
                .table(table(
                    Category::Intersection,
                    &[
                        ("yonge and dundas", 43.6561, -79.3802),
                        ("jane and finch", 43.7568, -79.5188),
                        ("bay and bloor", 43.6701, -79.3900),
                    ],
                ))
                .table(table(
                    Category::TransitStop,
                    &[
                        ("kipling station", 43.6373, -79.5362),
                        ("union station", 43.6453, -79.3806),
                        ("st andrew", 43.6476, -79.3848),
                    ],
                ))
                .table(table(Category::Park, &[("moss park", 43.6554, -79.3677)]))
                .build()
                .unwrap(),
        )
    }

    fn resolver() -> LocationResolver {
        LocationResolver::new(small_gazetteer())
    }

    #[test]
    fn test_direct_match() {
        let resolved = resolver().resolve_explained("  Kipling Station ").unwrap();
        assert_eq!(resolved.strategy, MatchStrategy::Direct);
        assert_eq!(resolved.context.address, "kipling station");
        assert_eq!(resolved.context.search_radius, 5000);
        assert_eq!(resolved.category, Category::TransitStop);
    }

    #[test]
    fn test_compound_match_inserts_and() {
        let resolved = resolver().resolve_explained("Jane Finch").unwrap();
        assert_eq!(resolved.strategy, MatchStrategy::CompoundIntersection);
        assert_eq!(resolved.context.address, "jane and finch");
        assert_eq!(
            resolved.context.coordinates,
            Coordinates { lat: 43.7568, lng: -79.5188 }
        );
    }

    #[test]
    fn test_compound_match_collapses_whitespace() {
        let resolved = resolver().resolve_explained("union \t station").unwrap();
        assert_eq!(resolved.strategy, MatchStrategy::Compound);
        assert_eq!(resolved.context.address, "union station");
    }

    #[test]
    fn test_pattern_exact_match() {
        let resolved = resolver()
            .resolve_explained("I need help near yonge and dundas")
            .unwrap();
        assert_eq!(
            resolved.strategy,
            MatchStrategy::PatternExact(PhrasePatternKind::Preposition)
        );
        assert_eq!(resolved.context.address, "yonge and dundas");
        assert_eq!(
            resolved.context.coordinates,
            Coordinates { lat: 43.6561, lng: -79.3802 }
        );
    }

    #[test]
    fn test_pattern_containment_match_echoes_key() {
        let resolved = resolver()
            .resolve_explained("is there a shelter near the union station entrance")
            .unwrap();
        assert_eq!(
            resolved.strategy,
            MatchStrategy::PatternContainment(PhrasePatternKind::Preposition)
        );
        assert_eq!(resolved.context.address, "union station");
    }

    #[test]
    fn test_containment_prefers_iteration_order() {
        // No intersection key overlaps the phrase, so the first containing key is a station.
        let resolved = resolver().resolve("I'm at st andrew and bay").unwrap();
        assert_eq!(resolved.address, "st andrew");

        // Both keys are contained in the phrase; the earlier category wins.
        let resolved = resolver()
            .resolve("meet me at moss park by bay and bloor")
            .unwrap();
        assert_eq!(resolved.address, "bay and bloor");
    }

    #[test]
    fn test_later_patterns_are_tried_when_earlier_ones_do_not_resolve() {
        // The preposition pattern captures "trouble" and finds nothing; the
        // proximity pattern then captures the place.
        let resolved = resolver()
            .resolve_explained("I'm in trouble, closest shelter to kipling station?")
            .unwrap();
        assert_eq!(resolved.context.address, "kipling station");
        assert_eq!(
            resolved.strategy,
            MatchStrategy::PatternExact(PhrasePatternKind::Proximity)
        );
    }

    #[test]
    fn test_no_location() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("I need food"), None);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("   "), None);
        assert_eq!(resolver.resolve("I'm at mississauga"), None);
    }

    #[test]
    fn test_substring_fallback_can_be_disabled() {
        let strict = LocationResolver::with_config(
            small_gazetteer(),
            ResolveConfig {
                substring_fallback: false,
                ..ResolveConfig::default()
            },
        );
        assert_eq!(strict.resolve("near the union station entrance"), None);
        assert!(strict.resolve("near union station").is_some());
    }

    #[test]
    fn test_min_phrase_chars_ignores_short_phrases() {
        let resolver = LocationResolver::with_config(
            small_gazetteer(),
            ResolveConfig {
                min_phrase_chars: 4,
                ..ResolveConfig::default()
            },
        );
        // "bay" alone would be contained in "bay and bloor".
        assert_eq!(resolver.resolve("I'm at bay"), None);
        assert!(LocationResolver::new(small_gazetteer()).resolve("I'm at bay").is_some());
    }

    #[test]
    fn test_default_radius_comes_from_config() {
        let resolver = LocationResolver::with_config(
            small_gazetteer(),
            ResolveConfig {
                default_radius_meters: 2500,
                ..ResolveConfig::default()
            },
        );
        assert_eq!(resolver.resolve("moss park").unwrap().search_radius, 2500);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = resolver();
        for message in ["near union station", "Jane Finch", "I need food", "I'm at bay"] {
            assert_eq!(resolver.resolve(message), resolver.resolve(message));
        }
    }

    #[test]
    fn test_resolve_batch_keeps_order() {
        let results = resolver().resolve_batch(&["moss park", "I need food", "near union station"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().address, "moss park");
        assert!(results[1].is_none());
        assert_eq!(results[2].as_ref().unwrap().address, "union station");
    }
}
