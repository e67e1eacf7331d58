//! Search radius preferences expressed in a message ("walking distance",
//! "nearby", "within 8 km").
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Radius used when a message carries no distance cue.
pub const DEFAULT_RADIUS_METERS: u32 = 5_000;
/// Upper bound for any extracted radius.
pub const MAX_RADIUS_METERS: u32 = 20_000;
pub const WALKING_DISTANCE_METERS: u32 = 2_000;
pub const NEARBY_METERS: u32 = 3_000;

/// The phrasing a radius was derived from.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusCue {
    /// "walking distance", "very close"
    WalkingDistance,
    /// "nearby", "close"
    Nearby,
    /// "within N km"; the requested distance before capping
    WithinKilometers(f64),
}

impl fmt::Display for RadiusCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalkingDistance => f.write_str("walking distance"),
            Self::Nearby => f.write_str("nearby"),
            Self::WithinKilometers(km) => write!(f, "within {km} km"),
        }
    }
}

/// A radius, in meters within `[0, MAX_RADIUS_METERS]`, and the cue behind it.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusPreference {
    pub meters: u32,
    pub cue: RadiusCue,
}

static WALKING_DISTANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)walking distance|very close").expect("valid regex"));
static NEARBY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)nearby|close").expect("valid regex"));
static WITHIN_KILOMETERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)within\s+(\d+(?:\.\d+)?)\s*(?:km|kilomet(?:er|re)s?)").expect("valid regex")
});

type Rule = fn(&str) -> Option<RadiusPreference>;

/// Rules in priority order. The first one that matches decides.
const RULES: [Rule; 3] = [walking_distance, nearby, within_kilometers];

fn walking_distance(message: &str) -> Option<RadiusPreference> {
    WALKING_DISTANCE.is_match(message).then_some(RadiusPreference {
        meters: WALKING_DISTANCE_METERS,
        cue: RadiusCue::WalkingDistance,
    })
}

fn nearby(message: &str) -> Option<RadiusPreference> {
    NEARBY.is_match(message).then_some(RadiusPreference {
        meters: NEARBY_METERS,
        cue: RadiusCue::Nearby,
    })
}

fn within_kilometers(message: &str) -> Option<RadiusPreference> {
    let km: f64 = WITHIN_KILOMETERS
        .captures(message)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    // Float to int casts saturate, so absurd distances land on the cap.
    let meters = ((km * 1000.0).round() as u32).min(MAX_RADIUS_METERS);
    Some(RadiusPreference {
        meters,
        cue: RadiusCue::WithinKilometers(km),
    })
}

/// The radius a message asks for, or `None` when it carries no distance cue.
pub fn radius_preference(message: &str) -> Option<RadiusPreference> {
    let preference = RULES.iter().find_map(|rule| rule(message));
    trace!(?preference, "Radius preference");
    preference
}

/// The radius a message asks for in meters, [`DEFAULT_RADIUS_METERS`] when unspecified.
pub fn extract_radius(message: &str) -> u32 {
    radius_preference(message).map_or(DEFAULT_RADIUS_METERS, |p| p.meters)
}
