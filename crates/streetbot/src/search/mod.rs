//! Progressive radius expansion against an external nearest-neighbor service.
//!
//! The ranking itself lives outside this crate, behind [`NearestNeighborQuery`].
//! [`ProgressiveSearch`] only decides which radii to ask for: it walks an
//! ascending list of radii and stops at the first one that returns enough
//! services.
use std::sync::Arc;

use async_trait::async_trait;
use streetbot_gazetteer::Coordinates;
use tracing::{debug, info, instrument, warn};

pub use error::QueryError;

#[cfg(feature = "rpc")]
pub mod rpc;

/// Radii tried, in order, in meters.
pub const DEFAULT_RADIUS_STEPS: [u32; 5] = [1_000, 2_500, 5_000, 10_000, 20_000];
/// Result cap passed to every query.
pub const DEFAULT_MAX_RESULTS: u32 = 20;
/// Results needed before the expansion stops.
pub const DEFAULT_MIN_RESULTS: usize = 5;

/// A service returned by the nearest-neighbor query.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRecord {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_province: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// Distance from the query point in meters
    #[cfg_attr(feature = "serde", serde(deserialize_with = "number_or_text"))]
    pub distance_meters: Option<f64>,
    /// Distance from the query point in kilometers
    #[cfg_attr(feature = "serde", serde(deserialize_with = "number_or_text"))]
    pub distance_km: Option<f64>,
}

/// Distances come back as numbers or as text such as `"0.8"` or `"0.8 km"`.
/// Text without a leading number reads as no distance.
#[cfg(feature = "serde")]
fn number_or_text<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Distance {
        Number(f64),
        Text(String),
    }

    let distance = <Option<Distance> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(distance.and_then(|d| match d {
        Distance::Number(value) => Some(value),
        Distance::Text(text) => leading_number(&text),
    }))
}

#[cfg(feature = "serde")]
fn leading_number(text: &str) -> Option<f64> {
    text.trim()
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .next()
        .and_then(|number| number.parse().ok())
}

impl ServiceRecord {
    /// Distance in kilometers, derived from meters when only those are present.
    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
            .or_else(|| self.distance_meters.map(|m| m / 1000.0))
    }
}

/// An external nearest-neighbor search over services.
///
/// Implementations own their own timeout and cancellation policy.
#[async_trait]
pub trait NearestNeighborQuery: Send + Sync {
    async fn query(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        max_results: u32,
    ) -> Result<Vec<ServiceRecord>, QueryError>;
}

#[async_trait]
impl<Q: NearestNeighborQuery + ?Sized> NearestNeighborQuery for Arc<Q> {
    async fn query(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        max_results: u32,
    ) -> Result<Vec<ServiceRecord>, QueryError> {
        (**self).query(coordinates, radius_meters, max_results).await
    }
}

#[async_trait]
impl<Q: NearestNeighborQuery + ?Sized> NearestNeighborQuery for &Q {
    async fn query(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        max_results: u32,
    ) -> Result<Vec<ServiceRecord>, QueryError> {
        (**self).query(coordinates, radius_meters, max_results).await
    }
}

/// Radii and limits for [`ProgressiveSearch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandConfig {
    /// Strictly ascending radii, in meters
    pub radius_steps: Vec<u32>,
    pub max_results: u32,
    /// Threshold used by callers that do not pass their own
    pub min_results: usize,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            radius_steps: DEFAULT_RADIUS_STEPS.to_vec(),
            max_results: DEFAULT_MAX_RESULTS,
            min_results: DEFAULT_MIN_RESULTS,
        }
    }
}

/// What happened at one radius.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Found(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepAttempt {
    pub radius_meters: u32,
    pub result: StepResult,
}

/// Records found plus the trail of radii tried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionOutcome {
    pub records: Vec<ServiceRecord>,
    /// Radius that met the threshold, `None` when every step fell short
    pub radius_meters: Option<u32>,
    pub attempts: Vec<StepAttempt>,
}

impl ExpansionOutcome {
    pub fn is_satisfied(&self) -> bool {
        self.radius_meters.is_some()
    }

    /// Largest radius queried, `None` when nothing was tried.
    pub fn last_radius(&self) -> Option<u32> {
        self.attempts.last().map(|attempt| attempt.radius_meters)
    }
}

/// Widens the search radius step by step until enough services are found.
#[derive(Debug, Clone)]
pub struct ProgressiveSearch<Q> {
    query: Q,
    config: ExpandConfig,
}

impl<Q: NearestNeighborQuery> ProgressiveSearch<Q> {
    pub fn new(query: Q) -> Self {
        Self::with_config(query, ExpandConfig::default())
    }

    pub fn with_config(query: Q, config: ExpandConfig) -> Self {
        Self { query, config }
    }

    pub fn config(&self) -> &ExpandConfig {
        &self.config
    }

    /// Services around `coordinates`, from the smallest radius that yields at
    /// least `min_results` of them. Empty when no radius does.
    pub async fn expand(&self, coordinates: Coordinates, min_results: usize) -> Vec<ServiceRecord> {
        self.expand_with_outcome(coordinates, min_results)
            .await
            .records
    }

    /// Like [`expand`](Self::expand), also reporting every radius tried.
    ///
    /// Steps run one after another. A failed step counts as zero results and is
    /// not retried; the expansion moves on to the next radius.
    pub async fn expand_with_outcome(
        &self,
        coordinates: Coordinates,
        min_results: usize,
    ) -> ExpansionOutcome {
        self.run(coordinates, self.config.radius_steps.clone(), min_results)
            .await
    }

    /// Expand starting at `radius_meters`, then through the configured steps
    /// larger than it.
    pub async fn expand_from(
        &self,
        coordinates: Coordinates,
        radius_meters: u32,
        min_results: usize,
    ) -> ExpansionOutcome {
        self.run(coordinates, self.radii_from(radius_meters), min_results)
            .await
    }

    /// `radius_meters` followed by every configured step above it.
    pub fn radii_from(&self, radius_meters: u32) -> Vec<u32> {
        std::iter::once(radius_meters)
            .chain(
                self.config
                    .radius_steps
                    .iter()
                    .copied()
                    .filter(|&step| step > radius_meters),
            )
            .collect()
    }

    #[instrument(name = "Progressive search", level = "info", skip(self))]
    async fn run(
        &self,
        coordinates: Coordinates,
        radii: Vec<u32>,
        min_results: usize,
    ) -> ExpansionOutcome {
        let mut attempts = Vec::with_capacity(radii.len());

        for radius_meters in radii {
            match self
                .query
                .query(coordinates, radius_meters, self.config.max_results)
                .await
            {
                Ok(records) => {
                    debug!(radius_meters, found = records.len(), "Search step finished");
                    attempts.push(StepAttempt {
                        radius_meters,
                        result: StepResult::Found(records.len()),
                    });
                    if records.len() >= min_results {
                        info!(
                            radius_meters,
                            found = records.len(),
                            "Found enough services"
                        );
                        return ExpansionOutcome {
                            records,
                            radius_meters: Some(radius_meters),
                            attempts,
                        };
                    }
                }
                Err(e) => {
                    warn!(radius_meters, error = %e, "Search step failed, widening radius");
                    attempts.push(StepAttempt {
                        radius_meters,
                        result: StepResult::Failed(e.to_string()),
                    });
                }
            }
        }

        info!(min_results, "No radius returned enough services");
        ExpansionOutcome {
            records: Vec::new(),
            radius_meters: None,
            attempts,
        }
    }
}

/// Expand with the default radius steps and result cap.
pub async fn expand<Q: NearestNeighborQuery>(
    query: Q,
    coordinates: Coordinates,
    min_results: usize,
) -> Vec<ServiceRecord> {
    ProgressiveSearch::new(query)
        .expand(coordinates, min_results)
        .await
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum QueryError {
        #[cfg(feature = "rpc")]
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("Search service returned {status}: {message}")]
        Rpc { status: u16, message: String },
        #[error("Search service not configured: {0}")]
        NotConfigured(String),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
}
