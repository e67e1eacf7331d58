//! The [`ServiceLocator`] facade.
//!
//! It ties the pieces together for a chat turn: resolve the place a message
//! mentions, read the radius it asks for, and widen a nearest-neighbor search
//! around that place until enough services turn up.
//!
//! ```rust
//! use streetbot::ServiceLocator;
//!
//! let locator = ServiceLocator::new_embedded()?;
//!
//! let location = locator.locate("food banks near yonge and dundas").unwrap();
//! assert_eq!(location.address, "yonge and dundas");
//! assert_eq!(location.search_radius, 5000);
//!
//! let location = locator.locate("I'm at union station, anything within walking distance").unwrap();
//! assert_eq!(location.search_radius, 2000);
//! # Ok::<(), streetbot::error::StreetbotError>(())
//! ```
use std::sync::Arc;

use streetbot_gazetteer::{Category, EmbeddedMetadata, GazetteerSource, METADATA};
use tracing::{info, instrument};

use crate::{
    error::StreetbotError,
    format::format_location_response,
    gazetteer::{Gazetteer, GazetteerConfig},
    radius::{self, radius_preference},
    resolve::{LocationContext, LocationResolver, ResolveConfig, ResolvedLocation},
    search::{ExpandConfig, ExpansionOutcome, NearestNeighborQuery, ProgressiveSearch, ServiceRecord},
};

/// Settings for every stage of a [`ServiceLocator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatorConfig {
    /// How the gazetteer tables are merged
    pub gazetteer: GazetteerConfig,
    /// How messages are matched against the gazetteer
    pub resolve: ResolveConfig,
    /// Radii and limits for the service search
    pub expand: ExpandConfig,
}

/// Resolves chat messages to places and finds services around them.
#[derive(Debug, Clone)]
pub struct ServiceLocator {
    resolver: LocationResolver,
    config: LocatorConfig,
    source: Option<GazetteerSource>,
}

impl ServiceLocator {
    /// Create a `ServiceLocator` from the bundled Toronto gazetteer.
    #[instrument(name = "Create ServiceLocator with Embedded Data", level = "info")]
    pub fn new_embedded() -> Result<Self, StreetbotError> {
        Self::initialize(GazetteerSource::Embedded)
    }

    /// Create a `ServiceLocator` from `source` with default settings.
    pub fn initialize(source: GazetteerSource) -> Result<Self, StreetbotError> {
        Self::with_config(source, LocatorConfig::default())
    }

    /// Create a `ServiceLocator` from the source named by `STREETBOT_GAZETTEER_DIR`,
    /// falling back to the bundled tables.
    pub fn from_env() -> Result<Self, StreetbotError> {
        Self::initialize(GazetteerSource::from_env())
    }

    #[instrument(name = "Initialize ServiceLocator", level = "info", skip(config))]
    pub fn with_config(
        source: GazetteerSource,
        config: LocatorConfig,
    ) -> Result<Self, StreetbotError> {
        let t_init = std::time::Instant::now();

        let gazetteer = Gazetteer::load(&source, &config.gazetteer)?;

        info!(
            elapsed_seconds = ?t_init.elapsed(),
            locations = gazetteer.len(),
            "ServiceLocator initialization complete"
        );

        let mut locator = Self::from_gazetteer(Arc::new(gazetteer), config);
        locator.source = Some(source);
        Ok(locator)
    }

    /// Create a `ServiceLocator` around an already built gazetteer.
    ///
    /// The gazetteer settings in `config` are not applied; the gazetteer is used as is.
    pub fn from_gazetteer(gazetteer: Arc<Gazetteer>, config: LocatorConfig) -> Self {
        Self {
            resolver: LocationResolver::with_config(gazetteer, config.resolve.clone()),
            config,
            source: None,
        }
    }

    /// Resolve `message` and size the search radius from any distance cue in it.
    ///
    /// Without a cue the configured default radius is kept.
    pub fn locate(&self, message: &str) -> Option<LocationContext> {
        let mut location = self.resolver.resolve(message)?;
        if let Some(preference) = radius_preference(message) {
            location.search_radius = preference.meters;
        }
        Some(location)
    }

    pub fn resolve(&self, message: &str) -> Option<LocationContext> {
        self.resolver.resolve(message)
    }

    pub fn resolve_explained(&self, message: &str) -> Option<ResolvedLocation> {
        self.resolver.resolve_explained(message)
    }

    pub fn resolve_batch<S>(&self, messages: &[S]) -> Vec<Option<LocationContext>>
    where
        S: AsRef<str> + Sync,
    {
        self.resolver.resolve_batch(messages)
    }

    /// The radius `message` asks for, in meters.
    pub fn extract_radius(&self, message: &str) -> u32 {
        radius::extract_radius(message)
    }

    /// Search around `location`, starting at its `search_radius` and widening
    /// through the configured steps above it.
    ///
    /// `min_results` defaults to the configured threshold.
    pub async fn search_near<Q>(
        &self,
        query: &Q,
        location: &LocationContext,
        min_results: Option<usize>,
    ) -> ExpansionOutcome
    where
        Q: NearestNeighborQuery + ?Sized,
    {
        ProgressiveSearch::with_config(query, self.config.expand.clone())
            .expand_from(
                location.coordinates,
                location.search_radius,
                min_results.unwrap_or(self.config.expand.min_results),
            )
            .await
    }

    /// Locate `message` and search around it. `None` when no place is recognised.
    #[instrument(name = "Find services", level = "info", skip(self, query))]
    pub async fn find_services<Q>(
        &self,
        query: &Q,
        message: &str,
    ) -> Option<(LocationContext, Vec<ServiceRecord>)>
    where
        Q: NearestNeighborQuery + ?Sized,
    {
        let location = self.locate(message)?;
        let outcome = self.search_near(query, &location, None).await;
        Some((location, outcome.records))
    }

    /// The chat reply for `message`, or `None` when no place is recognised.
    ///
    /// An empty reply names the widest radius that was searched.
    pub async fn respond<Q>(&self, query: &Q, message: &str) -> Option<String>
    where
        Q: NearestNeighborQuery + ?Sized,
    {
        let mut location = self.locate(message)?;
        let outcome = self.search_near(query, &location, None).await;
        if outcome.records.is_empty() {
            location.search_radius = outcome.last_radius().unwrap_or(location.search_radius);
        }
        Some(format_location_response(&outcome.records, &location))
    }

    /// Get information about the loaded gazetteer.
    pub fn info(&self) -> LocatorInfo {
        let gazetteer = self.gazetteer();
        LocatorInfo {
            source: self.source.clone(),
            metadata: METADATA.clone(),
            total_locations: gazetteer.len(),
            source_rows: gazetteer.source_rows(),
            category_counts: gazetteer.category_counts(),
            collisions: gazetteer.collisions().len(),
        }
    }

    // === Utility Methods ===

    pub fn gazetteer(&self) -> &Gazetteer {
        self.resolver.gazetteer()
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }
}

/// Information about a `ServiceLocator`'s gazetteer.
#[derive(Debug, Clone)]
pub struct LocatorInfo {
    /// `None` when the locator was built from a ready gazetteer
    pub source: Option<GazetteerSource>,
    pub metadata: EmbeddedMetadata,
    /// Distinct keys after merging
    pub total_locations: usize,
    /// Rows read before merging
    pub source_rows: usize,
    pub category_counts: Vec<(Category, usize)>,
    pub collisions: usize,
}

impl LocatorInfo {
    /// Get a human-readable summary of the locator.
    pub fn summary(&self) -> String {
        let source = match &self.source {
            Some(GazetteerSource::Embedded) => {
                format!("embedded {} v{}", self.metadata.region, self.metadata.version)
            }
            Some(GazetteerSource::Directory(dir)) => dir.display().to_string(),
            None => "prebuilt gazetteer".to_string(),
        };
        format!(
            "ServiceLocator using {source} with {} locations from {} rows ({} duplicate keys)",
            self.total_locations, self.source_rows, self.collisions
        )
    }

    pub fn is_embedded(&self) -> bool {
        self.source == Some(GazetteerSource::Embedded)
    }
}
