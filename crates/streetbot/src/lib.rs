//! StreetBot - Location Intent Resolution for Service Search
//!
//! StreetBot reads a free-form chat message ("I need a shelter near Yonge and
//! Dundas", "I'm at Kipling station"), recognises the Toronto place it mentions,
//! and turns it into coordinates plus a search radius. Around that point it runs a
//! widening nearest-neighbor search over an external service directory.
//!
//! # Quick Start
//!
//! ```rust
//! use streetbot::ServiceLocator;
//!
//! // Create a locator using the bundled Toronto gazetteer
//! let locator = ServiceLocator::new_embedded()?;
//!
//! let location = locator.locate("I need help near yonge and dundas").unwrap();
//! println!("Searching {} around {}", location.search_radius, location.coordinates);
//!
//! // Messages without a recognisable place resolve to nothing
//! assert!(locator.locate("I need food").is_none());
//!
//! // Distance cues size the radius
//! assert_eq!(locator.extract_radius("within 8 km"), 8000);
//! # Ok::<(), streetbot::error::StreetbotError>(())
//! ```
//!
//! # Features
//!
//! - **Layered matching**: whole-message keys, two-word intersections, then
//!   phrase patterns with exact and substring lookup
//! - **Radius cues**: "walking distance", "nearby", "within N km"
//! - **Progressive search**: widen the radius until enough services are found,
//!   against any [`NearestNeighborQuery`]
//! - **Batch resolution** in parallel
//! - `rpc` feature: a Supabase REST client for the service search
//!
//! # Data
//!
//! The Toronto gazetteer (intersections, TTC stations, hospitals, shelters,
//! landmarks and more) is compiled into the `streetbot-gazetteer` crate. Set
//! `STREETBOT_GAZETTEER_DIR` to load the same tables from a directory instead.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
pub mod error;
mod format;
pub mod gazetteer;
pub mod radius;
pub mod resolve;
pub mod search;

pub use crate::core::{LocatorConfig, LocatorInfo, ServiceLocator};

pub use config::LocatorConfigBuilder;
pub use format::format_location_response;
pub use gazetteer::{CollisionPolicy, Gazetteer, GazetteerConfig, GazetteerEntry, KeyCollision};
pub use radius::{RadiusCue, RadiusPreference, extract_radius, radius_preference};
pub use resolve::{
    LocationContext, LocationResolver, MatchStrategy, ResolveConfig, ResolvedLocation,
};
pub use search::{
    ExpandConfig, ExpansionOutcome, NearestNeighborQuery, ProgressiveSearch, QueryError,
    ServiceRecord, expand,
};
pub use streetbot_gazetteer as data;
pub use streetbot_gazetteer::{Category, Coordinates, GazetteerSource};

#[cfg(feature = "rpc")]
pub use search::rpc::SupabaseRpcClient;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the StreetBot library.
///
/// Call this once at the start of your application. `RUST_LOG` takes precedence
/// over `level` when it is set.
///
/// ```rust
/// use streetbot::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), streetbot::error::StreetbotError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::StreetbotError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?)
            .add_directive("hyper_util=warn".parse()?);

        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
        Ok(())
    })
}
