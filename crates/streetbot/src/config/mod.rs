use itertools::Itertools;
use streetbot_gazetteer::Category;

use crate::{
    core::LocatorConfig,
    error::StreetbotError,
    gazetteer::CollisionPolicy,
    radius::MAX_RADIUS_METERS,
};

/// Builder for creating locator configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct LocatorConfigBuilder {
    config: LocatorConfig,
}

impl LocatorConfigBuilder {
    /// Create a new builder with the default Toronto settings
    pub fn new() -> Self {
        Self {
            config: LocatorConfig::default(),
        }
    }

    /// Create a builder that refuses ambiguous data and loose phrase matches
    ///
    /// Conflicting duplicate keys fail the load, captured phrases must match a
    /// key exactly, and phrases shorter than three characters are ignored.
    pub fn strict() -> Self {
        let mut builder = Self::new();
        builder.config.gazetteer.collision_policy = CollisionPolicy::RejectConflicting;
        builder.config.resolve.substring_fallback = false;
        builder.config.resolve.min_phrase_chars = 3;
        builder
    }

    /// Set the table merge order, which is also the containment priority
    pub fn category_order(mut self, order: impl IntoIterator<Item = Category>) -> Self {
        self.config.gazetteer.category_order = order.into_iter().collect();
        self
    }

    /// Set how duplicate keys across tables are handled
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.gazetteer.collision_policy = policy;
        self
    }

    /// Set the radius attached to resolved locations, in meters
    pub fn default_radius(mut self, meters: u32) -> Self {
        self.config.resolve.default_radius_meters = meters;
        self
    }

    /// Enable or disable substring matching of extracted phrases
    pub fn substring_fallback(mut self, enabled: bool) -> Self {
        self.config.resolve.substring_fallback = enabled;
        self
    }

    /// Ignore extracted phrases shorter than `chars` characters
    pub fn min_phrase_chars(mut self, chars: usize) -> Self {
        self.config.resolve.min_phrase_chars = chars;
        self
    }

    /// Set the radii tried by the expander, in meters
    pub fn radius_steps(mut self, steps: impl IntoIterator<Item = u32>) -> Self {
        self.config.expand.radius_steps = steps.into_iter().collect();
        self
    }

    /// Set the result cap for each expander query
    pub fn max_results(mut self, max: u32) -> Self {
        self.config.expand.max_results = max;
        self
    }

    /// Set how many services the expander looks for by default
    pub fn min_results(mut self, min: usize) -> Self {
        self.config.expand.min_results = min;
        self
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<LocatorConfig, StreetbotError> {
        let config = self.config;

        let order = &config.gazetteer.category_order;
        if order.is_empty() {
            return Err(StreetbotError::ConfigError(
                "Category order must list at least one category".into(),
            ));
        }
        if let Some(category) = order.iter().duplicates().next() {
            return Err(StreetbotError::ConfigError(format!(
                "Category {category} is listed more than once"
            )));
        }

        if config.resolve.default_radius_meters > MAX_RADIUS_METERS {
            return Err(StreetbotError::ConfigError(format!(
                "Default radius {}m exceeds the {MAX_RADIUS_METERS}m maximum",
                config.resolve.default_radius_meters
            )));
        }

        let steps = &config.expand.radius_steps;
        if steps.is_empty() {
            return Err(StreetbotError::ConfigError(
                "At least one radius step is required".into(),
            ));
        }
        if !steps.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(StreetbotError::ConfigError(format!(
                "Radius steps must be strictly ascending, got {steps:?}"
            )));
        }
        if config.expand.max_results == 0 {
            return Err(StreetbotError::ConfigError(
                "Max results must be greater than zero".into(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::DEFAULT_RADIUS_STEPS;

    #[test]
    fn test_default_build() {
        let config = LocatorConfigBuilder::new().build().unwrap();
        assert_eq!(config, LocatorConfig::default());
        assert_eq!(config.expand.radius_steps, DEFAULT_RADIUS_STEPS);
        assert_eq!(config.expand.max_results, 20);
        assert_eq!(config.expand.min_results, 5);
        assert_eq!(config.resolve.default_radius_meters, 5000);
        assert_eq!(config.gazetteer.category_order, Category::ALL);
    }

    #[test]
    fn test_strict_preset() {
        let config = LocatorConfigBuilder::strict().build().unwrap();
        assert_eq!(
            config.gazetteer.collision_policy,
            CollisionPolicy::RejectConflicting
        );
        assert!(!config.resolve.substring_fallback);
        assert_eq!(config.resolve.min_phrase_chars, 3);
    }

    #[test]
    fn test_setters() {
        let config = LocatorConfigBuilder::new()
            .category_order([Category::TransitStop, Category::Intersection])
            .default_radius(2500)
            .substring_fallback(false)
            .radius_steps([500, 1000])
            .max_results(10)
            .min_results(2)
            .build()
            .unwrap();

        assert_eq!(
            config.gazetteer.category_order,
            [Category::TransitStop, Category::Intersection]
        );
        assert_eq!(config.resolve.default_radius_meters, 2500);
        assert!(!config.resolve.substring_fallback);
        assert_eq!(config.expand.radius_steps, [500, 1000]);
        assert_eq!(config.expand.max_results, 10);
        assert_eq!(config.expand.min_results, 2);
    }

    #[test]
    fn test_rejects_bad_radius_steps() {
        for steps in [vec![], vec![1000, 1000], vec![5000, 2500]] {
            let result = LocatorConfigBuilder::new().radius_steps(steps).build();
            assert!(matches!(result, Err(StreetbotError::ConfigError(_))));
        }
    }

    #[test]
    fn test_rejects_bad_category_order() {
        let empty = LocatorConfigBuilder::new()
            .category_order(std::iter::empty())
            .build();
        assert!(matches!(empty, Err(StreetbotError::ConfigError(_))));

        let duplicated = LocatorConfigBuilder::new()
            .category_order([Category::Park, Category::Hospital, Category::Park])
            .build();
        assert!(matches!(
            duplicated,
            Err(StreetbotError::ConfigError(message)) if message.contains("park")
        ));
    }

    #[test]
    fn test_rejects_out_of_range_limits() {
        assert!(LocatorConfigBuilder::new().max_results(0).build().is_err());
        assert!(LocatorConfigBuilder::new().default_radius(20_001).build().is_err());
        assert!(LocatorConfigBuilder::new().default_radius(20_000).build().is_ok());
    }
}
