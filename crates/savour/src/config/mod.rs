use std::time::Duration;

use crate::{
    error::SavourError,
    geo::TravelSpeeds,
    relevance::{FieldWeights, RelevanceWeights},
    search::{HARD_PAGE_CAP, SearchConfig},
};

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Smaller pages, a tight store timeout and fewer suggestion candidates
    pub fn fast() -> Self {
        let mut builder = Self::new();
        builder.config.default_page_limit = 20;
        builder.config.retrieval_timeout = Duration::from_secs(1);
        builder.config.suggestion_candidates_per_facet = 10;
        builder
    }

    /// Larger pages and more patience with the store
    pub fn comprehensive() -> Self {
        let mut builder = Self::new();
        builder.config.default_page_limit = 100;
        builder.config.retrieval_timeout = Duration::from_secs(5);
        builder.config.suggestion_candidates_per_facet = 50;
        builder
    }

    /// Set the page size used when a request does not ask for one
    pub fn page_limit(mut self, limit: usize) -> Self {
        self.config.default_page_limit = limit.max(1);
        self
    }

    /// Set the largest page a request may ask for (never above 200)
    pub fn max_page_limit(mut self, limit: usize) -> Self {
        self.config.max_page_limit = limit.clamp(1, HARD_PAGE_CAP);
        self
    }

    /// Bound each store round-trip
    pub fn retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.config.retrieval_timeout = timeout;
        self
    }

    /// Set the assumed walking and driving speeds in km/h
    pub fn travel_speeds(
        mut self,
        walking_kmh: f64,
        driving_kmh: f64,
    ) -> Result<Self, SavourError> {
        for (mode, speed) in [("walking", walking_kmh), ("driving", driving_kmh)] {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(SavourError::ConfigError(format!(
                    "The {mode} speed must be a positive number of km/h, got {speed}"
                )));
            }
        }
        self.config.travel_speeds = TravelSpeeds {
            walking_kmh,
            driving_kmh,
        };
        Ok(self)
    }

    /// Distances below this are estimated on foot
    pub fn walking_threshold_km(mut self, km: f64) -> Self {
        if km.is_finite() && km >= 0.0 {
            self.config.walking_threshold_km = km;
        }
        self
    }

    /// Score candidates on the rayon pool once there are more than this many
    pub fn parallel_threshold(mut self, candidates: usize) -> Self {
        self.config.parallel_threshold = candidates;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.config.max_suggestions = max;
        self
    }

    pub fn suggestion_candidates_per_facet(mut self, candidates: usize) -> Self {
        self.config.suggestion_candidates_per_facet = candidates;
        self
    }

    /// Configure relevance points and field weights
    pub fn relevance_scoring(self) -> RelevanceScoringBuilder {
        RelevanceScoringBuilder::new(self)
    }

    /// Build the final configuration
    pub fn build(mut self) -> SearchConfig {
        self.config.default_page_limit = self
            .config
            .default_page_limit
            .clamp(1, self.config.max_page_limit);
        self.config
    }
}

/// Builder for relevance scoring parameters
pub struct RelevanceScoringBuilder {
    parent: SearchConfigBuilder,
}

impl RelevanceScoringBuilder {
    fn new(parent: SearchConfigBuilder) -> Self {
        Self { parent }
    }

    /// Let name matches drown out everything else
    pub fn prioritize_names(mut self) -> Self {
        self.parent.config.field_weights = FieldWeights {
            name: 100,
            description: 10,
            category: 25,
            region: 25,
        };
        self
    }

    /// Weigh every field the same
    pub fn balanced(mut self) -> Self {
        self.parent.config.field_weights = FieldWeights {
            name: 100,
            description: 100,
            category: 100,
            region: 100,
        };
        self
    }

    /// Set custom tier points. An exact match must still outscore any other match.
    pub fn custom_points(
        mut self,
        exact: u32,
        prefix: u32,
        substring: u32,
        whole_word: u32,
    ) -> Result<Self, SavourError> {
        let weights = RelevanceWeights {
            exact,
            prefix,
            substring,
            whole_word,
        };
        if !weights.exact_dominates() {
            return Err(SavourError::ConfigError(format!(
                "Exact match points ({exact}) must exceed prefix ({prefix}) or substring \
                 ({substring}) plus the whole-word bonus ({whole_word}), and prefix must not be \
                 below substring"
            )));
        }
        self.parent.config.relevance_weights = weights;
        Ok(self)
    }

    /// Set custom field weights as percentages (each at most 100)
    pub fn field_weights(
        mut self,
        name: u32,
        description: u32,
        category: u32,
        region: u32,
    ) -> Result<Self, SavourError> {
        if [name, description, category, region].iter().any(|&w| w > 100) {
            return Err(SavourError::ConfigError(
                "Field weights are percentages and must not exceed 100".to_string(),
            ));
        }
        if name == 0 {
            return Err(SavourError::ConfigError(
                "The name field weight must be positive".to_string(),
            ));
        }
        self.parent.config.field_weights = FieldWeights {
            name,
            description,
            category,
            region,
        };
        Ok(self)
    }

    /// Return to the main configuration builder
    pub fn done(self) -> SearchConfigBuilder {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let fast = SearchConfigBuilder::fast().build();
        assert_eq!(fast.default_page_limit, 20);
        assert_eq!(fast.retrieval_timeout, Duration::from_secs(1));
        assert_eq!(fast.suggestion_candidates_per_facet, 10);

        let comprehensive = SearchConfigBuilder::comprehensive().build();
        assert_eq!(comprehensive.default_page_limit, 100);
        assert_eq!(comprehensive.retrieval_timeout, Duration::from_secs(5));
        assert_eq!(comprehensive.suggestion_candidates_per_facet, 50);

        assert_eq!(SearchConfigBuilder::new().build(), SearchConfig::default());
    }

    #[test]
    fn test_method_chaining() {
        let config = SearchConfigBuilder::new()
            .page_limit(30)
            .max_suggestions(5)
            .relevance_scoring()
            .prioritize_names()
            .done()
            .walking_threshold_km(2.0)
            .build();

        assert_eq!(config.default_page_limit, 30);
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.field_weights.description, 10);
        assert_eq!(config.walking_threshold_km, 2.0);
    }

    #[test]
    fn test_override_presets() {
        let config = SearchConfigBuilder::fast()
            .page_limit(40)
            .build();

        assert_eq!(config.default_page_limit, 40);
        assert_eq!(config.retrieval_timeout, Duration::from_secs(1)); // kept from the preset
    }

    #[test]
    fn test_page_limits_are_capped() {
        let config = SearchConfigBuilder::new()
            .max_page_limit(1000)
            .page_limit(500)
            .build();
        assert_eq!(config.max_page_limit, HARD_PAGE_CAP);
        assert_eq!(config.default_page_limit, HARD_PAGE_CAP);

        let config = SearchConfigBuilder::new()
            .max_page_limit(25)
            .build();
        assert_eq!(config.default_page_limit, 25);
    }

    #[test]
    fn test_custom_points_validation() {
        let result = SearchConfigBuilder::new()
            .relevance_scoring()
            .custom_points(200, 60, 20, 40);
        assert!(result.is_ok());

        // 100 does not beat 80 + 30
        let result = SearchConfigBuilder::new()
            .relevance_scoring()
            .custom_points(100, 80, 20, 30);
        assert!(matches!(result, Err(SavourError::ConfigError(_))));
    }

    #[test]
    fn test_field_weights_validation() {
        let config = SearchConfigBuilder::new()
            .relevance_scoring()
            .field_weights(100, 50, 50, 0)
            .unwrap()
            .done()
            .build();
        assert_eq!(config.field_weights.region, 0);

        assert!(
            SearchConfigBuilder::new()
                .relevance_scoring()
                .field_weights(150, 0, 0, 0)
                .is_err()
        );
        assert!(
            SearchConfigBuilder::new()
                .relevance_scoring()
                .field_weights(0, 50, 50, 50)
                .is_err()
        );
    }

    #[test]
    fn test_travel_speeds_validation() {
        let config = SearchConfigBuilder::new()
            .travel_speeds(4.0, 40.0)
            .unwrap()
            .build();
        assert_eq!(config.travel_speeds.walking_kmh, 4.0);

        assert!(SearchConfigBuilder::new().travel_speeds(0.0, 30.0).is_err());
        assert!(
            SearchConfigBuilder::new()
                .travel_speeds(5.0, f64::NAN)
                .is_err()
        );
    }
}
