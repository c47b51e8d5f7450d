use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::features::Feature;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub monitoring: MonitoringConfig,
}

/// Everything the scoring paths read. Overridable per call by building a
/// second engine with different values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    pub weights: FeatureWeights,
    pub unit_values: UnitValues,
    pub valuation: ValuationConfig,
    pub matching: MatchConfig,
}

/// Similarity weights shared by the comparable selector and the match scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureWeights {
    pub square_feet: f64,
    pub location_score: f64,
    pub condition_score: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub age: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            square_feet: 0.30,
            location_score: 0.25,
            condition_score: 0.20,
            bedrooms: 0.10,
            bathrooms: 0.10,
            age: 0.05,
        }
    }
}

impl FeatureWeights {
    pub fn weight(&self, feature: Feature) -> f64 {
        match feature {
            Feature::SquareFeet => self.square_feet,
            Feature::LocationScore => self.location_score,
            Feature::ConditionScore => self.condition_score,
            Feature::Bedrooms => self.bedrooms,
            Feature::Bathrooms => self.bathrooms,
            Feature::Age => self.age,
            Feature::LotSize => 0.0,
        }
    }

    /// Features carrying non-zero weight, in adjustment order.
    pub fn weighted_features(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL
            .into_iter()
            .map(|f| (f, self.weight(f)))
            .filter(|(_, w)| *w > 0.0)
    }

    pub fn total(&self) -> f64 {
        self.weighted_features().map(|(_, w)| w).sum()
    }
}

/// Dollars per unit of feature difference (subject − comparable).
#[derive(Debug, Clone, Deserialize)]
pub struct UnitValues {
    pub square_feet: Decimal,
    pub bedrooms: Decimal,
    pub bathrooms: Decimal,
    pub lot_size: Decimal,
    /// Per year of age. Negative: an older subject is worth less.
    pub age: Decimal,
    pub location_score: Decimal,
    pub condition_score: Decimal,
}

impl Default for UnitValues {
    fn default() -> Self {
        Self {
            square_feet: dec!(75),
            bedrooms: dec!(8000),
            bathrooms: dec!(5000),
            lot_size: dec!(2),
            age: dec!(-1500),
            location_score: dec!(400),
            condition_score: dec!(400),
        }
    }
}

impl UnitValues {
    pub fn unit_value(&self, feature: Feature) -> Decimal {
        match feature {
            Feature::SquareFeet => self.square_feet,
            Feature::Bedrooms => self.bedrooms,
            Feature::Bathrooms => self.bathrooms,
            Feature::LotSize => self.lot_size,
            Feature::Age => self.age,
            Feature::LocationScore => self.location_score,
            Feature::ConditionScore => self.condition_score,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    /// Comparables requested when the caller does not say.
    pub default_comparables: usize,
    /// Upper bound on candidate pool size per request.
    pub max_pool_size: usize,
    /// Added to the penalized distance before inverting into a weight.
    pub distance_epsilon: f64,
    /// Scales the coefficient of variation in the dispersion sub-term.
    pub dispersion_penalty: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            default_comparables: 5,
            max_pool_size: 500,
            distance_epsilon: 0.05,
            dispersion_penalty: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    pub price_weight: f64,
    pub property_type_weight: f64,
    /// Weight per required or preferred tag.
    pub tag_weight: f64,
    /// Fraction of the violated price bound at which price contribution hits 0.
    pub price_tolerance_pct: f64,
    pub square_feet_tolerance_pct: f64,
    pub bedroom_tolerance: f64,
    pub bathroom_tolerance: f64,
    /// Score points below the minimum at which contribution hits 0.
    pub score_tolerance: f64,
    pub age_tolerance_years: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            price_weight: 0.30,
            property_type_weight: 0.10,
            tag_weight: 0.05,
            price_tolerance_pct: 0.10,
            square_feet_tolerance_pct: 0.15,
            bedroom_tolerance: 1.0,
            bathroom_tolerance: 1.0,
            score_tolerance: 20.0,
            age_tolerance_years: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    /// JSON lines on stderr; set false for human-readable output.
    #[serde(default = "default_json_logs")]
    pub json: bool,
}

fn default_json_logs() -> bool {
    true
}

impl EngineConfig {
    /// Reject malformed tables. Called once when an engine is built.
    pub fn validate(&self) -> EngineResult<()> {
        let weights = [
            ("weights.square_feet", self.weights.square_feet),
            ("weights.location_score", self.weights.location_score),
            ("weights.condition_score", self.weights.condition_score),
            ("weights.bedrooms", self.weights.bedrooms),
            ("weights.bathrooms", self.weights.bathrooms),
            ("weights.age", self.weights.age),
            ("matching.price_weight", self.matching.price_weight),
            ("matching.property_type_weight", self.matching.property_type_weight),
            ("matching.tag_weight", self.matching.tag_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(EngineError::Configuration(
                "at least one feature weight must be positive".to_string(),
            ));
        }

        let tolerances = [
            ("matching.price_tolerance_pct", self.matching.price_tolerance_pct),
            ("matching.square_feet_tolerance_pct", self.matching.square_feet_tolerance_pct),
            ("matching.bedroom_tolerance", self.matching.bedroom_tolerance),
            ("matching.bathroom_tolerance", self.matching.bathroom_tolerance),
            ("matching.score_tolerance", self.matching.score_tolerance),
            ("matching.age_tolerance_years", self.matching.age_tolerance_years),
            ("valuation.distance_epsilon", self.valuation.distance_epsilon),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::Configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let penalty = self.valuation.dispersion_penalty;
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(EngineError::Configuration(format!(
                "valuation.dispersion_penalty must be non-negative, got {penalty}"
            )));
        }
        if self.valuation.default_comparables == 0 {
            return Err(EngineError::Configuration(
                "valuation.default_comparables must be at least 1".to_string(),
            ));
        }
        if self.valuation.max_pool_size == 0 {
            return Err(EngineError::Configuration(
                "valuation.max_pool_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, after loading `.env` for `RUST_LOG`.
    pub fn load(config_path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config
            .engine
            .validate()
            .context("Engine configuration rejected")?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let contents = std::fs::read_to_string("config/default.toml")
            .expect("config/default.toml should exist");
        let config: AppConfig = toml::from_str(&contents).expect("should parse");
        assert_eq!(config.engine.weights.square_feet, 0.30);
        assert_eq!(config.engine.unit_values.square_feet, dec!(75));
        assert_eq!(config.engine.unit_values.age, dec!(-1500));
        assert_eq!(config.engine.valuation.max_pool_size, 500);
        assert_eq!(config.monitoring.log_level, "info");
        assert!(config.monitoring.json);
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = FeatureWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-12);
        assert_eq!(weights.weight(Feature::LotSize), 0.0);
        assert_eq!(weights.weighted_features().count(), 6);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = EngineConfig::default();
        config.weights.bedrooms = -0.1;
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let mut config = EngineConfig::default();
        config.weights = FeatureWeights {
            square_feet: 0.0,
            location_score: 0.0,
            condition_score: 0.0,
            bedrooms: 0.0,
            bathrooms: 0.0,
            age: 0.0,
        };
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_nan_tolerance_rejected() {
        let mut config = EngineConfig::default();
        config.matching.price_tolerance_pct = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let mut config = EngineConfig::default();
        config.valuation.max_pool_size = 0;
        assert!(config.validate().is_err());
    }
}
