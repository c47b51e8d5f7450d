use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::property::models::PropertyType;

/// A buyer's stated preferences. Every field is optional; unstated
/// preferences are simply not scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceVector {
    /// Budget floor in dollars.
    pub price_min: Option<Decimal>,
    /// Budget ceiling in dollars.
    pub price_max: Option<Decimal>,
    pub min_bedrooms: Option<f64>,
    pub min_bathrooms: Option<f64>,
    pub min_square_feet: Option<f64>,
    pub min_location_score: Option<f64>,
    pub min_condition_score: Option<f64>,
    pub max_age: Option<f64>,
    /// Acceptable property types; empty accepts any.
    pub property_types: Vec<PropertyType>,
    pub required_tags: BTreeSet<String>,
    pub preferred_tags: BTreeSet<String>,
}

impl PreferenceVector {
    pub fn has_price_range(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
