//! Engine-internal feature representation.
//!
//! A [`FeatureVector`] is derived once per property per request by
//! [`normalizer::normalize`] and never mutated afterwards.

pub mod normalizer;

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::property::models::PropertyType;

pub use normalizer::normalize;

/// Age span (years) at which the normalized age difference saturates.
const AGE_SPAN_YEARS: f64 = 50.0;

/// Features the selector, adjuster and scorer compare.
///
/// `Age` is derived from `year_built` and a caller-supplied reference year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    SquareFeet,
    Bedrooms,
    Bathrooms,
    LotSize,
    Age,
    LocationScore,
    ConditionScore,
}

impl Feature {
    /// Adjustment order.
    pub const ALL: [Feature; 7] = [
        Feature::SquareFeet,
        Feature::Bedrooms,
        Feature::Bathrooms,
        Feature::LotSize,
        Feature::Age,
        Feature::LocationScore,
        Feature::ConditionScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::SquareFeet => "square_feet",
            Feature::Bedrooms => "bedrooms",
            Feature::Bathrooms => "bathrooms",
            Feature::LotSize => "lot_size",
            Feature::Age => "age",
            Feature::LocationScore => "location_score",
            Feature::ConditionScore => "condition_score",
        }
    }

    /// Difference between two values scaled into `[0, 1]`.
    pub fn normalized_difference(self, subject: f64, comparable: f64) -> f64 {
        let diff = (subject - comparable).abs();
        let scaled = match self {
            Feature::SquareFeet | Feature::Bedrooms | Feature::Bathrooms | Feature::LotSize => {
                diff / subject.abs().max(comparable.abs()).max(1.0)
            }
            Feature::LocationScore | Feature::ConditionScore => diff / 100.0,
            Feature::Age => diff / AGE_SPAN_YEARS,
        };
        if scaled.is_finite() {
            scaled.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One normalized attribute. `value` is meaningless when `present` is false.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureValue {
    pub value: f64,
    pub present: bool,
}

impl FeatureValue {
    pub fn present(value: f64) -> Self {
        Self {
            value,
            present: true,
        }
    }

    pub fn absent() -> Self {
        Self {
            value: 0.0,
            present: false,
        }
    }

    /// The value, if known. All arithmetic goes through here.
    pub fn get(&self) -> Option<f64> {
        self.present.then_some(self.value)
    }
}

/// Validated feature view of one property record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub id: String,
    pub property_type: Option<PropertyType>,
    /// Price in major currency units (dollars).
    pub price: Option<Decimal>,
    pub tags: BTreeSet<String>,
    pub square_feet: FeatureValue,
    pub bedrooms: FeatureValue,
    pub bathrooms: FeatureValue,
    pub lot_size: FeatureValue,
    pub year_built: FeatureValue,
    pub location_score: FeatureValue,
    pub condition_score: FeatureValue,
}

impl FeatureVector {
    /// Value of a comparison feature as of `reference_year`.
    pub fn feature(&self, feature: Feature, reference_year: i32) -> FeatureValue {
        match feature {
            Feature::SquareFeet => self.square_feet,
            Feature::Bedrooms => self.bedrooms,
            Feature::Bathrooms => self.bathrooms,
            Feature::LotSize => self.lot_size,
            Feature::Age => self.age(reference_year),
            Feature::LocationScore => self.location_score,
            Feature::ConditionScore => self.condition_score,
        }
    }

    /// Age in whole years; a build year past `reference_year` counts as new.
    pub fn age(&self, reference_year: i32) -> FeatureValue {
        match self.year_built.get() {
            Some(year) => FeatureValue::present((f64::from(reference_year) - year).max(0.0)),
            None => FeatureValue::absent(),
        }
    }

    /// The stored attributes in fixed order.
    pub fn entries(&self) -> [(&'static str, FeatureValue); 7] {
        [
            ("square_feet", self.square_feet),
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
            ("lot_size", self.lot_size),
            ("year_built", self.year_built),
            ("location_score", self.location_score),
            ("condition_score", self.condition_score),
        ]
    }

    pub fn absent_count(&self) -> usize {
        self.entries().iter().filter(|(_, v)| !v.present).count()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&normalizer::normalize_tag(tag))
    }
}
