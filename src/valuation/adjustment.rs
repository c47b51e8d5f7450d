//! Per-feature price adjustments between a subject and a comparable.
//!
//! Each adjustment moves the comparable's sale price toward what it would
//! have sold for with the subject's features:
//!
//! ```text
//! delta          = (subject − comparable) × unit_value
//! adjusted_value = comparable.price + Σ delta
//! ```

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::UnitValues;
use crate::error::{EngineError, EngineResult};
use crate::features::{Feature, FeatureVector};
use crate::valuation::selector::Candidate;

/// One feature's contribution to a comparable's adjusted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentLine {
    pub feature: Feature,
    pub subject_value: f64,
    pub comparable_value: f64,
    /// Dollars per unit of difference.
    pub unit_adjustment: Decimal,
    /// Signed dollar adjustment, rounded to cents.
    pub delta: Decimal,
}

/// A comparable after adjustment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparableResult {
    pub comparable_id: String,
    pub sale_price: Decimal,
    pub adjustments: Vec<AdjustmentLine>,
    pub net_adjustment: Decimal,
    pub adjusted_value: Decimal,
    pub distance: f64,
    /// Aggregation distance; missing features count as maximally different.
    #[serde(skip)]
    pub penalized_distance: f64,
    pub feature_presence: f64,
    /// Normalized aggregation weight; zero until aggregated.
    pub weight: f64,
    /// Adjusted value per square foot of the subject.
    pub adjusted_price_per_sqft: Option<Decimal>,
}

/// Adjustment lines for every feature present on both sides, in
/// [`Feature::ALL`] order. Missing on either side means no line.
pub fn adjust(
    subject: &FeatureVector,
    comparable: &FeatureVector,
    unit_values: &UnitValues,
    reference_year: i32,
) -> Vec<AdjustmentLine> {
    Feature::ALL
        .into_iter()
        .filter_map(|feature| {
            let s = subject.feature(feature, reference_year).get()?;
            let c = comparable.feature(feature, reference_year).get()?;
            let difference = Decimal::from_f64(s - c)?;
            let unit_adjustment = unit_values.unit_value(feature);
            let delta = difference.checked_mul(unit_adjustment)?.round_dp(2);
            Some(AdjustmentLine {
                feature,
                subject_value: s,
                comparable_value: c,
                unit_adjustment,
                delta,
            })
        })
        .collect()
}

/// Sum of deltas; `None` if the sum leaves `Decimal` range.
pub fn net_adjustment(lines: &[AdjustmentLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.delta))
}

/// Build the full comparable result for a selected candidate.
///
/// Selection only passes priced candidates; an unpriced one is reported as
/// insufficient data for that comparable.
pub fn compare(
    subject: &FeatureVector,
    candidate: &Candidate<'_>,
    unit_values: &UnitValues,
    reference_year: i32,
) -> EngineResult<ComparableResult> {
    let id = &candidate.vector.id;
    let sale_price = candidate.vector.price.ok_or_else(|| EngineError::DataInsufficient {
        id: id.clone(),
        missing: "price",
    })?;
    let adjustments = adjust(subject, candidate.vector, unit_values, reference_year);
    let overflow = || EngineError::NumericOverflow { id: subject.id.clone() };
    let net = net_adjustment(&adjustments).ok_or_else(overflow)?;
    let adjusted_value = sale_price.checked_add(net).ok_or_else(overflow)?;

    let adjusted_price_per_sqft = subject
        .square_feet
        .get()
        .and_then(Decimal::from_f64)
        .filter(|sqft| *sqft > Decimal::ZERO)
        .and_then(|sqft| adjusted_value.checked_div(sqft))
        .map(|ppsf| ppsf.round_dp(2));

    Ok(ComparableResult {
        comparable_id: id.clone(),
        sale_price,
        adjustments,
        net_adjustment: net,
        adjusted_value,
        distance: candidate.similarity.distance,
        penalized_distance: candidate.similarity.penalized_distance,
        feature_presence: candidate.similarity.feature_presence,
        weight: 0.0,
        adjusted_price_per_sqft,
    })
}
