//! Combine adjusted comparables into a point estimate, range and confidence.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use crate::config::ValuationConfig;
use crate::error::{EngineError, EngineResult};
use crate::valuation::adjustment::ComparableResult;

/// Outcome of a CMA valuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub subject_id: String,
    pub point_estimate: Decimal,
    pub low_estimate: Decimal,
    pub high_estimate: Decimal,
    /// In `[0, 1]`; the product of the breakdown sub-terms.
    pub confidence: f64,
    pub confidence_breakdown: ConfidenceBreakdown,
    pub price_per_sqft: Option<Decimal>,
    pub requested_comparables: usize,
    pub comparables: Vec<ComparableResult>,
}

/// Each sub-term is clamped to `[0, 1]`; any weak one drags confidence down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    /// Comparables found versus comparables requested.
    pub count: f64,
    /// Mean share of weighted features present on both sides.
    pub presence: f64,
    /// Falls as adjusted values spread out.
    pub dispersion: f64,
}

/// Aggregate adjusted comparables for `subject_id`.
///
/// Weights are inverse to penalized distance and normalized to sum to 1.
/// The range is the point estimate ± one weighted standard deviation,
/// floored at zero.
pub fn aggregate(
    subject_id: &str,
    mut comparables: Vec<ComparableResult>,
    requested: usize,
    subject_sqft: Option<f64>,
    config: &ValuationConfig,
) -> EngineResult<ValuationResult> {
    if comparables.is_empty() {
        return Err(EngineError::EmptyComparablePool {
            id: subject_id.to_string(),
        });
    }

    let raw_weights: Vec<f64> = comparables
        .iter()
        .map(|c| 1.0 / (config.distance_epsilon + c.penalized_distance.max(0.0)))
        .collect();
    let weight_sum: f64 = raw_weights.iter().sum();
    for (comparable, raw) in comparables.iter_mut().zip(&raw_weights) {
        comparable.weight = raw / weight_sum;
    }

    let dec_weights: Vec<Decimal> = raw_weights
        .iter()
        .map(|w| Decimal::from_f64(*w).unwrap_or(Decimal::ZERO))
        .collect();
    let dec_weight_sum: Decimal = dec_weights.iter().copied().sum();
    if dec_weight_sum <= Decimal::ZERO {
        return Err(EngineError::EmptyComparablePool {
            id: subject_id.to_string(),
        });
    }

    let overflow = || EngineError::NumericOverflow {
        id: subject_id.to_string(),
    };

    let weighted_total = comparables
        .iter()
        .zip(&dec_weights)
        .try_fold(Decimal::ZERO, |acc, (c, w)| {
            c.adjusted_value.checked_mul(*w).and_then(|v| acc.checked_add(v))
        })
        .ok_or_else(overflow)?;
    let mean = weighted_total.checked_div(dec_weight_sum).ok_or_else(overflow)?;

    let weighted_squares = comparables
        .iter()
        .zip(&dec_weights)
        .try_fold(Decimal::ZERO, |acc, (c, w)| {
            let dev = c.adjusted_value.checked_sub(mean)?;
            dev.checked_mul(dev)
                .and_then(|sq| sq.checked_mul(*w))
                .and_then(|v| acc.checked_add(v))
        })
        .ok_or_else(overflow)?;
    let variance = weighted_squares.checked_div(dec_weight_sum).ok_or_else(overflow)?;
    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO).round_dp(2);

    let point = mean.max(Decimal::ZERO).round_dp(2);
    let low = point.checked_sub(std_dev).ok_or_else(overflow)?.max(Decimal::ZERO).round_dp(2);
    let high = point.checked_add(std_dev).ok_or_else(overflow)?.round_dp(2);

    let n = comparables.len();
    let count = (n as f64 / requested.max(1) as f64).clamp(0.0, 1.0);
    let presence =
        (comparables.iter().map(|c| c.feature_presence).sum::<f64>() / n as f64).clamp(0.0, 1.0);
    let dispersion = if point > Decimal::ZERO {
        let cv = std_dev
            .checked_div(point)
            .and_then(|cv| cv.to_f64())
            .unwrap_or(f64::INFINITY);
        (1.0 / (1.0 + cv * config.dispersion_penalty)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let confidence = (count * presence * dispersion).clamp(0.0, 1.0);

    let price_per_sqft = subject_sqft
        .and_then(Decimal::from_f64)
        .filter(|sqft| *sqft > Decimal::ZERO)
        .and_then(|sqft| point.checked_div(sqft))
        .map(|ppsf| ppsf.round_dp(2));

    Ok(ValuationResult {
        subject_id: subject_id.to_string(),
        point_estimate: point,
        low_estimate: low,
        high_estimate: high,
        confidence,
        confidence_breakdown: ConfidenceBreakdown {
            count,
            presence,
            dispersion,
        },
        price_per_sqft,
        requested_comparables: requested,
        comparables,
    })
}
