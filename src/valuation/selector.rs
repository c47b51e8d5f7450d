//! Comparable selection.
//!
//! Ranks a candidate pool by weighted Euclidean distance to the subject
//! over features present on both sides, and keeps the closest `k`.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::FeatureWeights;
use crate::error::{EngineError, EngineResult};
use crate::features::FeatureVector;

/// A candidate that qualified as a comparable, with its similarity figures.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub vector: &'a FeatureVector,
    pub similarity: Similarity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// `sqrt(Σ w·d² / Σ w)` over weighted features present on both sides.
    pub distance: f64,
    /// Like `distance`, but every feature missing on either side counts as
    /// maximally different. Drives aggregation weights.
    pub penalized_distance: f64,
    /// Weighted features present on both sides.
    pub shared_features: usize,
    /// Shared weight as a fraction of total weight.
    pub feature_presence: f64,
    pub price_difference: Decimal,
}

/// Compare a candidate against the subject. Distance is 0 when the two
/// share no weighted feature; `feature_presence` is 0 then as well.
pub fn similarity(
    subject: &FeatureVector,
    candidate: &FeatureVector,
    weights: &FeatureWeights,
    reference_year: i32,
) -> Similarity {
    let mut shared_weight = 0.0;
    let mut shared_sum = 0.0;
    let mut unshared_weight = 0.0;
    let mut shared_features = 0;

    for (feature, weight) in weights.weighted_features() {
        let s = subject.feature(feature, reference_year).get();
        let c = candidate.feature(feature, reference_year).get();
        match (s, c) {
            (Some(s), Some(c)) => {
                let d = feature.normalized_difference(s, c);
                shared_sum += weight * d * d;
                shared_weight += weight;
                shared_features += 1;
            }
            _ => unshared_weight += weight,
        }
    }

    let total_weight = shared_weight + unshared_weight;
    let distance = if shared_weight > 0.0 {
        (shared_sum / shared_weight).sqrt()
    } else {
        0.0
    };
    let (penalized_distance, feature_presence) = if total_weight > 0.0 {
        (
            ((shared_sum + unshared_weight) / total_weight).sqrt(),
            shared_weight / total_weight,
        )
    } else {
        (1.0, 0.0)
    };

    let price_difference = match (subject.price, candidate.price) {
        (Some(s), Some(c)) => (s - c).abs(),
        _ => Decimal::MAX,
    };

    Similarity {
        distance,
        penalized_distance,
        shared_features,
        feature_presence,
        price_difference,
    }
}

/// Select up to `k` comparables for `subject` from `pool`.
///
/// Excludes the subject itself, candidates without a price, candidates
/// missing more than half of the weighted features, and candidates sharing
/// no weighted feature with the subject. A short list is returned as-is.
pub fn select<'a>(
    subject: &FeatureVector,
    pool: &'a [FeatureVector],
    k: usize,
    weights: &FeatureWeights,
    reference_year: i32,
) -> EngineResult<Vec<Candidate<'a>>> {
    if k == 0 {
        return Err(EngineError::InvalidRequest(
            "at least one comparable must be requested".to_string(),
        ));
    }
    if !subject.square_feet.present {
        return Err(EngineError::DataInsufficient {
            id: subject.id.clone(),
            missing: "square_feet",
        });
    }
    if subject.price.is_none() {
        return Err(EngineError::DataInsufficient {
            id: subject.id.clone(),
            missing: "price",
        });
    }

    let weighted_count = weights.weighted_features().count();

    let mut qualified: Vec<Candidate<'a>> = pool
        .iter()
        .filter(|c| c.id != subject.id && c.price.is_some())
        .filter(|c| {
            let missing = weights
                .weighted_features()
                .filter(|(f, _)| !c.feature(*f, reference_year).present)
                .count();
            missing * 2 <= weighted_count
        })
        .map(|c| Candidate {
            vector: c,
            similarity: similarity(subject, c, weights, reference_year),
        })
        // Nothing to measure against: distance 0 would mean "identical".
        .filter(|c| c.similarity.shared_features > 0)
        .collect();

    qualified.sort_by(rank_order);

    debug!(
        subject = %subject.id,
        pool = pool.len(),
        qualified = qualified.len(),
        requested = k,
        "Comparables ranked"
    );

    qualified.truncate(k);
    Ok(qualified)
}

/// Distance, then more shared features, then smaller price gap, then id.
fn rank_order(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.similarity
        .distance
        .total_cmp(&b.similarity.distance)
        .then_with(|| b.similarity.shared_features.cmp(&a.similarity.shared_features))
        .then_with(|| a.similarity.price_difference.cmp(&b.similarity.price_difference))
        .then_with(|| a.vector.id.cmp(&b.vector.id))
}
