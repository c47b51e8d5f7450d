//! Preference match scoring for the recommendation feed.
//!
//! Each stated preference yields a bounded contribution in `[0, 1]`. The
//! overall score is the weighted mean over preferences the subject can be
//! judged on, using the same similarity weights as comparable selection
//! for the shared features.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::{EngineConfig, MatchConfig};
use crate::features::normalizer::normalize_tag;
use crate::features::{Feature, FeatureVector};
use crate::matching::preference::PreferenceVector;
use crate::matching::reasons;
use crate::property::models::PropertyType;

/// Reasons kept per result.
pub const MAX_REASONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub subject_id: String,
    /// In `[0, 1]`.
    pub score: f64,
    /// Most significant first, at most [`MAX_REASONS`].
    pub reasons: Vec<String>,
    /// Contribution per evaluated preference, keyed by feature name.
    pub contributions: BTreeMap<String, f64>,
    /// Share of stated preference weight the subject could be judged on.
    /// Zero means a zero-confidence match.
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchFeature {
    Price,
    Scored(Feature),
    PropertyType,
    RequiredTag(String),
    PreferredTag(String),
}

impl MatchFeature {
    pub fn key(&self) -> String {
        match self {
            MatchFeature::Price => "price".to_string(),
            MatchFeature::Scored(feature) => feature.name().to_string(),
            MatchFeature::PropertyType => "property_type".to_string(),
            MatchFeature::RequiredTag(tag) | MatchFeature::PreferredTag(tag) => {
                format!("tag:{tag}")
            }
        }
    }
}

/// What the subject actually has, kept for reason rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Price(Decimal),
    Value(f64),
    Type(PropertyType),
    Tag { present: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub feature: MatchFeature,
    pub weight: f64,
    pub contribution: f64,
    pub observed: Observed,
}

impl Contribution {
    pub fn significance(&self) -> f64 {
        self.weight * self.contribution
    }
}

/// Score `subject` against `preferences`.
pub fn score(
    subject: &FeatureVector,
    preferences: &PreferenceVector,
    config: &EngineConfig,
    reference_year: i32,
) -> MatchResult {
    let (contributions, stated_weight) = evaluate(subject, preferences, config, reference_year);

    let evaluated_weight: f64 = contributions.iter().map(|c| c.weight).sum();
    let score = if evaluated_weight > 0.0 {
        let total: f64 = contributions.iter().map(Contribution::significance).sum();
        clamp_unit(total / evaluated_weight)
    } else {
        0.0
    };
    let coverage = if stated_weight > 0.0 {
        clamp_unit(evaluated_weight / stated_weight)
    } else {
        0.0
    };

    let mut ranked: Vec<&Contribution> = contributions
        .iter()
        .filter(|c| c.contribution > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        b.significance()
            .total_cmp(&a.significance())
            .then_with(|| a.feature.key().cmp(&b.feature.key()))
    });
    let reasons: Vec<String> = ranked
        .into_iter()
        .take(MAX_REASONS)
        .map(|c| reasons::render(c, preferences))
        .collect();

    debug!(
        subject = %subject.id,
        score,
        coverage,
        evaluated = contributions.len(),
        "Match scored"
    );

    MatchResult {
        subject_id: subject.id.clone(),
        score,
        reasons,
        contributions: contributions
            .iter()
            .map(|c| (c.feature.key(), c.contribution))
            .collect(),
        coverage,
    }
}

/// Per-preference contributions the subject can be judged on, plus the
/// total weight of everything the buyer stated.
fn evaluate(
    subject: &FeatureVector,
    prefs: &PreferenceVector,
    config: &EngineConfig,
    reference_year: i32,
) -> (Vec<Contribution>, f64) {
    let tuning = &config.matching;
    let mut out = Vec::new();
    let mut stated = 0.0;

    if prefs.has_price_range() {
        stated += tuning.price_weight;
        if let Some(price) = subject.price {
            out.push(Contribution {
                feature: MatchFeature::Price,
                weight: tuning.price_weight,
                contribution: price_contribution(price, prefs, tuning),
                observed: Observed::Price(price),
            });
        }
    }

    let minimums = [
        (Feature::SquareFeet, prefs.min_square_feet),
        (Feature::Bedrooms, prefs.min_bedrooms),
        (Feature::Bathrooms, prefs.min_bathrooms),
        (Feature::LocationScore, prefs.min_location_score),
        (Feature::ConditionScore, prefs.min_condition_score),
    ];
    for (feature, minimum) in minimums {
        let Some(minimum) = minimum else { continue };
        let weight = config.weights.weight(feature);
        stated += weight;
        if let Some(value) = subject.feature(feature, reference_year).get() {
            let tolerance = match feature {
                Feature::SquareFeet => minimum * tuning.square_feet_tolerance_pct,
                Feature::Bedrooms => tuning.bedroom_tolerance,
                Feature::Bathrooms => tuning.bathroom_tolerance,
                _ => tuning.score_tolerance,
            };
            out.push(Contribution {
                feature: MatchFeature::Scored(feature),
                weight,
                contribution: at_least(value, minimum, tolerance),
                observed: Observed::Value(value),
            });
        }
    }

    if let Some(max_age) = prefs.max_age {
        let weight = config.weights.weight(Feature::Age);
        stated += weight;
        if let Some(age) = subject.age(reference_year).get() {
            out.push(Contribution {
                feature: MatchFeature::Scored(Feature::Age),
                weight,
                contribution: at_most(age, max_age, tuning.age_tolerance_years),
                observed: Observed::Value(age),
            });
        }
    }

    if !prefs.property_types.is_empty() {
        stated += tuning.property_type_weight;
        if let Some(property_type) = subject.property_type {
            let accepted = prefs.property_types.contains(&property_type);
            out.push(Contribution {
                feature: MatchFeature::PropertyType,
                weight: tuning.property_type_weight,
                contribution: if accepted { 1.0 } else { 0.0 },
                observed: Observed::Type(property_type),
            });
        }
    }

    let required = normalized_tags(&prefs.required_tags);
    let preferred = normalized_tags(&prefs.preferred_tags);
    for tag in &required {
        let present = subject.has_tag(tag);
        stated += tuning.tag_weight;
        out.push(Contribution {
            feature: MatchFeature::RequiredTag(tag.clone()),
            weight: tuning.tag_weight,
            contribution: if present { 1.0 } else { 0.0 },
            observed: Observed::Tag { present },
        });
    }
    for tag in preferred.difference(&required) {
        let present = subject.has_tag(tag);
        stated += tuning.tag_weight;
        out.push(Contribution {
            feature: MatchFeature::PreferredTag(tag.clone()),
            weight: tuning.tag_weight,
            contribution: if present { 1.0 } else { 0.5 },
            observed: Observed::Tag { present },
        });
    }

    // Zero-weight preferences carry no information either way.
    out.retain(|c| c.weight > 0.0);
    (out, stated)
}

/// Preference tags compared the way listing tags are stored.
fn normalized_tags(tags: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

fn price_contribution(price: Decimal, prefs: &PreferenceVector, tuning: &MatchConfig) -> f64 {
    let Some(value) = price.to_f64() else {
        return 0.0;
    };
    if let Some(min) = prefs.price_min.and_then(|m| m.to_f64()) {
        if value < min {
            return at_least(value, min, min * tuning.price_tolerance_pct);
        }
    }
    if let Some(max) = prefs.price_max.and_then(|m| m.to_f64()) {
        if value > max {
            return at_most(value, max, max * tuning.price_tolerance_pct);
        }
    }
    1.0
}

/// 1.0 at or above `minimum`, falling linearly to 0 at `minimum − tolerance`.
pub fn at_least(value: f64, minimum: f64, tolerance: f64) -> f64 {
    if value >= minimum {
        1.0
    } else if tolerance > 0.0 {
        clamp_unit(1.0 - (minimum - value) / tolerance)
    } else {
        0.0
    }
}

/// 1.0 at or below `maximum`, falling linearly to 0 at `maximum + tolerance`.
pub fn at_most(value: f64, maximum: f64, tolerance: f64) -> f64 {
    if value <= maximum {
        1.0
    } else if tolerance > 0.0 {
        clamp_unit(1.0 - (value - maximum) / tolerance)
    } else {
        0.0
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Highest score first, then id ascending.
pub fn rank_order(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.subject_id.cmp(&b.subject_id))
}
