//! Fixed, local templates for match reasons. Same inputs, same text.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::features::Feature;
use crate::matching::preference::PreferenceVector;
use crate::matching::scorer::{Contribution, MatchFeature, Observed};

pub fn render(contribution: &Contribution, prefs: &PreferenceVector) -> String {
    let full = contribution.contribution >= 1.0;

    match (&contribution.feature, &contribution.observed) {
        (MatchFeature::Price, Observed::Price(price)) => {
            if full {
                format!("Priced at {}, within your budget", format_currency(*price))
            } else {
                format!("Priced at {}, close to your budget", format_currency(*price))
            }
        }
        (MatchFeature::Scored(feature), Observed::Value(value)) => {
            render_scored(*feature, *value, full, prefs)
        }
        (MatchFeature::PropertyType, Observed::Type(property_type)) => {
            format!("{property_type} matches your preferred property type")
        }
        (MatchFeature::RequiredTag(tag), _) => format!("Has required feature: {tag}"),
        (MatchFeature::PreferredTag(tag), Observed::Tag { present: true }) => {
            format!("Has preferred feature: {tag}")
        }
        (MatchFeature::PreferredTag(tag), _) => format!("Lacks preferred feature: {tag}"),
        (feature, _) => format!("Matches your {} preference", feature.key()),
    }
}

fn render_scored(feature: Feature, value: f64, full: bool, prefs: &PreferenceVector) -> String {
    let v = format_number(value);
    match feature {
        Feature::SquareFeet => {
            let min = format_number(prefs.min_square_feet.unwrap_or_default());
            if full {
                format!("{v} sq ft meets your {min} sq ft minimum")
            } else {
                format!("{v} sq ft, just under your {min} sq ft minimum")
            }
        }
        Feature::Bedrooms | Feature::Bathrooms => {
            let (noun, min) = if feature == Feature::Bedrooms {
                ("bedrooms", prefs.min_bedrooms)
            } else {
                ("bathrooms", prefs.min_bathrooms)
            };
            let min = format_number(min.unwrap_or_default());
            if full {
                format!("{v} {noun} (you asked for at least {min})")
            } else {
                format!("{v} {noun}, slightly under your minimum of {min}")
            }
        }
        Feature::LocationScore | Feature::ConditionScore => {
            let (label, min) = if feature == Feature::LocationScore {
                ("Location", prefs.min_location_score)
            } else {
                ("Condition", prefs.min_condition_score)
            };
            let min = format_number(min.unwrap_or_default());
            if full {
                format!("{label} score {v} meets your target of {min}")
            } else {
                format!("{label} score {v}, near your target of {min}")
            }
        }
        Feature::Age => {
            let max = format_number(prefs.max_age.unwrap_or_default());
            if full {
                format!("Built {v} years ago, within your {max}-year limit")
            } else {
                format!("Built {v} years ago, slightly over your {max}-year limit")
            }
        }
        Feature::LotSize => format!("Lot size {v}"),
    }
}

/// Whole dollars with thousands separators: `$1,234,568`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Integers without a decimal point, everything else to one place.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
