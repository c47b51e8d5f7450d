//! Raw property record → validated feature vector.
//!
//! Never fails. Anything missing, unparsable or out of range becomes
//! [`FeatureValue::absent`]. Currency conversion happens here and only here.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::features::{FeatureValue, FeatureVector};
use crate::property::models::{PropertyRecord, RawValue};

/// Repository prices are minor units (cents); the engine works in dollars.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Prices above this many minor units ($100 billion) are treated as data
/// errors. Keeps every downstream money product inside `Decimal` range.
pub const MAX_PRICE_MINOR: f64 = 1e13;

const YEAR_BUILT_RANGE: RangeInclusive<f64> = 1600.0..=2200.0;
const SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

pub fn normalize(record: &PropertyRecord) -> FeatureVector {
    let vector = FeatureVector {
        id: record.id.clone(),
        property_type: record.property_type,
        price: normalize_price(record.price.as_ref()),
        tags: record
            .features
            .iter()
            .map(|t| normalize_tag(t))
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>(),
        square_feet: bounded(record.square_feet.as_ref(), |v| v > 0.0),
        bedrooms: bounded(record.bedrooms.as_ref(), |v| v >= 0.0),
        bathrooms: bounded(record.bathrooms.as_ref(), |v| v >= 0.0),
        lot_size: bounded(record.lot_size.as_ref(), |v| v > 0.0),
        year_built: bounded(record.year_built.as_ref(), |v| YEAR_BUILT_RANGE.contains(&v)),
        location_score: bounded(record.location_score.as_ref(), |v| SCORE_RANGE.contains(&v)),
        condition_score: bounded(record.condition_score.as_ref(), |v| SCORE_RANGE.contains(&v)),
    };

    debug!(
        id = %vector.id,
        absent = vector.absent_count(),
        has_price = vector.price.is_some(),
        "Property normalized"
    );

    vector
}

/// Convert a minor-unit price to dollars. Zero, negative and implausibly
/// large prices are unknown.
fn normalize_price(raw: Option<&RawValue>) -> Option<Decimal> {
    let minor = raw.and_then(parse_number)?;
    if minor <= 0.0 || minor > MAX_PRICE_MINOR {
        return None;
    }
    let minor = Decimal::from_f64(minor)?;
    Some(minor / Decimal::from(MINOR_UNITS_PER_MAJOR))
}

fn bounded(raw: Option<&RawValue>, valid: impl Fn(f64) -> bool) -> FeatureValue {
    match raw.and_then(parse_number) {
        Some(v) if valid(v) => FeatureValue::present(v),
        _ => FeatureValue::absent(),
    }
}

/// Parse a raw scraped value into a finite number.
///
/// Strings drop currency symbols and digit separators, and a trailing unit
/// (`"1850 sqft"`) is ignored.
pub fn parse_number(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '_') && !c.is_whitespace())
                .collect();
            let end = cleaned
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
                .map(|(i, _)| i)
                .unwrap_or(cleaned.len());
            cleaned[..end].parse::<f64>().ok()?
        }
    };
    value.is_finite().then_some(value)
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number(&RawValue::Number(3.0)), Some(3.0));
        assert_eq!(parse_number(&RawValue::from("1,850 sqft")), Some(1850.0));
        assert_eq!(parse_number(&RawValue::from("$425,000")), Some(425_000.0));
        assert_eq!(parse_number(&RawValue::from("2.5")), Some(2.5));
        assert_eq!(parse_number(&RawValue::from("n/a")), None);
        assert_eq!(parse_number(&RawValue::from("")), None);
        assert_eq!(parse_number(&RawValue::Number(f64::NAN)), None);
        assert_eq!(parse_number(&RawValue::Number(f64::INFINITY)), None);
    }

    #[test]
    fn test_price_converted_once_from_cents() {
        let record = PropertyRecord {
            id: "p".to_string(),
            price: Some(RawValue::from(50_000_000)),
            ..PropertyRecord::default()
        };
        assert_eq!(normalize(&record).price, Some(dec!(500000)));

        let odd_cents = PropertyRecord {
            id: "q".to_string(),
            price: Some(RawValue::from(12_345)),
            ..PropertyRecord::default()
        };
        assert_eq!(normalize(&odd_cents).price, Some(dec!(123.45)));
    }

    #[test]
    fn test_zero_price_is_absent() {
        let record = PropertyRecord {
            id: "p".to_string(),
            price: Some(RawValue::from(0)),
            ..PropertyRecord::default()
        };
        assert_eq!(normalize(&record).price, None);
    }

    #[test]
    fn test_implausible_price_is_absent() {
        let huge = PropertyRecord {
            id: "p".to_string(),
            price: Some(RawValue::from(1e27)),
            ..PropertyRecord::default()
        };
        assert_eq!(normalize(&huge).price, None);

        let at_cap = PropertyRecord {
            id: "q".to_string(),
            price: Some(RawValue::from(MAX_PRICE_MINOR)),
            ..PropertyRecord::default()
        };
        assert_eq!(normalize(&at_cap).price, Some(dec!(100_000_000_000)));
    }

    #[test]
    fn test_missing_and_invalid_values_marked_absent() {
        let record = PropertyRecord {
            id: "p".to_string(),
            square_feet: Some(RawValue::from("unknown")),
            bedrooms: Some(RawValue::from(-1)),
            location_score: Some(RawValue::from(140)),
            condition_score: Some(RawValue::from("72")),
            year_built: Some(RawValue::from(1200)),
            ..PropertyRecord::default()
        };
        let v = normalize(&record);
        assert!(!v.square_feet.present);
        assert_eq!(v.square_feet.value, 0.0);
        assert!(!v.bedrooms.present);
        assert!(!v.location_score.present);
        assert!(!v.year_built.present);
        assert_eq!(v.condition_score.get(), Some(72.0));
        assert_eq!(v.absent_count(), 6);
    }

    #[test]
    fn test_zero_bedrooms_is_present() {
        let record = PropertyRecord {
            id: "studio".to_string(),
            bedrooms: Some(RawValue::from(0)),
            ..PropertyRecord::default()
        };
        assert_eq!(normalize(&record).bedrooms.get(), Some(0.0));
    }

    #[test]
    fn test_tags_normalized() {
        let record = PropertyRecord {
            id: "p".to_string(),
            features: vec![
                " Pool ".to_string(),
                "pool".to_string(),
                "Garage".to_string(),
                " ".to_string(),
            ],
            ..PropertyRecord::default()
        };
        let v = normalize(&record);
        assert_eq!(v.tags.len(), 2);
        assert!(v.has_tag("POOL"));
        assert!(v.has_tag("garage"));
    }
}
