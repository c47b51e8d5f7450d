//! Match scoring and recommendation feed tests.

use std::collections::BTreeSet;

use property_valuation::config::EngineConfig;
use property_valuation::error::EngineError;
use property_valuation::features::normalize;
use property_valuation::matching::scorer::score;
use property_valuation::matching::{PreferenceVector, MAX_REASONS};
use property_valuation::property::{PropertyRecord, PropertyType, RawValue};
use property_valuation::valuation::ValuationEngine;
use rust_decimal_macros::dec;

const YEAR: i32 = 2024;

fn listing(id: &str, price_cents: i64, sqft: f64, bedrooms: i64, tags: &[&str]) -> PropertyRecord {
    PropertyRecord {
        id: id.to_string(),
        property_type: Some(PropertyType::House),
        price: Some(RawValue::from(price_cents)),
        square_feet: Some(RawValue::from(sqft)),
        bedrooms: Some(RawValue::from(bedrooms)),
        bathrooms: Some(RawValue::from(2.0)),
        year_built: Some(RawValue::from(2005)),
        location_score: Some(RawValue::from(78.0)),
        condition_score: Some(RawValue::from(70.0)),
        features: tags.iter().map(|t| t.to_string()).collect(),
        ..PropertyRecord::default()
    }
}

fn tags(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|t| t.to_string()).collect()
}

fn buyer() -> PreferenceVector {
    PreferenceVector {
        price_min: Some(dec!(350000)),
        price_max: Some(dec!(500000)),
        min_bedrooms: Some(3.0),
        min_square_feet: Some(1800.0),
        min_location_score: Some(75.0),
        max_age: Some(25.0),
        property_types: vec![PropertyType::House],
        required_tags: tags(&["garage"]),
        preferred_tags: tags(&["pool", "fireplace"]),
        ..PreferenceVector::default()
    }
}

// ──────────────────────────────────────────
// Scorer
// ──────────────────────────────────────────

#[test]
fn required_tag_absent_scores_zero_and_is_not_a_reason() {
    let subject = normalize(&listing("p", 45_000_000, 2000.0, 3, &["garage"]));
    let prefs = PreferenceVector {
        min_bedrooms: Some(3.0),
        required_tags: tags(&["waterfront"]),
        ..PreferenceVector::default()
    };

    let result = score(&subject, &prefs, &EngineConfig::default(), YEAR);

    assert_eq!(result.contributions["tag:waterfront"], 0.0);
    assert!(result.reasons.iter().all(|r| !r.contains("waterfront")));
    assert!(result.score < 1.0);
}

#[test]
fn tag_matching_ignores_case() {
    let subject = normalize(&listing("p", 45_000_000, 2000.0, 3, &["  Garage "]));
    let prefs = PreferenceVector {
        required_tags: tags(&["GARAGE"]),
        ..PreferenceVector::default()
    };

    let result = score(&subject, &prefs, &EngineConfig::default(), YEAR);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.reasons, vec!["Has required feature: garage".to_string()]);
}

#[test]
fn perfect_match_scores_one_with_three_reasons() {
    let record = listing("p", 45_000_000, 2000.0, 4, &["garage", "pool", "fireplace"]);
    let subject = normalize(&record);
    let result = score(&subject, &buyer(), &EngineConfig::default(), YEAR);

    assert!((result.score - 1.0).abs() < 1e-12);
    assert_eq!(result.reasons.len(), MAX_REASONS);
    assert!(result.reasons[0].contains("budget"));
    assert_eq!(result.coverage, 1.0);
}

#[test]
fn unknown_features_shrink_coverage_not_score() {
    let mut record = listing("p", 45_000_000, 2000.0, 4, &["garage", "pool", "fireplace"]);
    record.location_score = Some(RawValue::from("n/a"));
    record.year_built = None;
    let subject = normalize(&record);

    let result = score(&subject, &buyer(), &EngineConfig::default(), YEAR);

    assert!((result.score - 1.0).abs() < 1e-12);
    assert!(result.coverage < 1.0);
    assert!(!result.contributions.contains_key("location_score"));
    assert!(!result.contributions.contains_key("age"));
}

#[test]
fn score_and_reason_bounds_hold() {
    let records = vec![
        listing("a", 45_000_000, 2000.0, 4, &["garage", "pool"]),
        listing("b", 90_000_000, 900.0, 1, &[]),
        listing("c", 10_000_000, 4000.0, 6, &["pool"]),
        PropertyRecord {
            id: "d".to_string(),
            ..PropertyRecord::default()
        },
    ];
    let config = EngineConfig::default();

    for prefs in [buyer(), PreferenceVector::default()] {
        for record in &records {
            let result = score(&normalize(record), &prefs, &config, YEAR);
            assert!((0.0..=1.0).contains(&result.score), "{}: {}", record.id, result.score);
            assert!(result.reasons.len() <= MAX_REASONS);
            assert!((0.0..=1.0).contains(&result.coverage));
        }
    }
}

#[test]
fn empty_preferences_score_zero() {
    let subject = normalize(&listing("p", 45_000_000, 2000.0, 4, &["garage"]));
    let result = score(&subject, &PreferenceVector::default(), &EngineConfig::default(), YEAR);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.coverage, 0.0);
    assert!(result.reasons.is_empty());
}

// ──────────────────────────────────────────
// Recommendation feed
// ──────────────────────────────────────────

#[test]
fn feed_ranks_best_match_first() {
    let engine = ValuationEngine::new(EngineConfig::default()).unwrap();
    let records = vec![
        listing("too-small", 45_000_000, 1200.0, 2, &["garage"]),
        listing("ideal", 45_000_000, 2000.0, 4, &["garage", "pool"]),
        listing("no-garage", 45_000_000, 2000.0, 4, &[]),
    ];

    let feed = engine.recommend(&records, &buyer(), YEAR, None).unwrap();

    assert_eq!(feed[0].subject_id, "ideal");
    assert!(feed.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn feed_is_idempotent() {
    let engine = ValuationEngine::new(EngineConfig::default()).unwrap();
    let records = vec![
        listing("a", 45_000_000, 2000.0, 4, &["garage"]),
        listing("b", 52_000_000, 1700.0, 3, &["pool"]),
    ];

    let first = engine.recommend(&records, &buyer(), YEAR, Some(1)).unwrap();
    let second = engine.recommend(&records, &buyer(), YEAR, Some(1)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
fn feed_respects_pool_limit() {
    let mut config = EngineConfig::default();
    config.valuation.max_pool_size = 1;
    let engine = ValuationEngine::new(config).unwrap();
    let records = vec![
        listing("a", 45_000_000, 2000.0, 4, &[]),
        listing("b", 45_000_000, 2000.0, 4, &[]),
    ];

    let err = engine.recommend(&records, &buyer(), YEAR, None).unwrap_err();
    assert_eq!(err, EngineError::PoolTooLarge { size: 2, max: 1 });
}
