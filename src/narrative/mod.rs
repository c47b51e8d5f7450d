//! Narrative generation collaborator.
//!
//! Narrators only ever receive finished results. Nothing in the scoring
//! paths calls back into this module.

use anyhow::Result;
use async_trait::async_trait;

use crate::matching::reasons::{format_currency, format_number};
use crate::matching::scorer::MatchResult;
use crate::valuation::aggregator::ValuationResult;

/// Turns pre-computed scores into prose. Implementations may be remote
/// (text generation services) and therefore async and fallible.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn narrate_valuation(&self, result: &ValuationResult) -> Result<String>;

    async fn narrate_match(&self, result: &MatchResult) -> Result<String>;

    /// Human-readable name of this narrator.
    fn name(&self) -> &str;
}

/// Deterministic, offline narrator built from fixed templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl NarrativeService for TemplateNarrator {
    async fn narrate_valuation(&self, result: &ValuationResult) -> Result<String> {
        let mut text = format!(
            "Estimated value for {} is {} (range {} to {}), \
             based on {} of {} requested comparables.",
            result.subject_id,
            format_currency(result.point_estimate),
            format_currency(result.low_estimate),
            format_currency(result.high_estimate),
            result.comparables.len(),
            result.requested_comparables,
        );
        if let Some(ppsf) = result.price_per_sqft {
            text.push_str(&format!(" That is {} per sq ft.", format_currency(ppsf)));
        }
        text.push_str(&format!(
            " Confidence is {}.",
            confidence_label(result.confidence)
        ));
        Ok(text)
    }

    async fn narrate_match(&self, result: &MatchResult) -> Result<String> {
        let percent = format_number((result.score * 100.0).round());
        if result.reasons.is_empty() {
            return Ok(format!(
                "{} is a {percent}% match with nothing standing out.",
                result.subject_id
            ));
        }
        Ok(format!(
            "{} is a {percent}% match: {}.",
            result.subject_id,
            result.reasons.join("; ")
        ))
    }

    fn name(&self) -> &str {
        "template"
    }
}

fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 0.75 {
        "high"
    } else if confidence >= 0.4 {
        "moderate"
    } else {
        "low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::aggregator::ConfidenceBreakdown;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn valuation() -> ValuationResult {
        ValuationResult {
            subject_id: "p-1".to_string(),
            point_estimate: dec!(489500),
            low_estimate: dec!(470000),
            high_estimate: dec!(509000),
            confidence: 0.8,
            confidence_breakdown: ConfidenceBreakdown {
                count: 1.0,
                presence: 0.9,
                dispersion: 0.89,
            },
            price_per_sqft: Some(dec!(244.75)),
            requested_comparables: 3,
            comparables: Vec::new(),
        }
    }

    #[test]
    fn test_narrate_valuation() {
        let text = tokio_test::block_on(TemplateNarrator.narrate_valuation(&valuation())).unwrap();
        assert_eq!(
            text,
            "Estimated value for p-1 is $489,500 (range $470,000 to $509,000), \
             based on 0 of 3 requested comparables. That is $245 per sq ft. Confidence is high."
        );
    }

    #[test]
    fn test_narrate_match() {
        let result = MatchResult {
            subject_id: "p-2".to_string(),
            score: 0.874,
            reasons: vec!["Has required feature: garage".to_string()],
            contributions: BTreeMap::new(),
            coverage: 1.0,
        };
        let text = tokio_test::block_on(TemplateNarrator.narrate_match(&result)).unwrap();
        assert_eq!(text, "p-2 is a 87% match: Has required feature: garage.");
    }

    #[test]
    fn test_narrator_is_object_safe() {
        let narrator: Box<dyn NarrativeService> = Box::new(TemplateNarrator);
        assert_eq!(narrator.name(), "template");
    }
}
