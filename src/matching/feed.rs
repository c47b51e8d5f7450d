//! Recommendation feed: score every listing, best match first.

use tracing::info;

use crate::config::EngineConfig;
use crate::features::normalize;
use crate::matching::preference::PreferenceVector;
use crate::matching::scorer::{self, MatchResult};
use crate::property::models::PropertyRecord;

/// Score `records` against `preferences` and return them ranked.
///
/// Ordering is by score descending with ties broken by id, so the feed is
/// stable for identical inputs. `limit` truncates after ranking.
pub fn rank(
    records: &[PropertyRecord],
    preferences: &PreferenceVector,
    config: &EngineConfig,
    reference_year: i32,
    limit: Option<usize>,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = records
        .iter()
        .map(|record| scorer::score(&normalize(record), preferences, config, reference_year))
        .collect();

    results.sort_by(scorer::rank_order);
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    info!(
        scored = records.len(),
        returned = results.len(),
        top_score = results.first().map(|r| r.score).unwrap_or(0.0),
        "Recommendation feed ranked"
    );

    results
}
