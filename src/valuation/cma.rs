//! CMA entry point: normalize → select → adjust → aggregate.
//!
//! The engine holds only validated configuration. Every call borrows its
//! inputs and returns a fresh result, so one engine can serve any number
//! of threads.

use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::features::{normalize, FeatureVector};
use crate::matching::feed;
use crate::matching::preference::PreferenceVector;
use crate::matching::scorer::MatchResult;
use crate::property::models::PropertyRecord;
use crate::valuation::adjustment::{compare, ComparableResult};
use crate::valuation::aggregator::{aggregate, ValuationResult};
use crate::valuation::selector::select;

/// One valuation request. Records are borrowed for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct ValuationRequest<'a> {
    pub subject: &'a PropertyRecord,
    pub pool: &'a [PropertyRecord],
    /// Comparables to select; `None` uses the configured default.
    pub k: Option<usize>,
    pub reference_year: i32,
}

#[derive(Debug, Clone)]
pub struct ValuationEngine {
    config: EngineConfig,
}

impl ValuationEngine {
    /// Build an engine, rejecting malformed configuration up front.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// A second engine with different tuning, e.g. for a regional override.
    pub fn with_config(&self, config: EngineConfig) -> EngineResult<Self> {
        Self::new(config)
    }

    /// Run a full comparable-market valuation for the request's subject.
    #[instrument(
        skip(self, request),
        fields(subject = %request.subject.id, pool = request.pool.len())
    )]
    pub fn value(&self, request: &ValuationRequest<'_>) -> EngineResult<ValuationResult> {
        let max = self.config.valuation.max_pool_size;
        if request.pool.len() > max {
            warn!(size = request.pool.len(), max, "Candidate pool too large");
            return Err(EngineError::PoolTooLarge {
                size: request.pool.len(),
                max,
            });
        }

        let k = request.k.unwrap_or(self.config.valuation.default_comparables);
        let subject = normalize(request.subject);
        let pool: Vec<FeatureVector> = request.pool.iter().map(normalize).collect();

        let candidates = select(&subject, &pool, k, &self.config.weights, request.reference_year)?;
        let comparables: Vec<ComparableResult> = candidates
            .iter()
            .map(|c| compare(&subject, c, &self.config.unit_values, request.reference_year))
            .collect::<EngineResult<_>>()?;

        if comparables.len() < k {
            warn!(
                found = comparables.len(),
                requested = k,
                "Fewer comparables than requested"
            );
        }

        let result = aggregate(
            &subject.id,
            comparables,
            k,
            subject.square_feet.get(),
            &self.config.valuation,
        )?;

        info!(
            point_estimate = %result.point_estimate,
            low = %result.low_estimate,
            high = %result.high_estimate,
            confidence = result.confidence,
            comparables = result.comparables.len(),
            "Valuation complete"
        );

        Ok(result)
    }

    /// Score and rank `records` against buyer preferences.
    pub fn recommend(
        &self,
        records: &[PropertyRecord],
        preferences: &PreferenceVector,
        reference_year: i32,
        limit: Option<usize>,
    ) -> EngineResult<Vec<MatchResult>> {
        let max = self.config.valuation.max_pool_size;
        if records.len() > max {
            return Err(EngineError::PoolTooLarge {
                size: records.len(),
                max,
            });
        }
        Ok(feed::rank(records, preferences, &self.config, reference_year, limit))
    }
}
