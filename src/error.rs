//! Engine error taxonomy.
//!
//! Only request-level failures surface here. Per-feature anomalies
//! (missing or unparsable values) are absorbed by the normalizer.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The subject lacks a field every valuation needs. Not retried.
    #[error("property {id} cannot be valued: missing {missing}")]
    DataInsufficient { id: String, missing: &'static str },

    /// The selector found nothing usable for this subject.
    #[error("no usable comparables for property {id}")]
    EmptyComparablePool { id: String },

    /// Weight or unit-value tables are malformed. Raised at construction only.
    #[error("invalid engine configuration: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("candidate pool of {size} exceeds max_pool_size {max}")]
    PoolTooLarge { size: usize, max: usize },

    /// A money sum or product left `Decimal` range.
    #[error("arithmetic overflow while valuing property {id}")]
    NumericOverflow { id: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
