pub mod adjustment;
pub mod aggregator;
pub mod cma;
pub mod selector;

pub use adjustment::{AdjustmentLine, ComparableResult};
pub use aggregator::{ConfidenceBreakdown, ValuationResult};
pub use cma::{ValuationEngine, ValuationRequest};
