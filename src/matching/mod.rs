//! Buyer preference matching and the recommendation feed.

pub mod feed;
pub mod preference;
pub mod reasons;
pub mod scorer;

pub use preference::PreferenceVector;
pub use scorer::{MatchResult, MAX_REASONS};
