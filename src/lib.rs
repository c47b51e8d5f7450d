pub mod config;
pub mod error;
pub mod features;
pub mod matching;
pub mod monitoring;
pub mod narrative;
pub mod property;
pub mod valuation;
