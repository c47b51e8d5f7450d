//! Read-only property repository interface.
//!
//! The engine never talks to storage itself: callers fetch records through
//! a [`PropertyRepository`] before a request and hand borrowed slices to
//! the engine.

use std::path::Path;

use anyhow::{Context, Result};

use crate::property::models::{PropertyRecord, PropertyType, RawValue};

/// Source of normalized property records.
pub trait PropertyRepository: Send + Sync {
    /// Look up a single property by id.
    fn get(&self, id: &str) -> Result<Option<PropertyRecord>>;

    /// Return every property matching `filter`, ordered by id.
    fn query(&self, filter: &PropertyFilter) -> Result<Vec<PropertyRecord>>;
}

/// Query filter for candidate pools and recommendation feeds.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    pub state: Option<String>,
    pub county: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Inclusive lower price bound in minor currency units.
    pub min_price: Option<i64>,
    /// Inclusive upper price bound in minor currency units.
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<u32>,
    pub exclude_id: Option<String>,
    pub limit: Option<usize>,
}

impl PropertyFilter {
    /// Candidate pool for a CMA: same county/state and type as the subject.
    pub fn comparables_for(subject: &PropertyRecord) -> Self {
        Self {
            state: subject.address.state.clone(),
            county: subject.address.county.clone(),
            property_type: subject.property_type,
            exclude_id: Some(subject.id.clone()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &PropertyRecord) -> bool {
        if let Some(ref exclude) = self.exclude_id {
            if &record.id == exclude {
                return false;
            }
        }
        if let Some(ref state) = self.state {
            if !eq_ignore_case(record.address.state.as_deref(), state) {
                return false;
            }
        }
        if let Some(ref county) = self.county {
            if !eq_ignore_case(record.address.county.as_deref(), county) {
                return false;
            }
        }
        if let Some(property_type) = self.property_type {
            if record.property_type != Some(property_type) {
                return false;
            }
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            // Filtering by price requires a usable price.
            let Some(price) = record.price.as_ref().and_then(raw_number) else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min as f64) {
                return false;
            }
            if self.max_price.is_some_and(|max| price > max as f64) {
                return false;
            }
        }
        if let Some(min_bedrooms) = self.min_bedrooms {
            let Some(bedrooms) = record.bedrooms.as_ref().and_then(raw_number) else {
                return false;
            };
            if bedrooms < f64::from(min_bedrooms) {
                return false;
            }
        }
        true
    }
}

fn eq_ignore_case(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(expected.trim()))
}

fn raw_number(raw: &RawValue) -> Option<f64> {
    crate::features::normalizer::parse_number(raw)
}

/// Repository backed by an in-memory list, sorted by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    records: Vec<PropertyRecord>,
}

impl InMemoryRepository {
    pub fn new(mut records: Vec<PropertyRecord>) -> Self {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Self { records }
    }

    /// Load a JSON array of property records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read property file: {}", path.display()))?;
        let records: Vec<PropertyRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse property file: {}", path.display()))?;

        tracing::info!(path = %path.display(), records = records.len(), "Property records loaded");

        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PropertyRepository for InMemoryRepository {
    fn get(&self, id: &str) -> Result<Option<PropertyRecord>> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    fn query(&self, filter: &PropertyFilter) -> Result<Vec<PropertyRecord>> {
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }
}
