//! Serializable view of the entity cache for status endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts and freshness of the cached QuickBooks data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheSnapshot {
    pub customers_count: usize,
    pub vendors_count: usize,
    pub items_count: usize,
    pub invoices_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    /// True when any entity collection is non-empty.
    pub fn has_data(&self) -> bool {
        self.customers_count > 0 || self.vendors_count > 0 || self.items_count > 0
    }

    /// Age of the cache in whole minutes, if it was ever populated.
    pub fn age_minutes(&self) -> Option<i64> {
        self.last_updated.map(|t| (Utc::now() - t).num_minutes())
    }
}
