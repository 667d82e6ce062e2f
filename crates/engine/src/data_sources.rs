//! Data sources seen by the current job
//!
//! Grown by the ingest thread, read by search runs. Runs take a copy when a
//! query is built, so a run never holds the lock across index I/O.

use keyhunt_core::{DataSourceId, QueryFilter};
use parking_lot::RwLock;
use std::collections::BTreeSet;

/// Monotonically growing set of data source ids
#[derive(Debug, Default)]
pub struct DataSourceSet {
    ids: RwLock<BTreeSet<DataSourceId>>,
}

impl DataSourceSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a data source. Returns true if it was not seen before.
    pub fn insert(&self, id: DataSourceId) -> bool {
        if self.ids.read().contains(&id) {
            return false;
        }
        self.ids.write().insert(id)
    }

    /// True if the data source belongs to this job
    pub fn contains(&self, id: DataSourceId) -> bool {
        self.ids.read().contains(&id)
    }

    /// Consistent copy of the current members, in id order
    pub fn snapshot(&self) -> Vec<DataSourceId> {
        self.ids.read().iter().copied().collect()
    }

    /// Query filter restricted to the current members
    pub fn query_filter(&self) -> QueryFilter {
        QueryFilter::data_sources(self.snapshot())
    }

    /// Number of data sources
    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    /// True if no data source was seen
    pub fn is_empty(&self) -> bool {
        self.ids.read().is_empty()
    }

    /// Drop every member (job teardown)
    pub fn clear(&self) {
        self.ids.write().clear();
    }
}
