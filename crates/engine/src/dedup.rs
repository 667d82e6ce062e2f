//! Result deduplication across repeated searches of a growing index
//!
//! Every search run re-executes the same queries against an index that only
//! grows, so most of what a query returns was already reported by an earlier
//! run. The ledger remembers, per keyword, which documents were reported and
//! hands back only the delta.
//!
//! The ledger lives behind the searcher gate (see `scheduler`), so it is
//! only ever touched by the one run body that holds the gate.

use keyhunt_core::{ContentHit, FileId, Keyword, QueryResults};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Keyword -> document ids already reported in this job
#[derive(Debug, Default)]
pub struct ResultDeduplicator {
    reported: HashMap<Keyword, HashSet<FileId>>,
}

impl ResultDeduplicator {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only hits not reported before and remember them.
    ///
    /// Each matched term becomes a keyword (literal unless `is_regex`).
    /// A term seen for the first time is new in its entirety; afterwards
    /// only hits whose document id is absent from the ledger are new.
    /// Terms with nothing new are left out of the returned map.
    pub fn filter_new(
        &mut self,
        results: QueryResults,
        is_regex: bool,
    ) -> BTreeMap<Keyword, Vec<ContentHit>> {
        let mut fresh = BTreeMap::new();

        for (term, hits) in results {
            if hits.is_empty() {
                continue;
            }
            let keyword = Keyword::new(&term, !is_regex);
            match self.reported.get_mut(&keyword) {
                None => {
                    let ids = hits.iter().map(ContentHit::document_id).collect();
                    self.reported.insert(keyword.clone(), ids);
                    fresh.insert(keyword, hits);
                }
                Some(seen) => {
                    let new_hits: Vec<ContentHit> = hits
                        .into_iter()
                        .filter(|hit| seen.insert(hit.document_id()))
                        .collect();
                    if !new_hits.is_empty() {
                        fresh.insert(keyword, new_hits);
                    }
                }
            }
        }

        fresh
    }

    /// True if the document was already reported for the keyword
    pub fn is_reported(&self, keyword: &Keyword, document: FileId) -> bool {
        self.reported
            .get(keyword)
            .is_some_and(|seen| seen.contains(&document))
    }

    /// Take back a document handed out by `filter_new` that was never
    /// reported, so the next run returns it again. Returns false if it was
    /// not in the ledger.
    pub fn forget(&mut self, keyword: &Keyword, document: FileId) -> bool {
        self.reported
            .get_mut(keyword)
            .is_some_and(|seen| seen.remove(&document))
    }

    /// Number of keywords with at least one reported document
    pub fn keyword_count(&self) -> usize {
        self.reported.len()
    }

    /// Total reported (keyword, document) pairs
    pub fn reported_count(&self) -> usize {
        self.reported.values().map(HashSet::len).sum()
    }

    /// Forget everything (job teardown)
    pub fn clear(&mut self) {
        self.reported.clear();
    }
}

/// Collapse a hit list to one entry per file, keeping the first chunk seen
pub fn flatten_by_file(hits: &[ContentHit]) -> Vec<&ContentHit> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert(hit.document_id()))
        .collect()
}
