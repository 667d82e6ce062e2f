//! Editable keyword list store
//!
//! Lists can be changed while a job runs; a search run resolves lists when
//! it launches, so edits show up in the next run.

use keyhunt_core::{Keyword, KeywordList, KeywordListStore};
use parking_lot::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    list: KeywordList,
    for_ingest: bool,
}

/// Keyword lists kept in insertion order
#[derive(Debug, Default)]
pub struct StaticKeywordLists {
    entries: RwLock<Vec<Entry>>,
}

impl StaticKeywordLists {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a list, replacing a list with the same name in place
    pub fn insert(&self, list: KeywordList, for_ingest: bool) {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.list.name() == list.name()) {
            Some(existing) => {
                existing.list = list;
                existing.for_ingest = for_ingest;
            }
            None => entries.push(Entry { list, for_ingest }),
        }
    }

    /// Append a keyword to a named list. Returns false if the list does
    /// not exist or already has the keyword.
    pub fn add_keyword(&self, list_name: &str, keyword: Keyword) -> bool {
        self.entries
            .write()
            .iter_mut()
            .find(|e| e.list.name() == list_name)
            .is_some_and(|e| e.list.add(keyword))
    }

    /// Select or deselect a list for ingest search
    pub fn set_for_ingest(&self, list_name: &str, for_ingest: bool) -> bool {
        match self
            .entries
            .write()
            .iter_mut()
            .find(|e| e.list.name() == list_name)
        {
            Some(entry) => {
                entry.for_ingest = for_ingest;
                true
            }
            None => false,
        }
    }

    /// Remove a list. Returns true if it existed.
    pub fn remove(&self, list_name: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.list.name() != list_name);
        entries.len() != before
    }

    /// Remove every list
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl KeywordListStore for StaticKeywordLists {
    fn lists_for_ingest(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.for_ingest)
            .map(|e| e.list.name().to_string())
            .collect()
    }

    fn resolve(&self, name: &str) -> Option<KeywordList> {
        self.entries
            .read()
            .iter()
            .find(|e| e.list.name() == name)
            .map(|e| e.list.clone())
    }
}
