//! In-memory index service
//!
//! Documents are buffered as pending until `commit()` moves them to the
//! committed set; queries and counts only ever see committed documents.
//!
//! # Matching
//!
//! - Literal keywords: case-insensitive token phrase match. The answer has
//!   a single entry keyed by the keyword's query string.
//! - Regex keywords: the expression must match a whole token
//!   (case-insensitive). The answer has one entry per distinct token.
//!
//! Metadata-only documents count as indexed files but never match.

use crate::tokenizer::{contains_phrase, tokenize};
use keyhunt_core::{
    ContentHit, DataSourceId, Document, DocumentContent, FileId, IndexError, IndexService,
    Keyword, QueryFilter, QueryResults,
};
use parking_lot::{Mutex, RwLock};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Characters of context on each side of a snippet match
const SNIPPET_CONTEXT: usize = 40;

#[derive(Debug, Clone)]
struct StoredDoc {
    file_id: FileId,
    data_source: Option<DataSourceId>,
    name: String,
    parent_path: String,
    chunk: Option<u32>,
    text: Option<String>,
    tokens: Vec<String>,
}

impl StoredDoc {
    fn from_document(doc: Document) -> Self {
        let text = match doc.content {
            DocumentContent::MetadataOnly => None,
            DocumentContent::Text(text) => Some(text),
        };
        let tokens = text.as_deref().map(tokenize).unwrap_or_default();
        Self {
            file_id: doc.file_id,
            data_source: doc.data_source,
            name: doc.name,
            parent_path: doc.parent_path,
            chunk: doc.chunk,
            text,
            tokens,
        }
    }

    fn hit(&self) -> Option<ContentHit> {
        Some(ContentHit {
            file_id: self.file_id,
            chunk: self.chunk.unwrap_or(0),
            data_source: self.data_source?,
            file_name: self.name.clone(),
            parent_path: self.parent_path.clone(),
        })
    }
}

/// Index service keeping every document in memory
#[derive(Debug)]
pub struct InMemoryIndex {
    pending: Mutex<Vec<StoredDoc>>,
    committed: RwLock<Vec<StoredDoc>>,
    available: AtomicBool,
    failing_queries: RwLock<HashSet<String>>,
    commits: AtomicU64,
    queries: AtomicU64,
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIndex {
    /// Create an empty, available index
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            committed: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            failing_queries: RwLock::new(HashSet::new()),
            commits: AtomicU64::new(0),
            queries: AtomicU64::new(0),
        }
    }

    /// Make every request fail as unavailable (false) or work again (true)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make queries for this exact query string fail with a query error
    pub fn fail_query(&self, query: &str) {
        self.failing_queries.write().insert(query.to_string());
    }

    /// Stop failing queries
    pub fn clear_failures(&self) {
        self.failing_queries.write().clear();
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of `query` calls, failed ones included
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Documents added but not yet committed
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn check_available(&self) -> Result<(), IndexError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(IndexError::unavailable("in-memory index is offline"))
        }
    }

    fn literal_hits(&self, keyword: &Keyword, filter: &QueryFilter) -> QueryResults {
        let needle = tokenize(keyword.query());
        let hits: Vec<ContentHit> = self
            .committed
            .read()
            .iter()
            .filter(|doc| filter.admits(doc.data_source))
            .filter(|doc| contains_phrase(&doc.tokens, &needle))
            .filter_map(StoredDoc::hit)
            .collect();

        let mut results = QueryResults::new();
        if !hits.is_empty() {
            results.insert(keyword.query().to_string(), hits);
        }
        results
    }

    fn regex_hits(&self, keyword: &Keyword, filter: &QueryFilter) -> Result<QueryResults, IndexError> {
        let regex = RegexBuilder::new(&format!("^(?:{})$", keyword.query()))
            .case_insensitive(true)
            .build()
            .map_err(|e| IndexError::query(keyword.query(), e.to_string()))?;

        let mut results = QueryResults::new();
        for doc in self.committed.read().iter() {
            if !filter.admits(doc.data_source) {
                continue;
            }
            let terms: BTreeSet<&String> = doc.tokens.iter().filter(|t| regex.is_match(t)).collect();
            for term in terms {
                if let Some(hit) = doc.hit() {
                    results.entry(term.clone()).or_insert_with(Vec::new).push(hit);
                }
            }
        }
        Ok(results)
    }
}

impl IndexService for InMemoryIndex {
    fn is_running(&self) -> Result<bool, IndexError> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    fn add_document(&self, document: Document) -> Result<(), IndexError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(IndexError::Write {
                file_id: document.file_id,
                reason: "in-memory index is offline".to_string(),
            });
        }
        self.pending.lock().push(StoredDoc::from_document(document));
        Ok(())
    }

    fn commit(&self) -> Result<(), IndexError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(IndexError::Commit("in-memory index is offline".to_string()));
        }
        let drained: Vec<StoredDoc> = std::mem::take(&mut *self.pending.lock());
        let added = drained.len();
        self.committed.write().extend(drained);
        self.commits.fetch_add(1, Ordering::SeqCst);
        trace!(target: "keyhunt::index", added, "In-memory index committed");
        Ok(())
    }

    fn document_count(&self) -> Result<u64, IndexError> {
        self.check_available()?;
        Ok(self.committed.read().len() as u64)
    }

    fn num_indexed_files(&self) -> Result<u64, IndexError> {
        self.check_available()?;
        let files: HashSet<FileId> = self.committed.read().iter().map(|d| d.file_id).collect();
        Ok(files.len() as u64)
    }

    fn num_indexed_chunks(&self) -> Result<u64, IndexError> {
        self.check_available()?;
        Ok(self.committed.read().iter().filter(|d| d.chunk.is_some()).count() as u64)
    }

    fn query(&self, keyword: &Keyword, filter: &QueryFilter) -> Result<QueryResults, IndexError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.failing_queries.read().contains(keyword.query()) {
            return Err(IndexError::query(keyword.query(), "query rejected"));
        }
        if keyword.is_literal() {
            Ok(self.literal_hits(keyword, filter))
        } else {
            self.regex_hits(keyword, filter)
        }
    }

    fn snippet(
        &self,
        term: &str,
        file_id: FileId,
        chunk: u32,
        _is_regex: bool,
    ) -> Result<String, IndexError> {
        self.check_available()?;
        let committed = self.committed.read();
        let text = committed
            .iter()
            .find(|d| d.file_id == file_id && d.chunk.unwrap_or(0) == chunk)
            .and_then(|d| d.text.as_deref())
            .ok_or_else(|| IndexError::query(term, format!("no text for file {} chunk {}", file_id, chunk)))?;

        // regex hits carry the matched token, so both flavors look up a literal term
        let pattern = term_pattern(term)
            .ok_or_else(|| IndexError::query(term, "empty term"))?;
        let found = pattern
            .find(text)
            .ok_or_else(|| IndexError::query(term, "term not found in document"))?;
        Ok(render_snippet(text, found.start(), found.end()))
    }
}

/// Case-insensitive pattern matching the term's tokens separated by
/// anything non-alphanumeric
fn term_pattern(term: &str) -> Option<Regex> {
    let tokens = tokenize(term);
    if tokens.is_empty() {
        return None;
    }
    let body = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join(r"[^\p{Alphabetic}\p{N}]+");
    RegexBuilder::new(&format!(r"\b{}\b", body))
        .case_insensitive(true)
        .build()
        .ok()
}

fn render_snippet(text: &str, start: usize, end: usize) -> String {
    let before: String = {
        let chars: Vec<char> = text[..start].chars().rev().take(SNIPPET_CONTEXT).collect();
        chars.into_iter().rev().collect()
    };
    let after: String = text[end..].chars().take(SNIPPET_CONTEXT).collect();
    let lead = if before.len() < start { "..." } else { "" };
    let tail = if after.len() < text.len() - end { "..." } else { "" };
    format!("{}{}[{}]{}{}", lead, before, &text[start..end], after, tail)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
