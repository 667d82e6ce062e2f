//! In-memory keyword-hit artifact store

use keyhunt_core::{ArtifactError, ArtifactId, ArtifactWriter, FileId, KeywordHitArtifact};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Keeps every written artifact; ids start at 1
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<Vec<(ArtifactId, KeywordHitArtifact)>>,
    last_id: AtomicU64,
    failing: AtomicBool,
}

impl MemoryArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes fail (true) or succeed again (false)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    /// True if nothing was written
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }

    /// Every artifact in write order
    pub fn all(&self) -> Vec<KeywordHitArtifact> {
        self.artifacts.read().iter().map(|(_, a)| a.clone()).collect()
    }

    /// Artifact by id
    pub fn get(&self, id: ArtifactId) -> Option<KeywordHitArtifact> {
        self.artifacts
            .read()
            .iter()
            .find(|(stored, _)| *stored == id)
            .map(|(_, a)| a.clone())
    }

    /// Artifacts written for a term (case-insensitive)
    pub fn for_term(&self, term: &str) -> Vec<KeywordHitArtifact> {
        self.artifacts
            .read()
            .iter()
            .filter(|(_, a)| a.term.eq_ignore_ascii_case(term))
            .map(|(_, a)| a.clone())
            .collect()
    }

    /// Files with an artifact for a term, in write order
    pub fn files_for_term(&self, term: &str) -> Vec<FileId> {
        self.for_term(term).into_iter().map(|a| a.file_id).collect()
    }
}

impl ArtifactWriter for MemoryArtifactStore {
    fn write_keyword_hit(&self, artifact: KeywordHitArtifact) -> Result<ArtifactId, ArtifactError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ArtifactError(format!(
                "artifact store rejected hit for '{}'",
                artifact.term
            )));
        }
        let id = ArtifactId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.artifacts.write().push((id, artifact));
        Ok(id)
    }
}
