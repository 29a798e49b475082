//! In-memory gallery of enrolled subjects.

use std::sync::RwLock;

use thiserror::Error;

use crate::types::{Embedding, Subject, SubjectSummary};

#[derive(Error, Debug)]
pub enum GalleryError {
    /// Enrollment produced zero usable embeddings; nothing is stored.
    #[error("no usable embeddings for subject {subject_id:?}")]
    InvalidEnrollment { subject_id: String },
    /// Embedding dimensionality disagrees with the gallery.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Shared, mutable gallery of enrolled subjects.
///
/// Subjects are kept in enrollment order; re-enrolling an id replaces its
/// entry in place without moving it, so matching iterates subjects in a
/// stable order across the gallery's lifetime. Writes are exclusive, reads
/// shared — a reader never observes a partially replaced subject.
pub struct Gallery {
    inner: RwLock<Vec<Subject>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Enroll or replace a subject.
    ///
    /// Unusable embeddings (empty or with non-finite components) are
    /// dropped first; if none survive, the enrollment is rejected and any
    /// prior entry for the id is left untouched. Surviving embeddings must
    /// agree on one dimension, and with the gallery's dimension when it
    /// already holds subjects. A prior entry for the same id is replaced
    /// wholesale — embedding sets are never merged.
    ///
    /// Returns the number of embeddings stored.
    pub fn enroll(
        &self,
        subject_id: &str,
        display_name: &str,
        embeddings: Vec<Embedding>,
    ) -> Result<usize, GalleryError> {
        let total = embeddings.len();
        let usable: Vec<Embedding> = embeddings.into_iter().filter(|e| e.is_usable()).collect();
        if usable.len() < total {
            tracing::warn!(
                subject_id,
                dropped = total - usable.len(),
                "dropped unusable embeddings during enrollment"
            );
        }
        if usable.is_empty() {
            return Err(GalleryError::InvalidEnrollment {
                subject_id: subject_id.to_string(),
            });
        }

        let dim = usable[0].dim();
        if let Some(bad) = usable.iter().find(|e| e.dim() != dim) {
            return Err(GalleryError::DimensionMismatch {
                expected: dim,
                got: bad.dim(),
            });
        }

        let mut subjects = self.inner.write().unwrap();

        // The gallery's dimension is whatever its current contents use.
        let expected = subjects
            .first()
            .and_then(|s| s.embeddings.first())
            .map(|e| e.dim());
        if let Some(expected) = expected {
            if dim != expected {
                return Err(GalleryError::DimensionMismatch { expected, got: dim });
            }
        }

        let stored = usable.len();
        let subject = Subject {
            id: subject_id.to_string(),
            display_name: display_name.to_string(),
            embeddings: usable,
        };
        match subjects.iter_mut().find(|s| s.id == subject_id) {
            Some(existing) => *existing = subject,
            None => subjects.push(subject),
        }

        tracing::info!(subject_id, embeddings = stored, "subject enrolled");
        Ok(stored)
    }

    /// Read-only roster snapshot; embeddings are not exposed.
    pub fn subjects(&self) -> Vec<SubjectSummary> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .map(|s| SubjectSummary {
                id: s.id.clone(),
                display_name: s.display_name.clone(),
            })
            .collect()
    }

    /// Full snapshot including embeddings, in enrollment order.
    pub fn snapshot(&self) -> Vec<Subject> {
        self.inner.read().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Number of enrolled subjects.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Remove every subject. There is no per-subject deletion.
    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    /// Run `f` against the subject list under the read lock.
    ///
    /// Holding the guard for the whole closure keeps a multi-probe sweep
    /// on one consistent gallery state.
    pub fn with_subjects<R>(&self, f: impl FnOnce(&[Subject]) -> R) -> R {
        f(&self.inner.read().unwrap())
    }
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new()
    }
}
