//! rollcall-core — face enrollment and matching engine.
//!
//! Subjects are enrolled into an in-memory [`Gallery`] as sets of face
//! embeddings; a [`Matcher`] finds, for each probe embedding, the closest
//! enrolled embedding under a distance threshold. Embedding extraction is
//! an external capability behind [`extractor::EmbeddingExtractor`].

pub mod extractor;
pub mod gallery;
pub mod matcher;
pub mod types;

pub use extractor::{Detection, EmbeddingExtractor, ExtractorError};
pub use gallery::{Gallery, GalleryError};
pub use matcher::{
    LinearScan, MatchError, Matcher, Nearest, NearestNeighbor, DEFAULT_MATCH_THRESHOLD,
};
pub use types::{BoundingBox, Embedding, MatchResult, Subject, SubjectSummary};
