//! Seam to the external face detection / embedding capability.
//!
//! The engine never computes embeddings itself — whatever backend produces
//! them (an ONNX model, a remote service) plugs in behind
//! [`EmbeddingExtractor`] and must hand every caller vectors of one fixed,
//! model-defined dimension.

use thiserror::Error;

use crate::types::{BoundingBox, Embedding};

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("extraction backend failed: {0}")]
    Backend(String),
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),
}

/// A face found in a frame: its location and identity embedding.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub embedding: Embedding,
}

/// Produces face embeddings from raw pixel data.
///
/// Takes `&mut self` because real backends hold inference session state.
pub trait EmbeddingExtractor: Send {
    /// Detect zero or more faces in a frame and embed each of them.
    fn extract_embeddings(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, ExtractorError>;
}
