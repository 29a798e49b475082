use serde::{Deserialize, Serialize};

/// Bounding box for a detected face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// Face embedding vector (fixed-length, model-defined dimension).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Whether this embedding can be enrolled or matched: non-empty and
    /// every component finite.
    pub fn is_usable(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|v| v.is_finite())
    }

    /// Euclidean distance to another embedding — the metric the upstream
    /// embedding model is calibrated against.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self { values }
    }
}

/// An enrolled subject and every embedding captured for them.
///
/// All embeddings participate in matching independently; there is no
/// averaging or centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub display_name: String,
    pub embeddings: Vec<Embedding>,
}

/// Roster entry: subject identity without embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub id: String,
    pub display_name: String,
}

/// Best gallery match for a single probe embedding.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub subject_id: String,
    pub display_name: String,
    /// 1 − distance, clamped to [0, 1].
    pub similarity: f32,
}
