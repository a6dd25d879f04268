//! Type-safe wrappers and core types for the vector index.
//!
//! Newtypes keep document ids, dimensions and similarities from being
//! mixed up with the plain integers and floats flowing around them.

use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};

/// Standard vector dimension for sentence embeddings (all-MiniLM-L6-v2 model).
pub const VECTOR_DIMENSION_384: usize = 384;

/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: usize = 10;

/// Default inclusive similarity floor for search results.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.0;

/// Caller-assigned document identifier.
///
/// Ids are opaque to the engine: zero and negative values are valid, and
/// the engine never allocates them itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Creates a new `DocumentId`.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for vector dimensions.
///
/// Validated once at construction; every vector entering the engine is
/// then checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> VectorResult<Self> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> VectorResult<()> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl Default for VectorDimension {
    fn default() -> Self {
        Self::dimension_384()
    }
}

impl TryFrom<usize> for VectorDimension {
    type Error = VectorError;

    fn try_from(dim: usize) -> Result<Self, Self::Error> {
        Self::new(dim)
    }
}

impl From<VectorDimension> for usize {
    fn from(dim: VectorDimension) -> Self {
        dim.0
    }
}

/// A single ranked match produced by a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocumentId,
    pub similarity: f32,
}

impl SearchResult {
    #[must_use]
    pub const fn new(id: DocumentId, similarity: f32) -> Self {
        Self { id, similarity }
    }
}

/// Knobs for a single search call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results; `0` yields an empty result list.
    pub top_k: usize,

    /// Inclusive lower bound on similarity.
    pub min_similarity: f32,
}

impl SearchParams {
    #[must_use]
    pub const fn new(top_k: usize, min_similarity: f32) -> Self {
        Self {
            top_k,
            min_similarity,
        }
    }

    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub const fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K, DEFAULT_MIN_SIMILARITY)
    }
}
