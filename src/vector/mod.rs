//! Exhaustive vector similarity search.
//!
//! Vectors live in one contiguous row-major buffer and every query is
//! scored against all of them, so results are exact rather than
//! approximate.
//!
//! # Architecture
//! - [`kernel`]: SIMD cosine similarity over `wide::f32x8` lanes.
//! - [`VectorStore`]: append-only flat storage with an id lookup table.
//! - [`search`]: parallel scan into per-split buffers, then top-k selection.
//! - [`search_batch`]: many independent queries over one store.
//! - [`quantize()`]: per-vector signed 8-bit scalar quantization.
//! - [`VectorSearchEngine`]: owns a store and a rayon pool and exposes the
//!   operations above with dimension checks.

mod batch;
mod engine;
pub mod kernel;
mod quantize;
pub mod search;
mod store;
mod types;

// Re-export core types for public API
pub use batch::search_batch;
pub use engine::{ConcurrentVectorEngine, EngineStats, VectorSearchEngine};
pub use kernel::{cosine_similarity, normalize};
pub use quantize::{QuantizedVector, quantize};
pub use search::{Candidate, DEFAULT_MIN_PARALLEL_LEN};
pub use store::{DuplicateIdPolicy, VectorStore};
pub use types::{
    DEFAULT_MIN_SIMILARITY, DEFAULT_TOP_K, DocumentId, SearchParams, SearchResult,
    VECTOR_DIMENSION_384, VectorDimension,
};
