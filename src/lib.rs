//! In-memory exact vector search with SIMD cosine similarity.
//!
//! ```no_run
//! use vecscan::{DocumentId, SearchParams, VectorSearchEngine};
//!
//! let mut engine = VectorSearchEngine::with_dimension(3)?;
//! engine.add_document(DocumentId::new(1), &[1.0, 0.0, 0.0])?;
//! engine.add_document(DocumentId::new(2), &[0.0, 1.0, 0.0])?;
//!
//! let hits = engine.search_with(&[0.9, 0.1, 0.0], SearchParams::new(1, 0.5))?;
//! assert_eq!(hits[0].id, DocumentId::new(1));
//! # Ok::<(), vecscan::VectorError>(())
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{VectorError, VectorResult};
pub use vector::{
    ConcurrentVectorEngine, DocumentId, DuplicateIdPolicy, EngineStats, QuantizedVector,
    SearchParams, SearchResult, VectorDimension, VectorSearchEngine,
};
