//! Vector search engine that owns one index and its worker pool.
//!
//! This module provides the main entry point for vector search
//! functionality, coordinating between storage, the similarity kernel,
//! parallel search and quantization.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{VectorError, VectorResult};
use crate::vector::quantize::{self, QuantizedVector};
use crate::vector::search::{self, DEFAULT_MIN_PARALLEL_LEN};
use crate::vector::store::{DuplicateIdPolicy, VectorStore};
use crate::vector::types::{DocumentId, SearchParams, SearchResult, VectorDimension};
use crate::vector::{batch, kernel};

/// Snapshot of engine size and shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Physical entries, aliased duplicates included.
    pub document_count: usize,
    pub unique_ids: usize,
    pub dimension: usize,
    pub memory_estimate_bytes: usize,
    pub worker_threads: usize,
}

/// Exhaustive cosine-similarity index over in-memory vectors.
///
/// The engine is append-only. `add_document` needs `&mut self` and every
/// query needs `&self`, so the borrow checker already keeps writes out of
/// in-flight searches. Use [`ConcurrentVectorEngine`] to share one index
/// between threads.
pub struct VectorSearchEngine {
    store: VectorStore,

    /// Worker pool for scans and batches.
    pool: rayon::ThreadPool,

    /// Smallest number of candidates a rayon split will hold.
    min_parallel_len: usize,
}

impl VectorSearchEngine {
    /// Creates an engine with default pool size and duplicate policy.
    ///
    /// # Errors
    ///
    /// Returns `VectorError::ThreadPool` if the worker pool cannot start.
    pub fn new(dimension: VectorDimension) -> VectorResult<Self> {
        Self::build(
            dimension,
            DuplicateIdPolicy::default(),
            0,
            DEFAULT_MIN_PARALLEL_LEN,
        )
    }

    /// Creates an engine from a plain dimension value.
    ///
    /// # Errors
    ///
    /// `InvalidDimension` for zero, `ThreadPool` if the pool cannot start.
    pub fn with_dimension(dimension: usize) -> VectorResult<Self> {
        Self::new(VectorDimension::new(dimension)?)
    }

    /// Creates an engine from the `[engine]` configuration section.
    pub fn from_config(config: &EngineConfig) -> VectorResult<Self> {
        Self::build(
            config.dimension,
            config.duplicate_ids,
            config.parallel_threads,
            config.min_parallel_len,
        )
    }

    fn build(
        dimension: VectorDimension,
        duplicate_policy: DuplicateIdPolicy,
        threads: usize,
        min_parallel_len: usize,
    ) -> VectorResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("vecscan-search-{i}"))
            .build()
            .map_err(|e| VectorError::ThreadPool(e.to_string()))?;

        info!(
            "Vector engine ready: dimension {}, {} worker threads, duplicate ids {:?}",
            dimension.get(),
            pool.current_num_threads(),
            duplicate_policy
        );

        Ok(Self {
            store: VectorStore::with_policy(dimension, duplicate_policy),
            pool,
            min_parallel_len: min_parallel_len.max(1),
        })
    }

    /// Adds a document vector and returns its storage position.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` on a wrong-length vector, `DuplicateId` for a
    /// repeated id under the reject policy. Nothing is inserted on error.
    pub fn add_document(&mut self, id: DocumentId, vector: &[f32]) -> VectorResult<usize> {
        self.store.add(id, vector)
    }

    /// Adds many documents; all are validated before any is inserted.
    pub fn add_documents<'a, I>(&mut self, documents: I) -> VectorResult<usize>
    where
        I: IntoIterator<Item = (DocumentId, &'a [f32])>,
    {
        self.store.add_batch(documents)
    }

    /// Top 10 matches with similarity >= 0.0.
    #[must_use = "Search results should be processed to retrieve relevant documents"]
    pub fn search(&self, query: &[f32]) -> VectorResult<Vec<SearchResult>> {
        self.search_with(query, SearchParams::default())
    }

    /// Ranked matches for `query` under `params`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the query length differs from the dimension.
    #[must_use = "Search results should be processed to retrieve relevant documents"]
    pub fn search_with(
        &self,
        query: &[f32],
        params: SearchParams,
    ) -> VectorResult<Vec<SearchResult>> {
        self.pool
            .install(|| search::search(&self.store, query, params, self.min_parallel_len))
    }

    /// One independent result slot per query, in input order.
    #[must_use = "Search results should be processed to retrieve relevant documents"]
    pub fn search_batch<Q>(
        &self,
        queries: &[Q],
        params: SearchParams,
    ) -> Vec<VectorResult<Vec<SearchResult>>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        self.pool.install(|| {
            batch::search_batch(&self.store, queries, params, self.min_parallel_len)
        })
    }

    /// Cosine similarity of two vectors of this engine's dimension.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> VectorResult<f32> {
        kernel::similarity(self.store.dimension(), a, b)
    }

    /// Signed 8-bit scalar quantization of `vector`.
    ///
    /// Independent of any index, so vectors of any non-zero length are
    /// accepted.
    pub fn quantize(vector: &[f32]) -> VectorResult<QuantizedVector> {
        quantize::quantize(vector)
    }

    /// Most recently added vector for `id`.
    #[must_use]
    pub fn get(&self, id: DocumentId) -> Option<&[f32]> {
        self.store.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: DocumentId) -> bool {
        self.store.contains(id)
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.store.count()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.store.dimension()
    }

    /// Approximate memory footprint in bytes; see [`VectorStore::memory_estimate`].
    #[must_use]
    pub fn memory_estimate(&self) -> usize {
        self.store.memory_estimate()
    }

    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            document_count: self.store.count(),
            unique_ids: self.store.unique_ids(),
            dimension: self.store.dimension().get(),
            memory_estimate_bytes: self.memory_estimate(),
            worker_threads: self.worker_threads(),
        }
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

impl fmt::Debug for VectorSearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorSearchEngine")
            .field("document_count", &self.store.count())
            .field("dimension", &self.store.dimension().get())
            .field("worker_threads", &self.pool.current_num_threads())
            .field("min_parallel_len", &self.min_parallel_len)
            .finish()
    }
}

/// Shareable handle to one engine.
///
/// Writes take the exclusive lock and reads the shared one, so concurrent
/// searches proceed together while an `add_document` waits for them to
/// drain.
#[derive(Clone)]
pub struct ConcurrentVectorEngine {
    inner: Arc<RwLock<VectorSearchEngine>>,
}

impl ConcurrentVectorEngine {
    pub fn new(engine: VectorSearchEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn add_document(&self, id: DocumentId, vector: &[f32]) -> VectorResult<usize> {
        self.inner.write().add_document(id, vector)
    }

    pub fn search(&self, query: &[f32]) -> VectorResult<Vec<SearchResult>> {
        self.inner.read().search(query)
    }

    pub fn search_with(
        &self,
        query: &[f32],
        params: SearchParams,
    ) -> VectorResult<Vec<SearchResult>> {
        self.inner.read().search_with(query, params)
    }

    pub fn search_batch<Q>(
        &self,
        queries: &[Q],
        params: SearchParams,
    ) -> Vec<VectorResult<Vec<SearchResult>>>
    where
        Q: AsRef<[f32]> + Sync,
    {
        self.inner.read().search_batch(queries, params)
    }

    pub fn similarity(&self, a: &[f32], b: &[f32]) -> VectorResult<f32> {
        self.inner.read().similarity(a, b)
    }

    pub fn document_count(&self) -> usize {
        self.inner.read().document_count()
    }

    pub fn stats(&self) -> EngineStats {
        self.inner.read().stats()
    }

    /// Runs `f` with shared access to the engine.
    pub fn with_read<R>(&self, f: impl FnOnce(&VectorSearchEngine) -> R) -> R {
        f(&self.inner.read())
    }
}

impl fmt::Debug for ConcurrentVectorEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Try to acquire read lock for debug output
        match self.inner.try_read() {
            Some(engine) => write!(f, "ConcurrentVectorEngine {{ engine: {:?} }}", &*engine),
            None => write!(f, "ConcurrentVectorEngine {{ <locked> }}"),
        }
    }
}
