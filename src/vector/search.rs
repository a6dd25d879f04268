//! Exhaustive parallel scan and top-k selection.
//!
//! A search runs in two phases separated by rayon's join barrier:
//!
//! 1. **Scan**: the storage range `[0, count)` is split across the worker
//!    pool. Each split scores its entries with the SIMD kernel and keeps
//!    those at or above the similarity floor in a private buffer. Buffers
//!    are concatenated pairwise in the reduce step, so no lock is taken
//!    and no match can be lost to a racing append.
//! 2. **Select**: once every split has finished, the merged buffer is
//!    partially ordered so the best `k` matches come first, truncated, and
//!    the survivors sorted.
//!
//! # Ordering
//! Results are ordered by similarity descending, then id ascending, then
//! storage position ascending. The secondary keys make the output
//! independent of how rayon happened to split the work.

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::error::VectorResult;
use crate::vector::kernel::cosine_similarity;
use crate::vector::store::VectorStore;
use crate::vector::types::{SearchParams, SearchResult};

/// Default minimum number of entries a rayon split will hold.
pub const DEFAULT_MIN_PARALLEL_LEN: usize = 256;

/// A match still carrying its storage position for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub position: usize,
    pub result: SearchResult,
}

/// Scores `query` against every stored vector and returns the ranked
/// top-k matches.
///
/// Must be called inside the worker pool (`ThreadPool::install`) for the
/// scan to use that pool rather than rayon's global one.
///
/// # Errors
///
/// Returns `VectorError::DimensionMismatch` if the query length differs
/// from the store's dimension.
pub fn search(
    store: &VectorStore,
    query: &[f32],
    params: SearchParams,
    min_parallel_len: usize,
) -> VectorResult<Vec<SearchResult>> {
    store.dimension().validate_vector(query)?;

    if params.top_k == 0 || store.is_empty() {
        return Ok(Vec::new());
    }

    let started = Instant::now();
    let matches = scan(store, query, params.min_similarity, min_parallel_len);
    let matched = matches.len();
    let results = select_top_k(matches, params.top_k);

    debug!(
        "Scanned {} vectors: {matched} matched >= {}, returning {} in {:?}",
        store.count(),
        params.min_similarity,
        results.len(),
        started.elapsed()
    );

    Ok(results)
}

/// Parallel scan phase: every entry with `similarity >= min_similarity`.
///
/// The returned order depends on how the range was split and is not
/// meaningful. Entries scoring NaN never pass the floor.
pub fn scan(
    store: &VectorStore,
    query: &[f32],
    min_similarity: f32,
    min_parallel_len: usize,
) -> Vec<Candidate> {
    let dim = store.dimension().get();

    store
        .ids()
        .par_iter()
        .zip(store.data().par_chunks_exact(dim))
        .enumerate()
        .with_min_len(min_parallel_len.max(1))
        .fold(Vec::new, |mut local, (position, (&id, vector))| {
            let similarity = cosine_similarity(query, vector);
            if similarity >= min_similarity {
                local.push(Candidate {
                    position,
                    result: SearchResult::new(id, similarity),
                });
            }
            local
        })
        .reduce(Vec::new, |mut left, mut right| {
            if left.len() < right.len() {
                std::mem::swap(&mut left, &mut right);
            }
            left.append(&mut right);
            left
        })
}

/// Selection phase: the best `min(top_k, len)` candidates, ranked.
///
/// Only the first `k` positions are fully sorted; the rest are discarded
/// after an O(n) partition.
pub fn select_top_k(mut candidates: Vec<Candidate>, top_k: usize) -> Vec<SearchResult> {
    if top_k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let k = top_k.min(candidates.len());
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, rank);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(rank);

    candidates.into_iter().map(|c| c.result).collect()
}

/// Total order used for ranking: best first.
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    sort_key(b.result.similarity)
        .total_cmp(&sort_key(a.result.similarity))
        .then_with(|| a.result.id.cmp(&b.result.id))
        .then_with(|| a.position.cmp(&b.position))
}

/// Folds `-0.0` into `0.0` so the two compare equal under `total_cmp`.
#[inline]
fn sort_key(similarity: f32) -> f32 {
    if similarity == 0.0 { 0.0 } else { similarity }
}
