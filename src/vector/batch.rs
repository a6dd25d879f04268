//! Batched queries.
//!
//! Each query in a batch is an independent [`search`] call. Queries run in
//! parallel with each other and nest their own scan inside the same pool;
//! rayon's work stealing balances the two levels. Results keep input
//! order, and one query failing its dimension check only affects its own
//! slot.

use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::error::VectorResult;
use crate::vector::search::search;
use crate::vector::store::VectorStore;
use crate::vector::types::{SearchParams, SearchResult};

/// Runs every query against `store`; `results[i]` answers `queries[i]`.
pub fn search_batch<Q>(
    store: &VectorStore,
    queries: &[Q],
    params: SearchParams,
    min_parallel_len: usize,
) -> Vec<VectorResult<Vec<SearchResult>>>
where
    Q: AsRef<[f32]> + Sync,
{
    let started = Instant::now();

    let results: Vec<_> = queries
        .par_iter()
        .map(|query| search(store, query.as_ref(), params, min_parallel_len))
        .collect();

    debug!(
        "Batch of {} queries ({} failed) finished in {:?}",
        queries.len(),
        results.iter().filter(|r| r.is_err()).count(),
        started.elapsed()
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;
    use crate::vector::types::{DocumentId, VectorDimension};

    fn store() -> VectorStore {
        let mut store = VectorStore::new(VectorDimension::new(3).unwrap());
        store.add(DocumentId::new(1), &[1.0, 0.0, 0.0]).unwrap();
        store.add(DocumentId::new(2), &[0.0, 1.0, 0.0]).unwrap();
        store.add(DocumentId::new(3), &[0.0, 0.0, 1.0]).unwrap();
        store
    }

    #[test]
    fn test_batch_preserves_query_order() {
        let store = store();
        let queries = vec![
            vec![0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
        ];
        let results = search_batch(&store, &queries, SearchParams::new(1, 0.5), 1);

        let top: Vec<i64> = results
            .iter()
            .map(|r| r.as_ref().unwrap()[0].id.get())
            .collect();
        assert_eq!(top, vec![3, 1, 2]);
    }

    #[test]
    fn test_batch_matches_single_searches() {
        let store = store();
        let queries = [[0.3f32, 0.9, 0.1], [0.7, 0.7, 0.0]];
        let params = SearchParams::new(2, 0.0);

        let batch = search_batch(&store, &queries, params, 1);
        for (query, batched) in queries.iter().zip(&batch) {
            let single = search(&store, query, params, 1).unwrap();
            assert_eq!(batched.as_ref().unwrap(), &single);
        }
    }

    #[test]
    fn test_bad_query_does_not_affect_siblings() {
        let store = store();
        let queries: Vec<Vec<f32>> = vec![vec![1.0, 0.0, 0.0], vec![1.0], vec![0.0, 1.0, 0.0]];
        let results = search_batch(&store, &queries, SearchParams::default(), 1);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()[0].id.get(), 1);
        assert_eq!(
            results[1],
            Err(VectorError::DimensionMismatch {
                expected: 3,
                actual: 1
            })
        );
        assert_eq!(results[2].as_ref().unwrap()[0].id.get(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let store = store();
        let queries: Vec<Vec<f32>> = Vec::new();
        assert!(search_batch(&store, &queries, SearchParams::default(), 1).is_empty());
    }
}
