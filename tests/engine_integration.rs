//! End-to-end behavior of the engine through its public API.

use vecscan::{
    ConcurrentVectorEngine, DocumentId, DuplicateIdPolicy, SearchParams, SearchResult, Settings,
    VectorDimension, VectorError, VectorSearchEngine,
};

fn id(raw: i64) -> DocumentId {
    DocumentId::new(raw)
}

fn axis_engine() -> VectorSearchEngine {
    let mut engine = VectorSearchEngine::with_dimension(4).unwrap();
    engine.add_document(id(1), &[1.0, 0.0, 0.0, 0.0]).unwrap();
    engine.add_document(id(2), &[0.0, 1.0, 0.0, 0.0]).unwrap();
    engine.add_document(id(3), &[1.0, 0.0, 0.0, 0.0]).unwrap();
    engine
}

#[test]
fn test_axis_scenario_excludes_orthogonal_document() {
    let engine = axis_engine();

    let results = engine
        .search_with(&[1.0, 0.0, 0.0, 0.0], SearchParams::new(2, 0.1))
        .unwrap();

    assert_eq!(
        results,
        vec![
            SearchResult::new(id(1), 1.0),
            SearchResult::new(id(3), 1.0)
        ]
    );
}

#[test]
fn test_default_search_keeps_zero_similarity() {
    let engine = axis_engine();

    let results = engine.search(&[1.0, 0.0, 0.0, 0.0]).unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![1, 3, 2]);
    assert_eq!(results[2].similarity, 0.0);
}

#[test]
fn test_default_dimension_is_384() {
    let engine = VectorSearchEngine::new(VectorDimension::default()).unwrap();
    assert_eq!(engine.dimension().get(), 384);
    assert_eq!(engine.document_count(), 0);
    assert!(engine.search(&vec![0.5; 384]).unwrap().is_empty());
}

#[test]
fn test_zero_dimension_is_rejected() {
    assert!(matches!(
        VectorSearchEngine::with_dimension(0),
        Err(VectorError::InvalidDimension { dimension: 0, .. })
    ));
}

#[test]
fn test_dimension_gate_leaves_state_unchanged() {
    let mut engine = axis_engine();
    let before = engine.memory_estimate();

    let err = engine.add_document(id(9), &[1.0, 0.0]).unwrap_err();
    assert_eq!(
        err,
        VectorError::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    );
    assert_eq!(engine.document_count(), 3);
    assert_eq!(engine.memory_estimate(), before);
    assert!(!engine.contains(id(9)));

    assert!(matches!(
        engine.search(&[1.0; 5]),
        Err(VectorError::DimensionMismatch {
            expected: 4,
            actual: 5
        })
    ));
    assert!(matches!(
        engine.similarity(&[1.0; 4], &[1.0; 3]),
        Err(VectorError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_bulk_add_is_all_or_nothing() {
    let mut engine = VectorSearchEngine::with_dimension(2).unwrap();
    let good = [1.0f32, 0.0];
    let bad = [1.0f32];

    let result = engine.add_documents([(id(1), &good[..]), (id(2), &bad[..])]);
    assert!(result.is_err());
    assert_eq!(engine.document_count(), 0);

    assert_eq!(
        engine
            .add_documents([(id(1), &good[..]), (id(2), &good[..])])
            .unwrap(),
        2
    );
    assert_eq!(engine.document_count(), 2);
}

#[test]
fn test_duplicate_ids_alias_by_default() {
    let mut engine = VectorSearchEngine::with_dimension(2).unwrap();
    engine.add_document(id(7), &[1.0, 0.0]).unwrap();
    engine.add_document(id(7), &[0.6, 0.8]).unwrap();

    // Both physical entries are scanned.
    let results = engine.search(&[1.0, 0.0]).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.id == id(7)));
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    assert!((results[1].similarity - 0.6).abs() < 1e-6);

    // Lookup follows the newest entry.
    assert_eq!(engine.get(id(7)), Some(&[0.6f32, 0.8][..]));

    let stats = engine.stats();
    assert_eq!(stats.document_count, 2);
    assert_eq!(stats.unique_ids, 1);
}

#[test]
fn test_duplicate_ids_rejected_by_policy() {
    let mut settings = Settings::default();
    settings.engine.dimension = VectorDimension::new(2).unwrap();
    settings.engine.parallel_threads = 2;
    settings.engine.duplicate_ids = DuplicateIdPolicy::Reject;

    let mut engine = VectorSearchEngine::from_config(&settings.engine).unwrap();
    engine.add_document(id(7), &[1.0, 0.0]).unwrap();

    assert_eq!(
        engine.add_document(id(7), &[0.0, 1.0]),
        Err(VectorError::DuplicateId { id: 7 })
    );
    assert_eq!(engine.document_count(), 1);
    assert_eq!(engine.worker_threads(), 2);
}

#[test]
fn test_batch_matches_individual_searches() {
    let engine = axis_engine();
    let params = SearchParams::new(2, 0.0);
    let queries = vec![vec![0.0, 1.0, 0.0, 0.0], vec![0.7, 0.7, 0.0, 0.0]];

    let batch = engine.search_batch(&queries, params);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0], engine.search_with(&queries[0], params));
    assert_eq!(batch[1], engine.search_with(&queries[1], params));
}

#[test]
fn test_batch_isolates_bad_query() {
    let engine = axis_engine();
    let queries = vec![vec![1.0, 0.0, 0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]];

    let batch = engine.search_batch(&queries, SearchParams::default());
    assert!(batch[0].is_ok());
    assert!(matches!(
        batch[1],
        Err(VectorError::DimensionMismatch {
            expected: 4,
            actual: 2
        })
    ));
    assert_eq!(batch[2].as_ref().unwrap()[0].id, id(2));
}

#[test]
fn test_similarity_and_quantize_through_engine() {
    let engine = axis_engine();

    assert_eq!(
        engine
            .similarity(&[1.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 0.0])
            .unwrap(),
        0.0
    );
    let sim = engine
        .similarity(&[1.0, 1.0, 0.0, 0.0], &[1.0, 0.0, 0.0, 0.0])
        .unwrap();
    assert!((sim - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

    // Quantization does not depend on the engine dimension.
    let q = VectorSearchEngine::quantize(&[-1.0, 0.0, 1.0]).unwrap();
    assert_eq!(q.values(), &[-128, -1, 127]);
    assert_eq!(
        VectorSearchEngine::quantize(&[0.5; 6]).unwrap_err(),
        VectorError::DegenerateRange { value: 0.5 }
    );
    assert!(matches!(
        VectorSearchEngine::quantize(&[2.0, 2.0]),
        Err(VectorError::DegenerateRange { .. })
    ));
}

#[test]
fn test_memory_estimate_grows_per_document() {
    let mut engine = VectorSearchEngine::with_dimension(8).unwrap();
    let empty = engine.memory_estimate();

    engine.add_document(id(1), &[0.5; 8]).unwrap();
    let one = engine.memory_estimate();
    engine.add_document(id(2), &[0.5; 8]).unwrap();
    let two = engine.memory_estimate();

    assert!(one > empty);
    assert_eq!(two - one, one - empty);
    // At least the raw vector bytes.
    assert!(one - empty >= 8 * std::mem::size_of::<f32>());
}

#[test]
fn test_concurrent_readers_and_writer() {
    let handle = ConcurrentVectorEngine::new(VectorSearchEngine::with_dimension(3).unwrap());
    handle.add_document(id(0), &[1.0, 0.0, 0.0]).unwrap();

    let writer = {
        let handle = handle.clone();
        std::thread::spawn(move || {
            for i in 1..=50 {
                handle
                    .add_document(id(i), &[1.0, i as f32 * 0.01, 0.0])
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..20 {
                    let results = handle.search(&[1.0, 0.0, 0.0]).unwrap();
                    // id 0 is an exact match and always present.
                    assert_eq!(results[0].id, id(0));
                    assert!(results.len() <= 10);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(handle.document_count(), 51);
}
