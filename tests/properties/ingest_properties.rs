//! Ingestion accounting under random dimension errors.

use std::sync::Arc;

use proptest::prelude::*;
use tokio::runtime::Runtime;

use hybrid_search::document::DocumentInput;
use hybrid_search::ingest::IngestErrorKind;
use hybrid_search::service::HybridSearch;
use hybrid_search::store::MemoryStore;
use hybrid_search::test_utils::test_config;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// A document of `dims` dimensions, tagged with its position.
fn doc(position: usize, dims: usize) -> DocumentInput {
    DocumentInput::new(format!("document {position}"), vec![0.5; dims]).with_id(format!("doc-{position}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn report_accounts_for_every_document(
        dims in prop::collection::vec(prop_oneof![3 => Just(3usize), 1 => 1usize..6], 0..24),
        batch_size in 1usize..8,
    ) {
        let mut config = test_config();
        config.ingest.batch_size = batch_size;
        let service = HybridSearch::with_store(Arc::new(MemoryStore::new()), config).unwrap();
        let inputs: Vec<DocumentInput> = dims.iter().enumerate().map(|(i, d)| doc(i, *d)).collect();

        let (report, count) = runtime().block_on(async {
            service.provision().await.unwrap();
            let report = service.ingest("test", inputs).await.unwrap();
            let count = service.count("test").await.unwrap();
            (report, count)
        });

        prop_assert_eq!(report.total(), dims.len());

        let mut rejected: Vec<String> = report
            .rejected(IngestErrorKind::DimensionMismatch)
            .map(str::to_string)
            .collect();
        rejected.sort();
        let mut wrong: Vec<String> = dims
            .iter()
            .enumerate()
            .filter(|(_, d)| **d != 3)
            .map(|(i, _)| format!("doc-{i}"))
            .collect();
        wrong.sort();
        prop_assert_eq!(rejected, wrong);

        prop_assert_eq!(report.accepted as u64, count);
    }
}
