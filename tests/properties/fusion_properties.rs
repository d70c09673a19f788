//! Properties of Reciprocal Rank Fusion that callers rely on.

use proptest::prelude::*;

use hybrid_search::search::{RrfConfig, Source, fuse};
use hybrid_search::store::RankedHit;

fn ranked_list(pool: usize) -> impl Strategy<Value = Vec<RankedHit>> {
    let ids: Vec<String> = (0..pool).map(|i| format!("d{i}")).collect();
    (Just(ids).prop_shuffle(), 0..=pool).prop_map(|(ids, len)| {
        RankedHit::from_ordered(ids.into_iter().take(len).map(|id| (id, 1.0)))
    })
}

proptest! {
    #[test]
    fn list_order_does_not_change_scores(
        lexical in ranked_list(10),
        vector in ranked_list(10),
        k in 1.0f64..200.0,
    ) {
        let config = RrfConfig::with_rank_constant(k);
        let forward = fuse(
            &[(Source::Lexical, lexical.as_slice()), (Source::Vector, vector.as_slice())],
            &config,
            usize::MAX,
        );
        let backward = fuse(
            &[(Source::Vector, vector.as_slice()), (Source::Lexical, lexical.as_slice())],
            &config,
            usize::MAX,
        );

        prop_assert_eq!(forward.len(), backward.len());
        for (a, b) in forward.iter().zip(&backward) {
            prop_assert_eq!(&a.document_id, &b.document_id);
            prop_assert!((a.fused_score - b.fused_score).abs() < 1e-12);
        }
    }

    #[test]
    fn every_input_document_appears_once(
        lexical in ranked_list(10),
        vector in ranked_list(10),
    ) {
        let hits = fuse(
            &[(Source::Lexical, lexical.as_slice()), (Source::Vector, vector.as_slice())],
            &RrfConfig::default(),
            usize::MAX,
        );

        let mut expected: Vec<&str> = lexical
            .iter()
            .chain(&vector)
            .map(|h| h.document_id.as_str())
            .collect();
        expected.sort_unstable();
        expected.dedup();
        let mut actual: Vec<&str> = hits.iter().map(|h| h.document_id.as_str()).collect();
        actual.sort_unstable();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn fused_score_is_bounded_by_list_count(
        lexical in ranked_list(8),
        vector in ranked_list(8),
    ) {
        let config = RrfConfig::default();
        let ceiling = 2.0 * config.contribution(1);
        let hits = fuse(
            &[(Source::Lexical, lexical.as_slice()), (Source::Vector, vector.as_slice())],
            &config,
            usize::MAX,
        );
        for hit in &hits {
            prop_assert!(hit.fused_score > 0.0);
            prop_assert!(hit.fused_score <= ceiling + 1e-12);
        }
    }

    #[test]
    fn truncation_keeps_the_head(
        lexical in ranked_list(12),
        vector in ranked_list(12),
        top_n in 1usize..12,
    ) {
        let lists = [(Source::Lexical, lexical.as_slice()), (Source::Vector, vector.as_slice())];
        let full = fuse(&lists, &RrfConfig::default(), usize::MAX);
        let head = fuse(&lists, &RrfConfig::default(), top_n);
        prop_assert_eq!(&full[..head.len()], head.as_slice());
    }
}
