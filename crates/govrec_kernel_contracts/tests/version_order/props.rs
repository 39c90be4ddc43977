#![forbid(unsafe_code)]

use std::cmp::Ordering;

use govrec_kernel_contracts::model::ModelIndex;
use govrec_kernel_contracts::{compare_versions, IndexOrder, ModelVersion, RecordIndex};
use proptest::prelude::*;

fn arb_version() -> impl Strategy<Value = String> {
    (0u64..50, 0u64..50, 0u64..50).prop_map(|(a, b, c)| format!("{a}.{b}.{c}"))
}

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in arb_version(), b in arb_version()) {
        prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
    }

    #[test]
    fn compare_is_transitive(a in arb_version(), b in arb_version(), c in arb_version()) {
        if compare_versions(&a, &b) != Ordering::Greater
            && compare_versions(&b, &c) != Ordering::Greater
        {
            prop_assert_ne!(compare_versions(&a, &c), Ordering::Greater);
        }
    }

    #[test]
    fn compare_agrees_with_parsed_triples(a in arb_version(), b in arb_version()) {
        let pa = ModelVersion::parse("version", &a).unwrap();
        let pb = ModelVersion::parse("version", &b).unwrap();
        prop_assert_eq!(compare_versions(&a, &b), pa.cmp(&pb));
    }

    #[test]
    fn version_index_stays_sorted_and_deduplicated(
        versions in proptest::collection::vec(arb_version(), 0..40)
    ) {
        let mut idx = ModelIndex::empty("model-x");
        for v in &versions {
            idx.insert_member(v, IndexOrder::Version);
        }
        let members = idx.members();
        for pair in members.windows(2) {
            prop_assert_ne!(compare_versions(&pair[0], &pair[1]), Ordering::Greater);
        }
        let mut distinct = versions.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(members.len(), distinct.len());
    }

    #[test]
    fn insertion_order_is_independent_of_duplicates(
        ids in proptest::collection::vec("[a-z]{3,8}", 0..30)
    ) {
        let mut idx = ModelIndex::empty("owner");
        for id in &ids {
            idx.insert_member(id, IndexOrder::Insertion);
            idx.insert_member(id, IndexOrder::Insertion);
        }
        let mut expected: Vec<String> = Vec::new();
        for id in &ids {
            if !expected.contains(id) {
                expected.push(id.clone());
            }
        }
        prop_assert_eq!(idx.members(), expected.as_slice());
    }
}
