//! Property-based tests for the collection cache
//!
//! The cache must track a reference model (a snapshot with the same
//! mutations applied) for any sequence of inserts, updates and deletes.

use crate::common::member;
use proptest::prelude::*;
use showcase_sync::client::CacheStore;
use showcase_sync::shared::{Collection, Mutation, Record, Snapshot};

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    let id = prop::sample::select(vec!["m1", "m2", "m3", "m4"]);
    let name = "[A-Z][a-z]{1,8}";
    prop_oneof![
        (id.clone(), name)
            .prop_map(|(id, name)| Mutation::Insert(Record::Member(member(id, &name)))),
        (id.clone(), name)
            .prop_map(|(id, name)| Mutation::Update(Record::Member(member(id, &name)))),
        id.prop_map(|id| Mutation::Delete {
            collection: Collection::Members,
            id: id.to_string(),
        }),
    ]
}

proptest! {
    #[test]
    fn test_cache_matches_snapshot_model(
        mutations in prop::collection::vec(mutation_strategy(), 0..40)
    ) {
        let mut cache = CacheStore::new();
        let mut model = Snapshot::default();

        for mutation in &mutations {
            cache.apply(mutation);
            model.apply(mutation);
        }

        prop_assert_eq!(cache.members.items(), model.members.as_slice());
    }

    #[test]
    fn test_ids_stay_unique(mutations in prop::collection::vec(mutation_strategy(), 0..40)) {
        let mut cache = CacheStore::new();
        for mutation in &mutations {
            cache.apply(mutation);
        }

        let mut ids: Vec<&str> = cache.members.items().iter().map(|m| m.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_delete_is_idempotent(
        mutations in prop::collection::vec(mutation_strategy(), 0..20),
        target in 1..5u8
    ) {
        let mut cache = CacheStore::new();
        for mutation in &mutations {
            cache.apply(mutation);
        }
        let delete = Mutation::Delete {
            collection: Collection::Members,
            id: format!("m{}", target),
        };

        cache.apply(&delete);
        let once = cache.members.items().to_vec();
        cache.apply(&delete);

        prop_assert_eq!(cache.members.items(), once.as_slice());
    }
}
