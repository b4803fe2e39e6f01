//! Overlay semantics checked against direct application.
//!
//! The shadow store must be observationally equivalent to applying the same
//! writes directly: reads and prefix scans through the overlay see exactly
//! the state the parent will hold after commit.

use proptest::prelude::*;

use tideflow_store::{KvStore, MemStore, Overlay};

/// A write-side operation against a small key space.
#[derive(Debug, Clone)]
enum Op {
    Set(u8, u8),
    Delete(u8),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            (any::<u8>(), any::<u8>()).prop_map(|(k, v)| Op::Set(k % 16, v)),
            any::<u8>().prop_map(|k| Op::Delete(k % 16)),
        ],
        0..40,
    )
}

fn key(k: u8) -> Vec<u8> {
    vec![b'k', k]
}

fn apply(store: &mut dyn KvStore, ops: &[Op]) {
    for op in ops {
        match op {
            Op::Set(k, v) => store.set(key(*k), vec![*v]),
            Op::Delete(k) => store.delete(&key(*k)),
        }
    }
}

proptest! {
    /// Committing an overlay leaves the parent exactly as if the operations
    /// had been applied directly.
    #[test]
    fn commit_equals_direct_application(seed in arb_ops(), ops in arb_ops()) {
        let mut direct = MemStore::new();
        apply(&mut direct, &seed);
        apply(&mut direct, &ops);

        let mut shadowed = MemStore::new();
        apply(&mut shadowed, &seed);
        {
            let mut overlay = Overlay::new(&mut shadowed);
            apply(&mut overlay, &ops);
            overlay.commit();
        }

        prop_assert_eq!(direct.prefix_scan(b""), shadowed.prefix_scan(b""));
    }

    /// The overlay's view equals the post-commit state, before committing.
    #[test]
    fn overlay_view_matches_committed_state(seed in arb_ops(), ops in arb_ops()) {
        let mut store = MemStore::new();
        apply(&mut store, &seed);

        let (viewed_scan, viewed_gets) = {
            let mut overlay = Overlay::new(&mut store);
            apply(&mut overlay, &ops);
            let scan = overlay.prefix_scan(b"k");
            let gets: Vec<_> = (0u8..16).map(|k| overlay.get(&key(k))).collect();
            overlay.commit();
            (scan, gets)
        };

        prop_assert_eq!(viewed_scan, store.prefix_scan(b"k"));
        let direct_gets: Vec<_> = (0u8..16).map(|k| store.get(&key(k))).collect();
        prop_assert_eq!(viewed_gets, direct_gets);
    }

    /// A dropped overlay leaves the parent bit-identical.
    #[test]
    fn dropped_overlay_changes_nothing(seed in arb_ops(), ops in arb_ops()) {
        let mut store = MemStore::new();
        apply(&mut store, &seed);
        let before = store.prefix_scan(b"");

        {
            let mut overlay = Overlay::new(&mut store);
            apply(&mut overlay, &ops);
            // Dropped without commit.
        }

        prop_assert_eq!(before, store.prefix_scan(b""));
    }
}
