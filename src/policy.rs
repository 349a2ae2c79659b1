//! Deletion strategies for [`OpenMap`].
//!
//! Open addressing cannot simply clear a slot on removal: a lookup for a
//! later key of the same collision run would stop at the hole and miss it.
//! [`Tombstone`] keeps the textbook answer, a deletion marker that probing
//! skips. [`BackwardShift`] avoids markers entirely by relocating entries of
//! the run backward over the vacated slot, leaving the table as if the
//! removed key had never been inserted.

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    mem,
};

use crate::open_map::{OpenMap, Slot, probe_sequence};

/// Strategy deciding how [`OpenMap::remove`] vacates a slot.
pub trait DeletionPolicy: Sized {
    /// Removes `key` from `map`, returning the value it was associated with.
    ///
    /// Removing an absent key is a silent no-op.
    fn remove<K, V, S, Q>(map: &mut OpenMap<K, V, Self, S>, key: &Q) -> Option<V>
    where
        K: Eq + Hash + Borrow<Q>,
        S: BuildHasher,
        Q: Hash + Eq + ?Sized;
}

/// Classic marker-based deletion.
///
/// The vacated slot becomes [`Slot::Deleted`] so probe sequences over it stay
/// intact; a later insertion may reclaim the marker. Markers accumulate until
/// the next resize, lengthening probes on crowded tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tombstone;

impl DeletionPolicy for Tombstone {
    fn remove<K, V, S, Q>(map: &mut OpenMap<K, V, Self, S>, key: &Q) -> Option<V>
    where
        K: Eq + Hash + Borrow<Q>,
        S: BuildHasher,
        Q: Hash + Eq + ?Sized,
    {
        let index = map.find(key)?;
        let slot = map.slots.get_mut(index)?;
        match mem::replace(slot, Slot::Deleted) {
            Slot::Occupied { value, .. } => {
                map.len = map.len.saturating_sub(1);
                Some(value)
            }
            // `find` only reports occupied slots; restore whatever was there.
            other => {
                *slot = other;
                None
            }
        }
    }
}

/// Tombstone-free deletion for linear probing.
///
/// Walks the collision run past the removed key and shifts each entry
/// backward into the current gap whenever its home position permits, so the
/// one slot that ends up vacant is genuinely [`Slot::Empty`] and immediately
/// reusable. Lookups never pay for past removals.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackwardShift;

impl DeletionPolicy for BackwardShift {
    fn remove<K, V, S, Q>(map: &mut OpenMap<K, V, Self, S>, key: &Q) -> Option<V>
    where
        K: Eq + Hash + Borrow<Q>,
        S: BuildHasher,
        Q: Hash + Eq + ?Sized,
    {
        let capacity = map.slots.len();
        // Position that currently needs filling. Vacated slots are emptied as
        // the scan advances, so once the scan stops the last gap is already
        // truly empty.
        let mut gap = None;
        let mut removed = None;

        for current in probe_sequence(map.home_index(key), capacity) {
            let (is_match, ideal) = match map.slots.get(current) {
                // End of the collision run.
                None | Some(Slot::Empty) => break,
                Some(Slot::Deleted) => continue,
                Some(Slot::Occupied { key: stored, .. }) => (
                    removed.is_none() && stored.borrow() == key,
                    map.home_index(stored),
                ),
            };

            if is_match {
                if let Some(slot) = map.slots.get_mut(current) {
                    if let Slot::Occupied { value, .. } = mem::replace(slot, Slot::Empty) {
                        removed = Some(value);
                    }
                }
                gap = Some(current);
            } else if let Some(open) = gap {
                // Relocating is safe only if the entry's home position keeps
                // the gap on its probe path.
                if !in_cyclic_range(open, ideal, current) {
                    let entry = map.slots.get_mut(current).map(|slot| mem::replace(slot, Slot::Empty));
                    if let Some(entry @ Slot::Occupied { .. }) = entry {
                        if let Some(dest) = map.slots.get_mut(open) {
                            *dest = entry;
                        }
                    }
                    gap = Some(current);
                }
            }
        }

        let value = removed?;
        map.len = map.len.saturating_sub(1);
        Some(value)
    }
}

/// True if `ideal` lies in the cyclic half-open interval `(gap, current]`.
///
/// An entry at `current` whose home is `ideal` reaches `gap` by linear
/// probing before `current` exactly when this returns false; only then may it
/// be shifted backward into the gap. The two arms cover the unwrapped
/// interval and the interval that crosses the table boundary.
fn in_cyclic_range(gap: usize, ideal: usize, current: usize) -> bool {
    if gap < current {
        gap < ideal && ideal <= current
    } else {
        gap < ideal || ideal <= current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hasher that reports a `u64` key as its own hash code, so tests can pin
    /// every key's home slot.
    #[derive(Debug, Clone, Copy, Default)]
    struct IdentityHasher {
        /// The code accumulated so far.
        code: u64,
    }

    impl std::hash::Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.code
        }

        fn write(&mut self, bytes: &[u8]) {
            let mut raw = [0_u8; 8];
            for (target, source) in raw.iter_mut().zip(bytes) {
                *target = *source;
            }
            self.code = u64::from_le_bytes(raw);
        }

        fn write_u64(&mut self, code: u64) {
            self.code = code;
        }
    }

    /// Builder state for [`IdentityHasher`].
    #[derive(Debug, Clone, Copy, Default)]
    struct IdentityState;

    impl BuildHasher for IdentityState {
        type Hasher = IdentityHasher;

        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher::default()
        }
    }

    /// Capacity-8 map whose `u64` keys pick their own home slot (`key % 8`).
    fn pinned_map<D: DeletionPolicy>() -> OpenMap<u64, u64, D, IdentityState> {
        OpenMap::with_capacity_and_hasher(8, IdentityState)
    }

    /// True if the slot at `index` is genuinely empty.
    fn slot_is_empty<D>(map: &OpenMap<u64, u64, D, IdentityState>, index: usize) -> bool {
        matches!(map.slots.get(index), Some(Slot::Empty))
    }

    /// Number of deletion markers currently in the table.
    fn tombstone_count<D>(map: &OpenMap<u64, u64, D, IdentityState>) -> usize {
        map.slots.iter().filter(|slot| matches!(slot, Slot::Deleted)).count()
    }

    #[test]
    fn test_backward_shift_closes_three_way_collision() {
        // Keys 3, 11, 19 all hash to slot 3 and occupy slots 3, 4, 5.
        let mut map = pinned_map::<BackwardShift>();
        map.insert(3, 30);
        map.insert(11, 110);
        map.insert(19, 190);
        assert_eq!(map.find(&3), Some(3));
        assert_eq!(map.find(&11), Some(4));
        assert_eq!(map.find(&19), Some(5));

        assert_eq!(map.remove(&3), Some(30));

        // The survivors each shift back one slot and slot 5 opens up.
        assert_eq!(map.find(&11), Some(3));
        assert_eq!(map.find(&19), Some(4));
        assert!(slot_is_empty(&map, 5));
        assert_eq!(map.get(&11), Some(&110));
        assert_eq!(map.get(&19), Some(&190));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_backward_shift_wrapping_run() {
        // Keys 6, 14, 22 all hash to slot 6; the run wraps into slot 0.
        let mut map = pinned_map::<BackwardShift>();
        map.insert(6, 60);
        map.insert(14, 140);
        map.insert(22, 220);
        assert_eq!(map.find(&22), Some(0));

        assert_eq!(map.remove(&6), Some(60));

        assert_eq!(map.find(&14), Some(6));
        assert_eq!(map.find(&22), Some(7));
        assert!(slot_is_empty(&map, 0));
        assert_eq!(map.get(&14), Some(&140));
        assert_eq!(map.get(&22), Some(&220));
    }

    #[test]
    fn test_backward_shift_wrapping_run_with_mixed_homes() {
        // Homes 6, 6, 7, 7 fill slots 6, 7, 0, 1; removal of the head must
        // pull each survivor back without ever stranding a home-7 key before
        // its own home.
        let mut map = pinned_map::<BackwardShift>();
        map.insert(6, 60);
        map.insert(14, 140); // home 6, lands in 7
        map.insert(7, 70); // home 7, lands in 0
        map.insert(23, 230); // home 7, lands in 1

        assert_eq!(map.remove(&6), Some(60));

        assert_eq!(map.find(&14), Some(6));
        assert_eq!(map.find(&7), Some(7));
        assert_eq!(map.find(&23), Some(0));
        assert!(slot_is_empty(&map, 1));
        assert_eq!(map.get(&7), Some(&70));
        assert_eq!(map.get(&23), Some(&230));
    }

    #[test]
    fn test_backward_shift_leaves_home_entry_in_place() {
        // Key 0 sits in its own home slot across the boundary; removing 7
        // must not drag it backward to slot 7.
        let mut map = pinned_map::<BackwardShift>();
        map.insert(7, 70);
        map.insert(0, 0);

        assert_eq!(map.remove(&7), Some(70));

        assert!(slot_is_empty(&map, 7));
        assert_eq!(map.find(&0), Some(0));
    }

    #[test]
    fn test_backward_shift_never_writes_tombstones() {
        let mut map = pinned_map::<BackwardShift>();
        for key in [3, 11, 19, 6, 14] {
            map.insert(key, key);
        }
        for key in [11, 6, 3] {
            assert_eq!(map.remove(&key), Some(key));
            assert_eq!(tombstone_count(&map), 0);
        }
        assert_eq!(map.get(&19), Some(&19));
        assert_eq!(map.get(&14), Some(&14));
    }

    #[test]
    fn test_freed_slot_is_reused_without_extra_probing() {
        let mut map = pinned_map::<BackwardShift>();
        map.insert(3, 30);
        map.insert(11, 110);
        map.insert(19, 190);
        map.remove(&3);

        // Slot 5 opened up; a key whose home is 5 takes it directly.
        map.insert(13, 130);
        assert_eq!(map.find(&13), Some(5));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut map = pinned_map::<BackwardShift>();
        map.insert(3, 30);
        map.insert(11, 110);

        assert_eq!(map.remove(&3), Some(30));
        assert_eq!(map.remove(&3), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&11), Some(&110));
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let mut map = pinned_map::<BackwardShift>();
        map.insert(3, 30);

        assert_eq!(map.remove(&42), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.find(&3), Some(3));
    }

    #[test]
    fn test_tombstone_leaves_marker_and_reuses_it() {
        let mut map = pinned_map::<Tombstone>();
        map.insert(3, 30);
        map.insert(11, 110);
        map.insert(19, 190);

        assert_eq!(map.remove(&11), Some(110));

        // The marker keeps the run walkable and is reclaimed by insertion.
        assert_eq!(tombstone_count(&map), 1);
        assert_eq!(map.get(&19), Some(&190));
        map.insert(27, 270);
        assert_eq!(tombstone_count(&map), 0);
        assert_eq!(map.find(&27), Some(4));
    }

    #[test]
    fn test_policies_agree_on_membership() {
        let operations: Vec<(u64, bool)> =
            vec![(3, true), (11, true), (3, false), (19, true), (11, false), (27, true)];

        let mut shifted = pinned_map::<BackwardShift>();
        let mut marked = pinned_map::<Tombstone>();
        for &(key, insert) in &operations {
            if insert {
                shifted.insert(key, key);
                marked.insert(key, key);
            } else {
                shifted.remove(&key);
                marked.remove(&key);
            }
        }

        for key in [3, 11, 19, 27] {
            assert_eq!(shifted.get(&key), marked.get(&key));
        }
        assert_eq!(shifted.len(), marked.len());
    }

    proptest::proptest! {
        #[test]
        fn prop_matches_std_hashmap_model(
            operations in proptest::collection::vec((0_u8..3, 0_u64..64), 1..200)
        ) {
            let mut map: OpenMap<u64, u64, BackwardShift, IdentityState> =
                OpenMap::with_capacity_and_hasher(16, IdentityState);
            let mut model = std::collections::HashMap::new();

            for (op, key) in operations {
                match op {
                    0 => {
                        proptest::prop_assert_eq!(map.insert(key, key), model.insert(key, key));
                    }
                    1 => {
                        proptest::prop_assert_eq!(map.remove(&key), model.remove(&key));
                        // A removal never leaves a marker behind.
                        proptest::prop_assert_eq!(tombstone_count(&map), 0);
                    }
                    _ => {
                        proptest::prop_assert_eq!(map.get(&key), model.get(&key));
                    }
                }
                proptest::prop_assert_eq!(map.len(), model.len());
            }

            // Every surviving key must still be reachable by probing.
            for (key, value) in &model {
                proptest::prop_assert_eq!(map.get(key), Some(value));
            }
        }

        #[test]
        fn prop_tombstone_policy_matches_model(
            operations in proptest::collection::vec((0_u8..2, 0_u64..32), 1..100)
        ) {
            let mut map: OpenMap<u64, u64, Tombstone, IdentityState> =
                OpenMap::with_capacity_and_hasher(16, IdentityState);
            let mut model = std::collections::HashMap::new();

            for (op, key) in operations {
                if op == 0 {
                    proptest::prop_assert_eq!(map.insert(key, key), model.insert(key, key));
                } else {
                    proptest::prop_assert_eq!(map.remove(&key), model.remove(&key));
                }
            }

            for (key, value) in &model {
                proptest::prop_assert_eq!(map.get(key), Some(value));
            }
        }
    }
}
