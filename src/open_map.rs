use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
    mem,
};

use crate::policy::{BackwardShift, DeletionPolicy};

/// A single position in the slot table.
#[derive(Debug, Clone)]
pub(crate) enum Slot<K, V> {
    /// Never held an entry, or vacated by a tombstone-free removal.
    Empty,
    /// A live association.
    Occupied {
        /// The key of the association.
        key: K,
        /// The value associated with the key.
        value: V,
    },
    /// Marker left behind by [`Tombstone`](crate::Tombstone) removal; probing
    /// continues past it, insertion may reuse it.
    Deleted,
}

/// The probe sequence for a home position: at most `capacity` slot indices
/// starting at `home`, advancing with stride 1 and wrapping at the table end.
///
/// `capacity` must be a power of two.
pub(crate) fn probe_sequence(home: usize, capacity: usize) -> impl Iterator<Item = usize> {
    let mask = capacity.saturating_sub(1);
    (0..capacity).map(move |offset| (home.saturating_add(offset)) & mask)
}

/// A hash map using open addressing with linear probing.
///
/// The deletion strategy is pluggable through the `D` type parameter. The
/// default [`BackwardShift`] closes the gap a removal leaves by relocating
/// colliding entries backward, so the table never contains deletion markers;
/// [`Tombstone`](crate::Tombstone) keeps the classic marker-based behavior.
///
/// Note: this implementation is not thread-safe; callers needing shared
/// access must provide their own locking.
#[derive(Debug, Clone)]
pub struct OpenMap<K, V, D = BackwardShift, S = RandomState> {
    /// The slot table; its length is always a power of two.
    pub(crate) slots: Vec<Slot<K, V>>,
    /// Current number of live associations.
    pub(crate) len: usize,
    /// Threshold for load factor before resizing - stored as percentage (0-100)
    load_factor_threshold: usize,
    /// Hasher state mapping keys to raw 64-bit codes.
    hash_builder: S,
    /// The deletion strategy in use.
    _policy: PhantomData<D>,
}

impl<K, V, D, S> Default for OpenMap<K, V, D, S>
where
    K: Eq + Hash,
    D: DeletionPolicy,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher(64, S::default())
    }
}

impl<K, V, D, S> Extend<(K, V)> for OpenMap<K, V, D, S>
where
    K: Eq + Hash,
    D: DeletionPolicy,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> OpenMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new `OpenMap` with the default initial capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Creates a new `OpenMap` with the specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, D, S> OpenMap<K, V, D, S>
where
    K: Eq + Hash,
    D: DeletionPolicy,
    S: BuildHasher,
{
    /// Creates a new `OpenMap` using the given hasher state.
    #[must_use]
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(64, hash_builder)
    }

    /// Creates a new `OpenMap` with the specified initial capacity and hasher
    /// state.
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        // Capacity is kept at a power of 2 so probing can wrap by masking.
        let capacity = capacity.max(1).next_power_of_two();

        Self {
            slots: (0..capacity).map(|_| Slot::Empty).collect(),
            len: 0,
            load_factor_threshold: 75,
            hash_builder,
            _policy: PhantomData,
        }
    }

    /// Ideal hash position for a key: its raw code reduced by the table mask.
    pub(crate) fn home_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        #[allow(clippy::cast_possible_truncation)]
        let wide = hash as usize;
        wide & (self.slots.len().saturating_sub(1))
    }

    /// Slot index currently holding `key`, if present.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        for index in probe_sequence(self.home_index(key), self.slots.len()) {
            match self.slots.get(index) {
                // An empty slot ends the collision run; the key is absent.
                None | Some(Slot::Empty) => return None,
                Some(Slot::Occupied { key: stored, .. }) if stored.borrow() == key => {
                    return Some(index);
                }
                Some(Slot::Occupied { .. } | Slot::Deleted) => {}
            }
        }
        None
    }

    /// Insert a key-value pair into the hash table, returning the previous
    /// value associated with the key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        // Check if we need to resize
        if self.len.saturating_mul(100)
            >= self.load_factor_threshold.saturating_mul(self.slots.len())
        {
            self.resize();
        }

        let mut first_deleted = None;
        let mut target = None;
        for index in probe_sequence(self.home_index(&key), self.slots.len()) {
            match self.slots.get(index) {
                None | Some(Slot::Empty) => {
                    // Prefer an earlier tombstone over the empty slot that
                    // ended the run.
                    target = Some(first_deleted.unwrap_or(index));
                    break;
                }
                Some(Slot::Deleted) => {
                    if first_deleted.is_none() {
                        first_deleted = Some(index);
                    }
                }
                Some(Slot::Occupied { key: stored, .. }) => {
                    if *stored == key {
                        target = Some(index);
                        break;
                    }
                }
            }
        }

        let target = target.or(first_deleted)?;
        match self.slots.get_mut(target) {
            Some(Slot::Occupied { value: held, .. }) => Some(mem::replace(held, value)),
            Some(slot @ (Slot::Empty | Slot::Deleted)) => {
                *slot = Slot::Occupied { key, value };
                self.len = self.len.saturating_add(1);
                None
            }
            None => None,
        }
    }

    /// Retrieve a value for a given key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.slots.get(self.find(key)?) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            Some(Slot::Empty | Slot::Deleted) | None => None,
        }
    }

    /// Get a mutable reference to the value for a given key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        match self.slots.get_mut(index) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            Some(Slot::Empty | Slot::Deleted) | None => None,
        }
    }

    /// Removes a key-value pair from the hash table.
    ///
    /// How the vacated slot is treated is decided by the deletion policy `D`;
    /// removing an absent key is a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        D::remove(self, key)
    }

    /// Returns the number of elements in the hash table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the hash table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resizes the hash table when it gets too full.
    fn resize(&mut self) {
        let new_capacity = self.slots.len().saturating_mul(2);
        let old = mem::replace(&mut self.slots, (0..new_capacity).map(|_| Slot::Empty).collect());
        self.len = 0;

        // Reinsert live entries; tombstones are dropped on the way.
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                self.insert(key, value);
            }
        }
    }

    /// Provide a way to configure the load factor threshold.
    pub fn set_load_factor_threshold(&mut self, threshold: usize) {
        self.load_factor_threshold = threshold.clamp(1, 95); // Keep within reasonable range
    }

    /// Returns an iterator over the key-value pairs.
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: &self.slots, index: 0 }
    }

    /// Clears the hash map, removing all key-value pairs.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
    }

    /// Returns the number of slots in the hash map.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current load factor of the hash map.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.slots.len() as f64
    }
}

/// Iterator over the live key-value pairs of the hash table.
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// The slot table being walked.
    slots: &'a [Slot<K, V>],
    /// Current position in the walk.
    index: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.get(self.index) {
            self.index = self.index.saturating_add(1);
            if let Slot::Occupied { key, value } = slot {
                return Some((key, value));
            }
        }
        None
    }
}
