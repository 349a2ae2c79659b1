use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    error::Error,
    fmt,
    hash::{BuildHasher, Hash},
};

use crate::hash::{UniversalHashFn, find_perfect_mask, next_prime};

/// Failure to construct a [`PerfectMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// No bit mask up to the supported width kept all key codes pairwise
    /// distinct. Duplicate keys in the input always surface here, since no
    /// mask can separate two equal codes.
    MaskWidthExhausted,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaskWidthExhausted => {
                write!(f, "no perfect bit mask found for the supplied keys")
            }
        }
    }
}

impl Error for BuildError {}

/// One bucket of the two-level structure: a quadratically sized slot table
/// with its own collision-free hash function.
///
/// The key and value arrays are parallel, and a slot may hold a key with no
/// value yet: construction from bare keys installs the keys alone, which is
/// why a constructed key can be present while `get` still reports nothing.
#[derive(Debug, Clone)]
struct SecondaryMap<K, V> {
    /// Keys at their secondary hash positions; an empty bucket keeps no slots.
    keys: Vec<Option<K>>,
    /// Values parallel to `keys`.
    values: Vec<Option<V>>,
    /// Collision-free hash over this bucket's construction keys.
    hash: UniversalHashFn,
    /// Bucket-local bit mask applied to raw codes before hashing.
    mask: u64,
}

impl<K: Eq, V> SecondaryMap<K, V> {
    /// Builds the bucket table from its members, each a key with an optional
    /// initial value and its raw hash code, redrawing the secondary function
    /// until placement is collision-free.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    fn build(members: Vec<(K, Option<V>, u64)>) -> Result<Self, BuildError> {
        if members.is_empty() {
            return Ok(Self {
                keys: Vec::new(),
                values: Vec::new(),
                hash: UniversalHashFn::trivial(),
                mask: 0,
            });
        }

        let codes: Vec<u64> = members.iter().map(|(_, _, code)| *code).collect();
        let search = find_perfect_mask(&codes).ok_or(BuildError::MaskWidthExhausted)?;
        let p = next_prime(search.greatest);

        // Squaring the table is what gives a fresh draw from the universal
        // family a constant probability of placing the whole bucket without a
        // collision, so this loop terminates quickly in expectation.
        let size = members.len() * members.len();
        let (hash, owners) = loop {
            let candidate = UniversalHashFn::draw(p, size as u64);
            let mut owners: Vec<Option<usize>> = vec![None; size];
            let mut collided = false;
            for (index, code) in codes.iter().enumerate() {
                let position = candidate.eval(code & search.mask);
                match owners.get_mut(position) {
                    Some(owner) if owner.is_none() => *owner = Some(index),
                    _ => {
                        collided = true;
                        break;
                    }
                }
            }
            if !collided {
                break (candidate, owners);
            }
        };

        let mut source: Vec<Option<(K, Option<V>)>> =
            members.into_iter().map(|(key, value, _)| Some((key, value))).collect();
        let mut keys: Vec<Option<K>> = (0..size).map(|_| None).collect();
        let mut values: Vec<Option<V>> = (0..size).map(|_| None).collect();
        for (position, owner) in owners.iter().enumerate() {
            if let Some(index) = owner {
                if let Some((key, value)) = source.get_mut(*index).and_then(Option::take) {
                    if let Some(slot) = keys.get_mut(position) {
                        *slot = Some(key);
                    }
                    if let Some(slot) = values.get_mut(position) {
                        *slot = value;
                    }
                }
            }
        }

        Ok(Self { keys, values, hash, mask: search.mask })
    }

    /// Slot position for a raw key code, or `None` for the inert empty bucket.
    fn position(&self, code: u64) -> Option<usize> {
        if self.keys.is_empty() { None } else { Some(self.hash.eval(code & self.mask)) }
    }

    /// True if the slot for `code` holds exactly `key`.
    ///
    /// The equality check is mandatory: the hash is only collision-free over
    /// the construction set, so a spurious key can land on an occupied slot
    /// belonging to a different key.
    fn contains<Q>(&self, key: &Q, code: u64) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let Some(position) = self.position(code) else { return false };
        matches!(self.keys.get(position), Some(Some(stored)) if stored.borrow() == key)
    }

    /// Value stored for `key`, if the key is present and a value was put.
    fn get<Q>(&self, key: &Q, code: u64) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if !self.contains(key, code) {
            return None;
        }
        self.values.get(self.position(code)?)?.as_ref()
    }

    /// Writes the association directly at the code's slot, returning whether
    /// the slot gained a key and the previous value.
    fn put(&mut self, key: K, value: V, code: u64) -> (bool, Option<V>) {
        let Some(position) = self.position(code) else { return (false, None) };
        let mut newly_occupied = false;
        if let Some(slot) = self.keys.get_mut(position) {
            newly_occupied = slot.is_none();
            *slot = Some(key);
        }
        let previous = match self.values.get_mut(position) {
            Some(slot) => slot.replace(value),
            None => None,
        };
        (newly_occupied, previous)
    }

    /// Clears the slot if it holds exactly `key`. The outer `None` means the
    /// key was not present; the inner option is whatever value had been put.
    fn remove<Q>(&mut self, key: &Q, code: u64) -> Option<Option<V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if !self.contains(key, code) {
            return None;
        }
        let position = self.position(code)?;
        if let Some(slot) = self.keys.get_mut(position) {
            *slot = None;
        }
        Some(self.values.get_mut(position).and_then(Option::take))
    }
}

/// A static perfect-hash map over a key set fixed at construction.
///
/// A primary universal hash function routes every key to one of `m` buckets
/// (`m` = number of construction keys); each bucket resolves its keys with a
/// collision-free secondary hash over a quadratically sized table, making
/// every lookup worst-case O(1) with no probing at all.
///
/// [`get`](Self::get) and [`contains_key`](Self::contains_key) behave as
/// expected for any key. [`put`](Self::put), however, assumes the key was
/// supplied to the constructor; its behavior for novel keys is unspecified
/// and may displace an unrelated slot. The structure never resizes.
#[derive(Debug, Clone)]
pub struct PerfectMap<K, V, S = RandomState> {
    /// One secondary table per primary bucket.
    secondaries: Vec<SecondaryMap<K, V>>,
    /// Primary universal hash into the bucket range.
    primary: UniversalHashFn,
    /// Bit mask applied to raw key codes before the primary hash.
    mask: u64,
    /// Hasher state producing raw 64-bit key codes.
    hash_builder: S,
    /// Number of slots currently holding a key.
    len: usize,
}

impl<K, V> PerfectMap<K, V>
where
    K: Eq + Hash,
{
    /// Builds the map for the given keys with a default hasher state.
    ///
    /// Every key is installed with no value; use [`put`](Self::put) to attach
    /// one, or [`from_entries`](Self::from_entries) to do both at once.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MaskWidthExhausted`] when no supported bit mask
    /// separates the key codes, which includes any input with duplicates.
    pub fn from_keys(keys: Vec<K>) -> Result<Self, BuildError> {
        Self::from_keys_with_hasher(keys, RandomState::new())
    }

    /// Builds the map from key-value pairs with a default hasher state.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MaskWidthExhausted`] when no supported bit mask
    /// separates the key codes, which includes any input with duplicates.
    pub fn from_entries(entries: Vec<(K, V)>) -> Result<Self, BuildError> {
        let members = entries.into_iter().map(|(key, value)| (key, Some(value))).collect();
        Self::build_with_hasher(members, RandomState::new())
    }
}

impl<K, V, S> PerfectMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Builds the map for the given keys using the given hasher state.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MaskWidthExhausted`] when no supported bit mask
    /// separates the key codes, which includes any input with duplicates.
    pub fn from_keys_with_hasher(keys: Vec<K>, hash_builder: S) -> Result<Self, BuildError> {
        let members = keys.into_iter().map(|key| (key, None)).collect();
        Self::build_with_hasher(members, hash_builder)
    }

    /// Shared construction path: draws the primary hash function once and
    /// fresh secondary functions per bucket until every placement is
    /// collision-free. The resulting structure never rehashes.
    #[allow(clippy::cast_possible_truncation)]
    fn build_with_hasher(
        members: Vec<(K, Option<V>)>,
        hash_builder: S,
    ) -> Result<Self, BuildError> {
        let m = members.len();
        if m == 0 {
            return Ok(Self {
                secondaries: Vec::new(),
                primary: UniversalHashFn::trivial(),
                mask: 0,
                hash_builder,
                len: 0,
            });
        }

        let codes: Vec<u64> = members.iter().map(|(key, _)| hash_builder.hash_one(key)).collect();
        let search = find_perfect_mask(&codes).ok_or(BuildError::MaskWidthExhausted)?;
        let p = next_prime(search.greatest);
        let primary = UniversalHashFn::draw(p, m as u64);

        // Partition the members into their primary buckets.
        let mut buckets: Vec<Vec<(K, Option<V>, u64)>> = (0..m).map(|_| Vec::new()).collect();
        for ((key, value), code) in members.into_iter().zip(codes) {
            let bucket = primary.eval(code & search.mask);
            if let Some(bucket_members) = buckets.get_mut(bucket) {
                bucket_members.push((key, value, code));
            }
        }

        let secondaries =
            buckets.into_iter().map(SecondaryMap::build).collect::<Result<Vec<_>, _>>()?;

        Ok(Self { secondaries, primary, mask: search.mask, hash_builder, len: m })
    }

    /// Primary bucket index for a raw key code.
    fn bucket_of(&self, code: u64) -> Option<usize> {
        if self.secondaries.is_empty() {
            None
        } else {
            Some(self.primary.eval(code & self.mask))
        }
    }

    /// Add an association to the map, returning the previous value for the
    /// key.
    ///
    /// The key is assumed to come from the construction set. For any other
    /// key the write lands wherever the hashes point and may silently
    /// displace an unrelated association; this is a documented precondition,
    /// not a checked error.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let code = self.hash_builder.hash_one(&key);
        let bucket = self.bucket_of(code)?;
        let secondary = self.secondaries.get_mut(bucket)?;
        let (newly_occupied, previous) = secondary.put(key, value, code);
        if newly_occupied {
            self.len = self.len.saturating_add(1);
        }
        previous
    }

    /// Get the value for a key, or `None` if the key is absent or no value
    /// was ever put for it. Safe for arbitrary keys.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let code = self.hash_builder.hash_one(key);
        self.secondaries.get(self.bucket_of(code)?)?.get(key, code)
    }

    /// Test if this map contains an association for this key. Safe for
    /// arbitrary keys.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let code = self.hash_builder.hash_one(key);
        let Some(bucket) = self.bucket_of(code) else { return false };
        self.secondaries.get(bucket).is_some_and(|secondary| secondary.contains(key, code))
    }

    /// Remove the association for this key, if it exists; absent keys are a
    /// no-op. Returns the value that had been put for the key.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let code = self.hash_builder.hash_one(key);
        let bucket = self.bucket_of(code)?;
        let removed = self.secondaries.get_mut(bucket)?.remove(key, code)?;
        self.len = self.len.saturating_sub(1);
        removed
    }

    /// Returns the number of keys currently present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a lazy iterator over the keys, in bucket order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { secondaries: &self.secondaries, bucket: 0, slot: 0 }
    }

    /// Iterator over the values that have been put, in bucket order.
    pub(crate) fn stored_values(&self) -> impl Iterator<Item = &V> {
        self.secondaries.iter().flat_map(|secondary| secondary.values.iter().flatten())
    }
}

/// Lazy iterator over the keys of a [`PerfectMap`], in bucket order, skipping
/// empty buckets and vacant slots.
#[derive(Debug, Clone)]
pub struct Keys<'a, K, V> {
    /// The buckets being walked.
    secondaries: &'a [SecondaryMap<K, V>],
    /// Index of the current bucket.
    bucket: usize,
    /// Position within the current bucket's slots.
    slot: usize,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(secondary) = self.secondaries.get(self.bucket) {
            while let Some(slot) = secondary.keys.get(self.slot) {
                self.slot = self.slot.saturating_add(1);
                if let Some(key) = slot {
                    return Some(key);
                }
            }
            self.bucket = self.bucket.saturating_add(1);
            self.slot = 0;
        }
        None
    }
}
