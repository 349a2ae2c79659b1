//! Utility functions and traits for the map implementations.

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
};

use crate::{OpenMap, PerfectMap, policy::DeletionPolicy};

/// Extension trait for map implementations that provides additional utility
/// methods.
pub trait MapExtensions<K, V> {
    /// Returns the keys of the map as a Vec
    fn keys(&self) -> Vec<K>;

    /// Returns the values of the map as a Vec
    fn values(&self) -> Vec<V>;

    /// Returns true if the map contains the given key
    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;
}

impl<K, V, D, S> MapExtensions<K, V> for OpenMap<K, V, D, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    D: DeletionPolicy,
    S: BuildHasher,
{
    fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> Vec<V> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K, V, S> MapExtensions<K, V> for PerfectMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn keys(&self) -> Vec<K> {
        self.keys().cloned().collect()
    }

    fn values(&self) -> Vec<V> {
        self.stored_values().cloned().collect()
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.contains_key(key)
    }
}

/// Creates an `OpenMap` from an iterator of key-value pairs
#[allow(dead_code)]
pub fn from_iter<K, V, I>(iter: I) -> OpenMap<K, V>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let mut map = OpenMap::new();

    for (key, value) in iter {
        map.insert(key, value);
    }

    map
}
