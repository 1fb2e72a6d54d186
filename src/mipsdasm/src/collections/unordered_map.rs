/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::{borrow::Borrow, hash::Hash};

#[cfg(not(feature = "std"))]
use alloc::collections::btree_map::{self, BTreeMap};

#[cfg(feature = "std")]
use std::collections::hash_map::{self, HashMap};

/// A map with no iteration-order guarantees.
///
/// Backed by a `HashMap` when `std` is available, by a `BTreeMap` otherwise,
/// so keys must implement both `Ord` and `Hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnorderedMap<K, V>
where
    K: Ord + Hash + Eq,
{
    #[cfg(not(feature = "std"))]
    inner: BTreeMap<K, V>,
    #[cfg(feature = "std")]
    inner: HashMap<K, V>,
}

impl<K, V> UnorderedMap<K, V>
where
    K: Ord + Hash + Eq,
{
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "std"))]
            inner: BTreeMap::new(),
            #[cfg(feature = "std")]
            inner: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord + Hash + Eq,
    {
        self.inner.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord + Hash + Eq,
    {
        self.inner.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord + Hash + Eq,
    {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[cfg(not(feature = "std"))]
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.inner.iter()
    }
    #[cfg(feature = "std")]
    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.inner.iter()
    }

    #[cfg(not(feature = "std"))]
    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, K, V> {
        self.inner.iter_mut()
    }
    #[cfg(feature = "std")]
    pub fn iter_mut(&mut self) -> hash_map::IterMut<'_, K, V> {
        self.inner.iter_mut()
    }

    #[cfg(not(feature = "std"))]
    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.inner.values()
    }
    #[cfg(feature = "std")]
    pub fn values(&self) -> hash_map::Values<'_, K, V> {
        self.inner.values()
    }
}

impl<K, V> UnorderedMap<K, V>
where
    K: Ord + Hash + Eq,
    V: Default,
{
    pub fn entry_or_default(&mut self, key: K) -> &mut V {
        self.inner.entry(key).or_default()
    }
}

impl<K, V> Default for UnorderedMap<K, V>
where
    K: Ord + Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a UnorderedMap<K, V>
where
    K: Ord + Hash + Eq,
{
    type Item = (&'a K, &'a V);
    #[cfg(not(feature = "std"))]
    type IntoIter = btree_map::Iter<'a, K, V>;
    #[cfg(feature = "std")]
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for UnorderedMap<K, V>
where
    K: Ord + Hash + Eq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
