/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::{self, BTreeMap};
use core::ops::{Add, RangeBounds};

use crate::addresses::{Size, SizedAddress};

pub type Range<'a, K, V> = btree_map::Range<'a, K, V>;

/// An ordered map whose lookups may also land *inside* the previous element,
/// as long as that element's size window covers the requested key.
///
/// This is how a reference like `sym + 0x10` resolves to `sym`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddendedOrderedMap<K, V>
where
    K: Ord,
    V: SizedAddress,
{
    inner: BTreeMap<K, V>,
}

impl<K, V> AddendedOrderedMap<K, V>
where
    K: Ord,
    V: SizedAddress,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V> AddendedOrderedMap<K, V>
where
    K: Ord + Copy + Add<Size, Output = K>,
    V: SizedAddress,
{
    // The key of the entry an addended find for `key` would land on, if any.
    fn resolve_key(&self, key: &K, settings: FindSettings) -> Option<K> {
        if !settings.allow_addend {
            self.inner.contains_key(key).then_some(*key)
        } else {
            let (other_key, v) = self.inner.range(..=*key).next_back()?;

            if other_key == key {
                Some(*other_key)
            } else if let Some(siz) = v.size() {
                (*key < *other_key + siz).then_some(*other_key)
            } else if !settings.reject_sizeless_addended {
                Some(*other_key)
            } else {
                None
            }
        }
    }

    #[must_use]
    pub fn find(&self, key: &K, settings: FindSettings) -> Option<&V> {
        let k = self.resolve_key(key, settings)?;
        self.inner.get(&k)
    }

    #[must_use]
    pub fn find_mut(&mut self, key: &K, settings: FindSettings) -> Option<&mut V> {
        let k = self.resolve_key(key, settings)?;
        self.inner.get_mut(&k)
    }

    /// Returns the matched entry, or inserts the `(key, value)` produced by
    /// `default` and returns that. The `bool` tells if an insertion happened.
    pub fn find_mut_or_insert_with<F>(
        &mut self,
        key: K,
        settings: FindSettings,
        default: F,
    ) -> (&mut V, bool)
    where
        F: FnOnce() -> (K, V),
    {
        match self.resolve_key(&key, settings) {
            Some(k) => (
                self.inner
                    .get_mut(&k)
                    .expect("resolve_key only yields present keys"),
                false,
            ),
            None => {
                let (k, v) = default();
                (self.inner.entry(k).or_insert(v), true)
            }
        }
    }
}

impl<K, V> AddendedOrderedMap<K, V>
where
    K: Ord,
    V: SizedAddress,
{
    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, K, V> {
        self.inner.iter_mut()
    }

    pub fn range<R>(&self, range: R) -> Range<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        self.inner.range(range)
    }

    pub fn keys(&self) -> btree_map::Keys<'_, K, V> {
        self.inner.keys()
    }

    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> btree_map::ValuesMut<'_, K, V> {
        self.inner.values_mut()
    }
}

impl<K, V> Default for AddendedOrderedMap<K, V>
where
    K: Ord,
    V: SizedAddress,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a AddendedOrderedMap<K, V>
where
    K: Ord,
    V: SizedAddress,
{
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for AddendedOrderedMap<K, V>
where
    K: Ord,
    V: SizedAddress,
{
    type Item = (K, V);
    type IntoIter = btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FindSettings {
    allow_addend: bool,
    reject_sizeless_addended: bool,
}

impl FindSettings {
    #[must_use]
    pub const fn new(allow_addend: bool) -> Self {
        Self {
            allow_addend,
            reject_sizeless_addended: true,
        }
    }

    #[must_use]
    pub const fn with_allow_addend(self, allow_addend: bool) -> Self {
        Self {
            allow_addend,
            ..self
        }
    }

    #[must_use]
    pub const fn with_reject_sizeless_addended(self, reject_sizeless_addended: bool) -> Self {
        Self {
            reject_sizeless_addended,
            ..self
        }
    }

    #[must_use]
    pub const fn allow_addend(&self) -> bool {
        self.allow_addend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::Vram;

    struct Dummy {
        size: Option<Size>,
    }
    impl SizedAddress for Dummy {
        fn size(&self) -> Option<Size> {
            self.size
        }
    }

    fn sized(x: u32) -> Dummy {
        Dummy {
            size: Some(Size::new(x)),
        }
    }

    #[test]
    fn addended_find_respects_size_window() {
        let mut map = AddendedOrderedMap::new();
        let (_, added) = map.find_mut_or_insert_with(
            Vram::new(0x1000),
            FindSettings::new(false),
            || (Vram::new(0x1000), sized(0xC)),
        );
        assert!(added);

        assert!(map
            .find(&Vram::new(0x1004), FindSettings::new(true))
            .is_some());
        assert!(map
            .find(&Vram::new(0x100B), FindSettings::new(true))
            .is_some());
        assert!(map
            .find(&Vram::new(0x100C), FindSettings::new(true))
            .is_none());
        assert!(map
            .find(&Vram::new(0x1004), FindSettings::new(false))
            .is_none());
        assert!(map
            .find(&Vram::new(0x0FFC), FindSettings::new(true))
            .is_none());
    }

    #[test]
    fn sizeless_entries_follow_the_reject_toggle() {
        let mut map = AddendedOrderedMap::new();
        map.find_mut_or_insert_with(Vram::new(0x2000), FindSettings::new(false), || {
            (Vram::new(0x2000), Dummy { size: None })
        });

        assert!(map
            .find(&Vram::new(0x2100), FindSettings::new(true))
            .is_none());
        assert!(map
            .find(
                &Vram::new(0x2100),
                FindSettings::new(true).with_reject_sizeless_addended(false)
            )
            .is_some());
    }

    #[test]
    fn find_or_insert_reuses_covering_entry() {
        let mut map = AddendedOrderedMap::new();
        map.find_mut_or_insert_with(Vram::new(0x3000), FindSettings::new(false), || {
            (Vram::new(0x3000), sized(0x10))
        });

        let (_, added) = map.find_mut_or_insert_with(
            Vram::new(0x3008),
            FindSettings::new(true),
            || (Vram::new(0x3008), sized(0x8)),
        );
        assert!(!added);
        assert_eq!(map.len(), 1);
    }
}
