//! tagmap is the map of key, value pairs that sits inside each `Sample`, once
//! for tags and once for fields. Think of it as a specialized map. Keys are
//! kept sorted so iteration is always in key order, which is what makes line
//! protocol output and series keys stable from run to run.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Borrow;
use std::cmp;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::slice::Iter;

/// The tagmap key, value collection. Behaves similarly to
/// `std::collections::BTreeMap` but with a specialized implementation for
/// fast searching over a small collection.
///
/// On the wire a tagmap is a plain map, keys in order.
#[derive(Clone, Debug)]
pub struct TagMap<K, V> {
    inner: Vec<(K, V)>,
}

impl<K, V> Serialize for TagMap<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for &(ref k, ref v) in &self.inner {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct TagMapVisitor<K, V> {
    marker: PhantomData<fn() -> TagMap<K, V>>,
}

impl<'de, K, V> Visitor<'de> for TagMapVisitor<K, V>
where
    K: Deserialize<'de> + cmp::Ord,
    V: Deserialize<'de>,
{
    type Value = TagMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = TagMap::default();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for TagMap<K, V>
where
    K: Deserialize<'de> + cmp::Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TagMapVisitor {
            marker: PhantomData,
        })
    }
}

impl<K, V> Hash for TagMap<K, V>
where
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &(ref k, ref v) in &self.inner {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K, V> PartialEq for TagMap<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &TagMap<K, V>) -> bool {
        self.inner == other.inner
    }
}

impl<K, V> Eq for TagMap<K, V>
where
    K: Eq,
    V: Eq,
{
}

impl<'a, K, V> IntoIterator for &'a TagMap<K, V> {
    type Item = &'a (K, V);
    type IntoIter = Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for TagMap<K, V>
where
    K: cmp::Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TagMap::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V> TagMap<K, V>
where
    K: cmp::Ord,
{
    /// Create a `tagmap::Iter`.
    pub fn iter(&self) -> Iter<(K, V)> {
        self.inner.iter()
    }

    /// Iterate over the keys of the tagmap, in order.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K> + 'a {
        self.inner.iter().map(|&(ref k, _)| k)
    }

    /// Get a value from the tagmap, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: cmp::Ord + ?Sized,
    {
        match self.search(key) {
            Ok(idx) => Some(&self.inner[idx].1),
            Err(_) => None,
        }
    }

    /// Get a mutable reference to a value in the tagmap, if it exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: cmp::Ord + ?Sized,
    {
        match self.search(key) {
            Ok(idx) => Some(&mut self.inner[idx].1),
            Err(_) => None,
        }
    }

    /// Determine if the tagmap is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Insert a key / value into self
    ///
    /// This method will return the value previously stored under the given
    /// key, if there was such a value.
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        match self.inner.binary_search_by(|probe| probe.0.cmp(&key)) {
            Ok(idx) => Some(::std::mem::replace(&mut self.inner[idx].1, val)),
            Err(idx) => {
                self.inner.insert(idx, (key, val));
                None
            }
        }
    }

    /// Return the length of the tagmap. This is the total number of key /
    /// values stored in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn search<Q>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: cmp::Ord + ?Sized,
    {
        self.inner.binary_search_by(|probe| probe.0.borrow().cmp(key))
    }
}

impl<K, V> Default for TagMap<K, V> {
    fn default() -> TagMap<K, V> {
        TagMap {
            inner: Vec::with_capacity(8),
        }
    }
}

/// Compare two tagmaps
///
/// This function is used to define a total ordering over `TagMap` when the
/// values themselves are ordered. Maps are compared by length first and then
/// key / value pair by key / value pair.
pub fn cmp<K, V>(left: &TagMap<K, V>, right: &TagMap<K, V>) -> cmp::Ordering
where
    K: cmp::Ord,
    V: cmp::Ord,
{
    left.len()
        .cmp(&right.len())
        .then_with(|| left.inner.cmp(&right.inner))
}
