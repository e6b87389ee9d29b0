//! Ordered map
//!
//! Entries are stored as `(key, value)` nodes compared by key only, so a
//! lookup key carries a default value that is never looked at.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::skiplist::{ByKey, Comparator, NaturalOrder, Position, SkipList};

/// Persistent ordered map with fixed-width keys and values
pub struct OrderedMap<K, V, C = NaturalOrder> {
    list: SkipList<(K, V), ByKey<C>>,
}

impl<K, V, C> OrderedMap<K, V, C>
where
    K: Serialize + DeserializeOwned + Default + Clone,
    V: Serialize + DeserializeOwned + Default + Clone,
    C: Comparator<K> + Default,
{
    /// Open or create a map at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            list: SkipList::open(path)?,
        })
    }

    /// Open or create the map `name` under `config.data_dir`
    pub fn open_named(config: &Config, name: &str) -> Result<Self> {
        Ok(Self {
            list: SkipList::open_named(config, name)?,
        })
    }
}

impl<K, V, C> OrderedMap<K, V, C>
where
    K: Serialize + DeserializeOwned + Default + Clone,
    V: Serialize + DeserializeOwned + Default + Clone,
    C: Comparator<K>,
{
    /// Wrap an already open list
    pub fn from_list(list: SkipList<(K, V), ByKey<C>>) -> Self {
        Self { list }
    }

    /// Stored value for `key`, or `V::default()` when absent
    pub fn at(&mut self, key: &K) -> Result<V> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Stored value for `key`
    pub fn get(&mut self, key: &K) -> Result<Option<V>> {
        let pos = self.list.find(&Self::lookup_key(key))?;
        if pos.is_end() {
            return Ok(None);
        }
        Ok(Some(self.list.get(pos)?.1))
    }

    /// Store `value` under `key`, replacing any previous entry
    ///
    /// Implemented as erase followed by insert: the entry gets a fresh node.
    pub fn set(&mut self, key: K, value: V) -> Result<V> {
        self.list.erase(&Self::lookup_key(&key))?;
        self.list.insert((key, value.clone()))?;
        Ok(value)
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        let lookup = Self::lookup_key(key);
        let pos = self.list.find(&lookup)?;
        if pos.is_end() {
            return Ok(None);
        }
        let (_, value) = self.list.get(pos)?;
        self.list.erase(&lookup)?;
        Ok(Some(value))
    }

    pub fn contains_key(&mut self, key: &K) -> Result<bool> {
        self.list.contains(&Self::lookup_key(key))
    }

    /// 0 or 1: keys are unique
    pub fn count(&mut self, key: &K) -> Result<u64> {
        Ok(u64::from(self.contains_key(key)?))
    }

    /// `(lower_bound(key), upper_bound(key))` by key
    pub fn equal_range(&mut self, key: &K) -> Result<(Position, Position)> {
        let lookup = Self::lookup_key(key);
        Ok((self.list.lower_bound(&lookup)?, self.list.upper_bound(&lookup)?))
    }

    /// Number of keys strictly less than `key`
    pub fn rank_of_key(&mut self, key: &K) -> Result<u64> {
        self.list.order_of_key(&Self::lookup_key(key))
    }

    /// Unwrap the underlying list
    pub fn into_list(self) -> SkipList<(K, V), ByKey<C>> {
        self.list
    }

    /// Flush headers, sync, and release the file
    pub fn close(self) -> Result<()> {
        self.list.close()
    }

    fn lookup_key(key: &K) -> (K, V) {
        (key.clone(), V::default())
    }
}

impl<K, V, C> Deref for OrderedMap<K, V, C> {
    type Target = SkipList<(K, V), ByKey<C>>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl<K, V, C> DerefMut for OrderedMap<K, V, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.list
    }
}
