//! Ordered set

use std::ops::{Deref, DerefMut};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::skiplist::{Comparator, NaturalOrder, Position, SkipList};

/// Persistent ordered set of fixed-width keys
pub struct OrderedSet<K, C = NaturalOrder> {
    list: SkipList<K, C>,
}

impl<K, C> OrderedSet<K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K> + Default,
{
    /// Open or create a set at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            list: SkipList::open(path)?,
        })
    }

    /// Open or create the set `name` under `config.data_dir`
    pub fn open_named(config: &Config, name: &str) -> Result<Self> {
        Ok(Self {
            list: SkipList::open_named(config, name)?,
        })
    }
}

impl<K, C> OrderedSet<K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K>,
{
    /// Wrap an already open list
    pub fn from_list(list: SkipList<K, C>) -> Self {
        Self { list }
    }

    /// 0 or 1: keys are unique
    pub fn count(&mut self, key: &K) -> Result<u64> {
        Ok(if self.list.find(key)?.is_end() { 0 } else { 1 })
    }

    /// `(lower_bound(key), upper_bound(key))`
    pub fn equal_range(&mut self, key: &K) -> Result<(Position, Position)> {
        Ok((self.list.lower_bound(key)?, self.list.upper_bound(key)?))
    }

    /// Unwrap the underlying list
    pub fn into_list(self) -> SkipList<K, C> {
        self.list
    }

    /// Flush headers, sync, and release the file
    pub fn close(self) -> Result<()> {
        self.list.close()
    }
}

impl<K, C> Deref for OrderedSet<K, C> {
    type Target = SkipList<K, C>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl<K, C> DerefMut for OrderedSet<K, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.list
    }
}
