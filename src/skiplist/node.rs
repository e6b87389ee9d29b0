//! On-disk node and root records

use serde::{Deserialize, Serialize};

use super::MAX_LEVEL;

/// One level of a tower
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Level {
    /// Offset of the next node at this level, or 0
    pub(crate) forward: u64,
    /// Level-0 hops covered by `forward` (nodes remaining when null)
    pub(crate) span: u64,
}

/// Skip list node as stored in the heap
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    /// Levels in use; entries at `height..` are allocated but ignored
    pub(crate) height: u64,
    /// Offset of the level-0 predecessor (the head for the first node)
    pub(crate) backward: u64,
    pub(crate) levels: [Level; MAX_LEVEL],
}

impl<K: Default> Node<K> {
    /// Head sentinel: full height, all links null, key never read
    pub(crate) fn sentinel() -> Self {
        Self {
            key: K::default(),
            height: MAX_LEVEL as u64,
            backward: 0,
            levels: [Level::default(); MAX_LEVEL],
        }
    }
}

impl<K> Node<K> {
    pub(crate) fn new(key: K, height: usize, backward: u64) -> Self {
        Self {
            key,
            height: height as u64,
            backward,
            levels: [Level::default(); MAX_LEVEL],
        }
    }

    /// Level-0 successor
    pub(crate) fn next(&self) -> u64 {
        self.levels[0].forward
    }
}

/// Skip list root metadata, persisted at offset 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootMeta {
    /// Offset of the head sentinel
    pub head: u64,
    /// Offset of the last node, or `head` when empty
    pub tail: u64,
    /// Number of levels currently in use (at least 1)
    pub max_level: u64,
    /// Number of stored keys
    pub len: u64,
}

impl RootMeta {
    pub(crate) fn empty(head: u64) -> Self {
        Self {
            head,
            tail: head,
            max_level: 1,
            len: 0,
        }
    }
}
