//! Iterators over a skip list
//!
//! Iterators hold the list mutably because every step reads a node from the
//! backing file. Items are `Result<K>`; after an error the iterator is fused.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::heap::NIL;

use super::{Comparator, Position, SkipList};

/// Double-ended iterator over every key
///
/// Forward steps follow level-0 links, backward steps follow backward links.
/// The two ends never cross: the iterator stops after `len()` items in total.
pub struct Iter<'a, K, C> {
    list: &'a mut SkipList<K, C>,
    /// Next node to yield from the front; `None` until the head is read
    front: Option<u64>,
    /// Next node to yield from the back
    back: u64,
    /// Items left between the two ends
    remaining: u64,
}

impl<'a, K, C> Iter<'a, K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K>,
{
    pub(crate) fn new(list: &'a mut SkipList<K, C>, tail: u64, len: u64) -> Self {
        Self {
            list,
            front: None,
            back: tail,
            remaining: len,
        }
    }

    fn front_offset(&mut self) -> Result<u64> {
        match self.front {
            Some(offset) => Ok(offset),
            None => self.list.begin().map(|pos| pos.0),
        }
    }
}

impl<K, C> Iterator for Iter<'_, K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K>,
{
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let step = self
            .front_offset()
            .and_then(|offset| self.list.node(offset));
        match step {
            Ok(node) => {
                self.front = Some(node.next());
                self.remaining -= 1;
                Some(Ok(node.key))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl<K, C> DoubleEndedIterator for Iter<'_, K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.list.node(self.back) {
            Ok(node) => {
                self.back = node.backward;
                self.remaining -= 1;
                Some(Ok(node.key))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Forward iterator over the half-open position range `[from, to)`
///
/// Stops at `to` or at the end of the list, whichever comes first. A range
/// starting at `rend()` starts at the first element.
pub struct Range<'a, K, C> {
    list: &'a mut SkipList<K, C>,
    cursor: u64,
    stop: u64,
}

impl<'a, K, C> Range<'a, K, C> {
    pub(crate) fn new(list: &'a mut SkipList<K, C>, from: Position, to: Position) -> Self {
        Self {
            list,
            cursor: from.0,
            stop: to.0,
        }
    }
}

impl<K, C> Iterator for Range<'_, K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K>,
{
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL || self.cursor == self.stop {
            return None;
        }
        if self.cursor == self.list.root().head {
            match self.list.begin() {
                Ok(first) => self.cursor = first.0,
                Err(e) => {
                    self.cursor = NIL;
                    return Some(Err(e));
                }
            }
            return self.next();
        }

        match self.list.node(self.cursor) {
            Ok(node) => {
                self.cursor = node.next();
                Some(Ok(node.key))
            }
            Err(e) => {
                self.cursor = NIL;
                Some(Err(e))
            }
        }
    }
}
