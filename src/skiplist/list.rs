//! Offset skip list implementation
//!
//! All structural operations share one search phase that produces, per
//! level, the rightmost node ordered before the target (the frontier) and
//! its rank. Mutations then rewrite the frontier nodes one level at a time,
//! re-reading each node from the heap before changing it.

use std::collections::HashMap;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec;
use crate::config::{Config, FlushPolicy};
use crate::error::{Result, SpanListError};
use crate::heap::{size_class, HeapFile, HEAP_START, MAX_UNIT_SIZE, NIL, TAG_SIZE};

use super::iter::{Iter, Range};
use super::node::{Node, RootMeta};
use super::{
    Comparator, NaturalOrder, Position, LEVEL_PROBABILITY, MAX_LEVEL, ROOT_OFFSET, ROOT_SIZE,
};

/// Where the search phase stops at each level
#[derive(Debug, Clone, Copy)]
enum Descent {
    /// Pass neighbours strictly less than the target
    Below,
    /// Pass neighbours less than or equal to the target
    AtMost,
}

impl Descent {
    fn passes<K, C: Comparator<K>>(self, cmp: &C, neighbour: &K, target: &K) -> bool {
        match self {
            Descent::Below => cmp.less(neighbour, target),
            Descent::AtMost => !cmp.less(target, neighbour),
        }
    }
}

/// Result of the search phase
struct Frontier<K> {
    /// Per level, offset of the last node not passed
    update: [u64; MAX_LEVEL],
    /// Per level, rank of `update[level]` (head = 0)
    rank: [u64; MAX_LEVEL],
    /// The level-0 frontier node itself
    node: Node<K>,
}

/// Persistent skip list with order statistics
///
/// Keys must encode to a fixed width: every node is allocated at the size
/// computed from `K::default()`, and keys encoding to any other width are
/// rejected with [`SpanListError::RecordSize`].
///
/// Single-threaded. Reads move the file cursor, so every operation that
/// touches the heap takes `&mut self`. Two handles on the same file at the
/// same time produce undefined results.
pub struct SkipList<K, C = NaturalOrder> {
    /// Allocator owning the backing file
    heap: HeapFile,
    /// Cached root metadata
    root: RootMeta,
    /// Key order
    cmp: C,
    /// Tower height source
    rng: StdRng,
    /// Encoded width of every key
    key_size: usize,
    /// Encoded width of every node
    node_size: usize,
    /// When headers are written back
    flush_policy: FlushPolicy,
    /// Set once root metadata has been written back at end of life
    closed: bool,
    _key: PhantomData<K>,
}

impl<K, C> SkipList<K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K> + Default,
{
    /// Open or create a list at `path` with default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_at(path.as_ref(), &Config::default(), C::default())
    }

    /// Open or create the collection `name` under `config.data_dir`
    ///
    /// The backing file is `{data_dir}/{name}.{file_extension}`.
    pub fn open_named(config: &Config, name: &str) -> Result<Self> {
        Self::open_named_with(config, name, C::default())
    }
}

impl<K, C> SkipList<K, C>
where
    K: Serialize + DeserializeOwned + Default,
    C: Comparator<K>,
{
    /// Open or create a named collection with an explicit comparator
    pub fn open_named_with(config: &Config, name: &str, cmp: C) -> Result<Self> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(SpanListError::Config(format!(
                "Invalid collection name: {:?}",
                name
            )));
        }
        fs::create_dir_all(&config.data_dir)?;
        Self::open_at(&config.collection_path(name), config, cmp)
    }

    /// Open or create a list at `path`
    ///
    /// On a new file the head sentinel is allocated and the root metadata
    /// written immediately; on an existing file the root metadata is read
    /// back and sanity-checked. A new file that cannot be initialised is
    /// removed again.
    pub fn open_at(path: &Path, config: &Config, cmp: C) -> Result<Self> {
        let sentinel = Node::<K>::sentinel();
        let key_size = codec::encoded_size(&sentinel.key)?;
        let node_size = codec::encoded_size(&sentinel)?;
        if size_class(node_size).is_none() {
            return Err(SpanListError::SizeClass {
                requested: node_size,
                max: MAX_UNIT_SIZE,
            });
        }

        let mut heap = HeapFile::open(path)?;
        let root = if heap.created() {
            match Self::init_root(&mut heap, node_size) {
                Ok(root) => root,
                Err(e) => {
                    drop(heap);
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %remove_err, "Failed to remove half-created file");
                    }
                    return Err(e);
                }
            }
        } else {
            let root: RootMeta = heap.read(ROOT_OFFSET, ROOT_SIZE)?;
            check_root(&root, heap.file_len()?)?;
            root
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        debug!(
            path = %path.display(),
            len = root.len,
            max_level = root.max_level,
            node_size,
            "Opened skip list"
        );

        Ok(Self {
            heap,
            root,
            cmp,
            rng,
            key_size,
            node_size,
            flush_policy: config.flush_policy,
            closed: false,
            _key: PhantomData,
        })
    }

    /// Allocate a fresh head sentinel and persist empty root metadata
    fn init_root(heap: &mut HeapFile, node_size: usize) -> Result<RootMeta> {
        let head = heap.allocate(node_size)?;
        heap.write(head, &Node::<K>::sentinel())?;

        let root = RootMeta::empty(head);
        heap.write(ROOT_OFFSET, &root)?;
        Ok(root)
    }

    // =========================================================================
    // Size
    // =========================================================================

    /// Number of stored keys
    pub fn len(&self) -> u64 {
        self.root.len
    }

    /// Alias of [`SkipList::len`]
    pub fn size(&self) -> u64 {
        self.root.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.len == 0
    }

    /// Remove every key and truncate the backing file
    pub fn clear(&mut self) -> Result<()> {
        self.heap.reset()?;
        self.root = Self::init_root(&mut self.heap, self.node_size)?;
        debug!(path = %self.heap.path().display(), "Cleared skip list");
        self.after_write()
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// First element, or end when empty
    pub fn begin(&mut self) -> Result<Position> {
        let head = self.node(self.root.head)?;
        Ok(Position(head.next()))
    }

    /// One past the last element
    pub fn end(&self) -> Position {
        Position::END
    }

    /// Last element, or `rend()` when empty
    pub fn rbegin(&self) -> Position {
        Position(self.root.tail)
    }

    /// One before the first element (the head sentinel)
    pub fn rend(&self) -> Position {
        Position(self.root.head)
    }

    /// Key stored at `pos`
    pub fn get(&mut self, pos: Position) -> Result<K> {
        self.check_element(pos)?;
        Ok(self.node(pos.0)?.key)
    }

    /// Position after `pos`; the successor of `rend()` is `begin()`
    pub fn next(&mut self, pos: Position) -> Result<Position> {
        if pos.is_end() {
            return Err(SpanListError::InvalidPosition("cannot advance past end"));
        }
        Ok(Position(self.node(pos.0)?.next()))
    }

    /// Position before `pos`; the predecessor of `end()` is `rbegin()`
    pub fn prev(&mut self, pos: Position) -> Result<Position> {
        if pos.is_end() {
            return Ok(self.rbegin());
        }
        if pos.0 == self.root.head {
            return Err(SpanListError::InvalidPosition("cannot step back past rend"));
        }
        Ok(Position(self.node(pos.0)?.backward))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// First element not less than `key`, or end
    pub fn lower_bound(&mut self, key: &K) -> Result<Position> {
        let frontier = self.search(key, Descent::Below)?;
        Ok(Position(frontier.node.next()))
    }

    /// First element greater than `key`, or end
    pub fn upper_bound(&mut self, key: &K) -> Result<Position> {
        let frontier = self.search(key, Descent::AtMost)?;
        Ok(Position(frontier.node.next()))
    }

    /// Element equal to `key`, or end
    pub fn find(&mut self, key: &K) -> Result<Position> {
        let frontier = self.search(key, Descent::Below)?;
        let candidate = frontier.node.next();
        if candidate == NIL {
            return Ok(Position::END);
        }

        let node = self.node(candidate)?;
        if self.cmp.less(key, &node.key) {
            return Ok(Position::END);
        }
        Ok(Position(candidate))
    }

    /// Whether an element equal to `key` is stored
    pub fn contains(&mut self, key: &K) -> Result<bool> {
        Ok(!self.find(key)?.is_end())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert `key`
    ///
    /// Returns the element's position and whether it was inserted. An equal
    /// key already present is left untouched and reported with `false`.
    pub fn insert(&mut self, key: K) -> Result<(Position, bool)> {
        self.check_key_width(&key)?;

        let mut frontier = self.search(&key, Descent::Below)?;
        let successor = frontier.node.next();
        if successor != NIL {
            let existing = self.node(successor)?;
            if !self.cmp.less(&key, &existing.key) {
                return Ok((Position(successor), false));
            }
        }

        // Allocate before touching any link so an allocator failure leaves
        // the structure as it was
        let offset = self.heap.allocate(self.node_size)?;
        let height = self.random_height();
        let old_top = self.root.max_level as usize;
        let top = old_top.max(height);

        // Predecessors are edited in memory and written after the new node
        let mut staged = Vec::with_capacity(top);
        for level in old_top..height {
            frontier.rank[level] = 0;
            frontier.update[level] = self.root.head;
            let head = self.stage(&mut staged, self.root.head)?;
            head.levels[level].span = self.root.len;
        }

        let mut node = Node::new(key, height, frontier.update[0]);
        for level in 0..height {
            let skipped = frontier.rank[0] - frontier.rank[level];
            let prev = self.stage(&mut staged, frontier.update[level])?;

            node.levels[level].forward = prev.levels[level].forward;
            node.levels[level].span = prev.levels[level].span - skipped;
            prev.levels[level].forward = offset;
            prev.levels[level].span = skipped + 1;
        }

        // Levels above the new tower now skip over one more node
        for level in height..top {
            let prev = self.stage(&mut staged, frontier.update[level])?;
            prev.levels[level].span += 1;
        }

        // Nothing links to the unit yet, so a failed write only has to hand
        // it back
        if let Err(e) = self.put_node(offset, &node) {
            if let Err(release_err) = self.heap.release(offset) {
                warn!(offset, error = %release_err, "Failed to release unit of unwritten node");
            }
            return Err(e);
        }

        for (prev_offset, prev) in &staged {
            self.put_node(*prev_offset, prev)?;
        }

        let next = node.next();
        if next != NIL {
            let mut successor = self.node(next)?;
            successor.backward = offset;
            self.put_node(next, &successor)?;
        }

        if next == NIL {
            self.root.tail = offset;
        }
        self.root.max_level = top as u64;
        self.root.len += 1;
        self.after_write()?;

        Ok((Position(offset), true))
    }

    /// Erase the element equal to `key`
    ///
    /// Returns the position that followed it, or end when `key` was absent.
    pub fn erase(&mut self, key: &K) -> Result<Position> {
        let frontier = self.search(key, Descent::Below)?;
        let target = frontier.node.next();
        if target == NIL {
            return Ok(Position::END);
        }

        let victim = self.node(target)?;
        if self.cmp.less(key, &victim.key) {
            return Ok(Position::END);
        }

        let mut top = self.root.max_level as usize;
        for level in 0..top {
            let prev_offset = frontier.update[level];
            let mut prev = self.node(prev_offset)?;
            if prev.levels[level].forward == target {
                prev.levels[level].span += victim.levels[level].span;
                prev.levels[level].span -= 1;
                prev.levels[level].forward = victim.levels[level].forward;
            } else {
                prev.levels[level].span -= 1;
            }
            self.put_node(prev_offset, &prev)?;
        }

        let next = victim.next();
        if next != NIL {
            let mut successor = self.node(next)?;
            successor.backward = victim.backward;
            self.put_node(next, &successor)?;
        }

        let head = self.node(self.root.head)?;
        while top > 1 && head.levels[top - 1].forward == NIL {
            top -= 1;
        }

        if next == NIL {
            self.root.tail = victim.backward;
        }
        self.root.max_level = top as u64;
        self.root.len -= 1;

        // The node is already unlinked; a failed release leaks its unit
        self.heap.release(target)?;
        self.after_write()?;

        Ok(Position(next))
    }

    // =========================================================================
    // Order Statistics
    // =========================================================================

    /// Number of stored keys strictly less than `key`
    pub fn order_of_key(&mut self, key: &K) -> Result<u64> {
        let frontier = self.search(key, Descent::Below)?;
        Ok(frontier.rank[0])
    }

    /// Alias of [`SkipList::order_of_key`]
    pub fn rank_of(&mut self, key: &K) -> Result<u64> {
        self.order_of_key(key)
    }

    /// Element with zero-based rank `rank`, or end when `rank >= len()`
    pub fn find_by_order(&mut self, rank: u64) -> Result<Position> {
        if rank >= self.root.len {
            return Ok(Position::END);
        }

        let mut remaining = rank;
        let mut cur = self.node(self.root.head)?;
        for level in (0..self.root.max_level as usize).rev() {
            while remaining > 0 && cur.levels[level].forward != NIL {
                let span = cur.levels[level].span;
                if remaining < span {
                    break;
                }
                remaining -= span;
                cur = self.node(cur.levels[level].forward)?;
            }
        }

        Ok(Position(cur.next()))
    }

    /// Alias of [`SkipList::find_by_order`]
    pub fn select(&mut self, rank: u64) -> Result<Position> {
        self.find_by_order(rank)
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Double-ended iterator over every key in order
    pub fn iter(&mut self) -> Iter<'_, K, C> {
        let (tail, len) = (self.root.tail, self.root.len);
        Iter::new(self, tail, len)
    }

    /// Keys from `from` up to, not including, `to`
    pub fn range(&mut self, from: Position, to: Position) -> Range<'_, K, C> {
        Range::new(self, from, to)
    }

    /// Collect every key in order
    pub fn to_vec(&mut self) -> Result<Vec<K>> {
        self.iter().collect()
    }

    // =========================================================================
    // Durability
    // =========================================================================

    /// Write root metadata and the size-class table back to the file
    pub fn flush(&mut self) -> Result<()> {
        self.heap.write(ROOT_OFFSET, &self.root)?;
        self.heap.flush()
    }

    /// Flush headers, sync, and release the file
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Walk the whole structure and verify ordering, links, and spans
    pub fn check_invariants(&mut self) -> Result<()> {
        let head = self.root.head;
        let len = self.root.len;
        let top = self.root.max_level as usize;

        if top == 0 || top > MAX_LEVEL {
            return Err(SpanListError::Invariant(format!(
                "max level {} out of range",
                top
            )));
        }

        // Level 0: order, backward links, tail, length
        let mut index_of = HashMap::new();
        index_of.insert(head, 0u64);
        let mut prev_offset = head;
        let mut prev_key: Option<K> = None;
        let mut cursor = self.node(head)?.next();
        let mut count = 0u64;
        while cursor != NIL {
            count += 1;
            if count > len {
                return Err(SpanListError::Invariant(format!(
                    "level 0 holds more than {} nodes",
                    len
                )));
            }
            let node = self.node(cursor)?;
            if node.backward != prev_offset {
                return Err(SpanListError::Invariant(format!(
                    "node {} points back to {}, expected {}",
                    cursor, node.backward, prev_offset
                )));
            }
            if node.height == 0 || node.height as usize > MAX_LEVEL {
                return Err(SpanListError::Invariant(format!(
                    "node {} has height {}",
                    cursor, node.height
                )));
            }
            if let Some(prev) = &prev_key {
                if !self.cmp.less(prev, &node.key) {
                    return Err(SpanListError::Invariant(format!(
                        "node {} is not ordered after its predecessor",
                        cursor
                    )));
                }
            }
            index_of.insert(cursor, count);
            prev_offset = cursor;
            cursor = node.next();
            prev_key = Some(node.key);
        }
        if count != len {
            return Err(SpanListError::Invariant(format!(
                "length is {} but level 0 holds {} nodes",
                len, count
            )));
        }
        if self.root.tail != prev_offset {
            return Err(SpanListError::Invariant(format!(
                "tail is {}, last node is {}",
                self.root.tail, prev_offset
            )));
        }

        // Upper levels: every span equals the level-0 distance it covers
        for level in 0..top {
            let mut cursor = head;
            loop {
                let node = self.node(cursor)?;
                let from = index_of[&cursor];
                let link = node.levels[level];
                let expected = match link.forward {
                    NIL => len - from,
                    forward => match index_of.get(&forward) {
                        Some(to) if *to > from => to - from,
                        _ => {
                            return Err(SpanListError::Invariant(format!(
                                "level {} link from {} leaves the list",
                                level, cursor
                            )))
                        }
                    },
                };
                if link.span != expected {
                    return Err(SpanListError::Invariant(format!(
                        "level {} span at {} is {}, expected {}",
                        level, cursor, link.span, expected
                    )));
                }
                if link.forward == NIL {
                    break;
                }
                cursor = link.forward;
            }
        }

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Root metadata as currently cached
    pub fn root(&self) -> &RootMeta {
        &self.root
    }

    /// Number of levels in use
    pub fn max_level(&self) -> u64 {
        self.root.max_level
    }

    /// Encoded width of every node
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Underlying allocator
    pub fn heap(&self) -> &HeapFile {
        &self.heap
    }

    /// Underlying allocator, for inspection that walks the file
    pub fn heap_mut(&mut self) -> &mut HeapFile {
        &mut self.heap
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Search phase shared by lookup, insert, erase, and rank queries
    fn search(&mut self, key: &K, descent: Descent) -> Result<Frontier<K>> {
        let mut update = [NIL; MAX_LEVEL];
        let mut rank = [0u64; MAX_LEVEL];
        let top = self.root.max_level as usize;

        let mut cur_offset = self.root.head;
        let mut cur = self.node(cur_offset)?;
        for level in (0..top).rev() {
            rank[level] = if level + 1 == top { 0 } else { rank[level + 1] };

            loop {
                let forward = cur.levels[level].forward;
                if forward == NIL {
                    break;
                }
                let next = self.node(forward)?;
                if !descent.passes(&self.cmp, &next.key, key) {
                    break;
                }
                rank[level] += cur.levels[level].span;
                cur_offset = forward;
                cur = next;
            }
            update[level] = cur_offset;
        }

        Ok(Frontier {
            update,
            rank,
            node: cur,
        })
    }

    /// Geometric tower height: P(height >= k) = 0.25^(k-1), capped at MAX_LEVEL
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_LEVEL && self.rng.gen::<f32>() < LEVEL_PROBABILITY {
            height += 1;
        }
        height
    }

    fn check_key_width(&self, key: &K) -> Result<()> {
        let actual = codec::encoded_size(key)?;
        if actual != self.key_size {
            return Err(SpanListError::RecordSize {
                expected: self.node_size,
                actual: self.node_size - self.key_size + actual,
            });
        }
        Ok(())
    }

    fn check_element(&self, pos: Position) -> Result<()> {
        if pos.is_end() {
            return Err(SpanListError::InvalidPosition("cannot dereference end"));
        }
        if pos.0 == self.root.head {
            return Err(SpanListError::InvalidPosition("cannot dereference rend"));
        }
        Ok(())
    }

    pub(crate) fn node(&mut self, offset: u64) -> Result<Node<K>> {
        self.heap.read(offset, self.node_size)
    }

    /// Node at `offset` from `staged`, read in on first use
    fn stage<'s>(
        &mut self,
        staged: &'s mut Vec<(u64, Node<K>)>,
        offset: u64,
    ) -> Result<&'s mut Node<K>> {
        let index = match staged.iter().position(|(at, _)| *at == offset) {
            Some(index) => index,
            None => {
                staged.push((offset, self.node(offset)?));
                staged.len() - 1
            }
        };
        Ok(&mut staged[index].1)
    }

    fn put_node(&mut self, offset: u64, node: &Node<K>) -> Result<()> {
        self.heap.write(offset, node)
    }

    fn after_write(&mut self) -> Result<()> {
        match self.flush_policy {
            FlushPolicy::OnClose => Ok(()),
            FlushPolicy::EveryWrite => self.flush(),
        }
    }
}

/// Reject root metadata that no initialised file could hold
fn check_root(root: &RootMeta, file_len: u64) -> Result<()> {
    let first_unit = HEAP_START + TAG_SIZE;
    let in_heap = |offset: u64| offset >= first_unit && offset < file_len;

    if root.max_level == 0
        || root.max_level as usize > MAX_LEVEL
        || !in_heap(root.head)
        || !in_heap(root.tail)
    {
        return Err(SpanListError::Invariant(format!(
            "root metadata is not initialised: {:?}",
            root
        )));
    }
    Ok(())
}

impl<K, C> SkipList<K, C> {
    /// End-of-life write-back; runs at most once
    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.heap.write(ROOT_OFFSET, &self.root)?;
        self.heap.shutdown()
    }
}

impl<K, C> Drop for SkipList<K, C> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(path = %self.heap.path().display(), error = %e, "Failed to write back root metadata");
        }
    }
}
