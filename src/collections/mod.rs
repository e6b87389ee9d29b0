//! Collections Module
//!
//! Ordered set and ordered map adaptors over [`SkipList`](crate::skiplist::SkipList).
//!
//! Both are thin: the set is the skip list on a bare key, the map is the skip
//! list on `(key, value)` pairs ordered by key alone. Each derefs to its
//! underlying list for the full positional and rank surface.

mod map;
mod set;

pub use map::OrderedMap;
pub use set::OrderedSet;
