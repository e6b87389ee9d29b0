//! Allocation tag
//!
//! The in-band header in front of every heap unit.

use serde::{Deserialize, Serialize};

/// Header preceding every unit, live or free.
///
/// The same bytes serve both states. Whether `next_free` is meaningful is
/// decided by the allocator's bucket chain, not by anything in the tag: a
/// unit reachable from a bucket head is free, any other unit is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Next free unit of the same class (tag offset), or 0
    pub next_free: u64,
    /// Size class the unit was carved for
    pub class_id: u16,
}

impl Tag {
    /// Tag for a freshly appended unit
    pub fn fresh(class_id: u16) -> Self {
        Self {
            next_free: 0,
            class_id,
        }
    }
}
