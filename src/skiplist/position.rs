//! Positions within a skip list

use std::fmt;

/// A node position: the node's heap offset, or the end marker
///
/// Positions are plain offsets and stay meaningful only while the node they
/// name is alive. Erasing that node (or clearing the list) invalidates them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(pub(crate) u64);

impl Position {
    /// One past the last element
    pub const END: Position = Position(0);

    /// Whether this is the end marker
    pub fn is_end(self) -> bool {
        self.0 == 0
    }

    /// Heap offset of the node, `None` for the end marker
    pub fn offset(self) -> Option<u64> {
        (!self.is_end()).then_some(self.0)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset() {
            Some(offset) => write!(f, "Position({})", offset),
            None => write!(f, "Position(END)"),
        }
    }
}
