//! # spanlist
//!
//! A persistent, file-backed ordered container:
//! - Byte-heap allocator living inside one backing file
//! - Skip list whose links are file offsets, not memory addresses
//! - Span-augmented levels for rank / select queries
//! - Ordered set and ordered map adaptors
//!
//! The structure survives process restarts with no separate serialization
//! step: reopening a collection by name reads its root metadata back and
//! carries on.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Command Driver                            │
//! │            (insert / delete / find over stdin)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │             OrderedSet / OrderedMap                          │
//! │          (comparator + convenience operations)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Skip List                                  │
//! │      (offset links, spans, root metadata at offset 0)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Heap File                                   │
//! │     (size-class free lists, tagged units, file growth)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Limitations
//! - Single-threaded; one open handle per file
//! - Headers are written back at close (or after every write with
//!   [`FlushPolicy::EveryWrite`]); a crash in between may leave the file
//!   unrecoverable
//! - The file never shrinks except through `clear()`
//! - Keys must encode to a fixed width

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

mod codec;
pub mod heap;
pub mod skiplist;
pub mod collections;
pub mod command;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SpanListError};
pub use config::{Config, FlushPolicy};
pub use skiplist::{Comparator, NaturalOrder, Position, SkipList};
pub use collections::{OrderedMap, OrderedSet};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of spanlist
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
