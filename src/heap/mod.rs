//! Heap Module
//!
//! A byte-heap allocator living inside a single backing file.
//!
//! ## Responsibilities
//! - Hand out file offsets for fixed-size allocation units
//! - Reuse released units through per-size-class free lists
//! - Grow the file when no free unit of the right class exists
//! - Raw record transfer at absolute offsets
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Root Region (offset 0, 64 bytes reserved)               │
//! │   owned by the layer above (skip list root metadata)    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Size-Class Table (offset 64, 128 x 12 bytes)            │
//! │   [UnitSize: u32][FreeHead: u64] per bucket             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Heap Region (offset 1600 onwards)                       │
//! │   [Tag: NextFree u64 | ClassId u16][Payload]            │
//! │   ... one unit per allocation, append-only ...          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Bucket `i` serves requests of `(i + 1) << 2` bytes. A free-list head of
//! zero means the bucket is empty; offset zero is the root region, so it can
//! never name a unit.

mod allocator;
mod table;
mod tag;

pub use allocator::HeapFile;
pub use table::{size_class, unit_size, Bucket, SizeClassTable};
pub use tag::Tag;

// =============================================================================
// Layout Constants
// =============================================================================

/// Offset of the size-class table; everything before it is the root region
pub const RESERVE: u64 = 1 << 6;

/// Number of size-class buckets
pub const NUM_CLASSES: usize = 1 << 7;

/// Size classes are multiples of `1 << UNIT_SHIFT` bytes
pub const UNIT_SHIFT: u32 = 2;

/// Largest request any bucket can serve
pub const MAX_UNIT_SIZE: usize = NUM_CLASSES << UNIT_SHIFT;

/// Encoded tag size: NextFree (8) + ClassId (2)
pub const TAG_SIZE: u64 = 10;

/// Encoded bucket size: UnitSize (4) + FreeHead (8)
pub const BUCKET_SIZE: u64 = 12;

/// Encoded size-class table size
pub const TABLE_SIZE: u64 = NUM_CLASSES as u64 * BUCKET_SIZE;

/// First byte of the heap region
pub const HEAP_START: u64 = RESERVE + TABLE_SIZE;

/// Null offset (end of a free list, absent forward link)
pub const NIL: u64 = 0;
