//! Skip List Module
//!
//! A sorted, deduplicated, rank-queryable skip list whose nodes live in a
//! [`HeapFile`](crate::heap::HeapFile) and link to each other by file offset.
//!
//! ## Responsibilities
//! - Ordered lookup (`find`, `lower_bound`, `upper_bound`)
//! - Insert / erase with span maintenance
//! - Rank queries (`order_of_key`, `find_by_order`)
//! - Bidirectional iteration (level-0 forward links, backward links)
//! - Persist root metadata at offset 0
//!
//! ## Structure
//! ```text
//! Level 2:  HEAD ──────────(2)──────────► 30 ─────────(1)────────► NIL
//! Level 1:  HEAD ──(1)──► 10 ────(1)────► 30 ──(1)──► 50 ──(0)───► NIL
//! Level 0:  HEAD ──(1)──► 10 ──(1)──► 20 ──► 30 ──► 40 ──► 50 ──► NIL
//!                          ◄──────────── backward links ────────────
//! ```
//! The number on each link is its span: how many level-0 hops it covers.
//! A null link's span counts the nodes remaining after its origin.
//!
//! ## Node Format
//! ```text
//! ┌─────────┬─────────────┬───────────────┬──────────────────────────────┐
//! │ Key (K) │ Height (8)  │ Backward (8)  │ 16 x [Forward (8)][Span (8)] │
//! └─────────┴─────────────┴───────────────┴──────────────────────────────┘
//! ```
//! Every node is allocated at this full size whatever its tower height.

mod compare;
mod iter;
mod list;
mod node;
mod position;

pub use compare::{ByKey, Comparator, NaturalOrder};
pub use iter::{Iter, Range};
pub use list::SkipList;
pub use node::RootMeta;
pub use position::Position;

/// Maximum tower height
pub const MAX_LEVEL: usize = 16;

/// Probability of growing a tower by one more level
pub const LEVEL_PROBABILITY: f32 = 0.25;

/// Offset of the root metadata record
pub const ROOT_OFFSET: u64 = 0;

/// Encoded root metadata size: four u64 fields
pub const ROOT_SIZE: usize = 32;
