//! Size-class table
//!
//! In-memory copy of the bucket heads persisted in the reserved region.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{Result, SpanListError};

use super::{BUCKET_SIZE, NUM_CLASSES, TABLE_SIZE, UNIT_SHIFT};

/// Size class serving a request of `size` bytes: `ceil(size / 4) - 1`.
///
/// Returns `None` when the request is larger than the biggest class.
pub fn size_class(size: usize) -> Option<usize> {
    let class = (size.max(1) - 1) >> UNIT_SHIFT;
    (class < NUM_CLASSES).then_some(class)
}

/// Unit size of a size class: `(class + 1) << 2`
pub fn unit_size(class: usize) -> usize {
    (class + 1) << UNIT_SHIFT
}

/// One bucket of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Payload bytes of every unit in this class
    pub unit_size: u32,
    /// Tag offset of the first free unit, or 0
    pub free_head: u64,
}

/// The 128 free-list heads, one per size class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeClassTable {
    buckets: Vec<Bucket>,
}

impl SizeClassTable {
    /// All-empty table with the standard unit sizes
    pub fn new() -> Self {
        let buckets = (0..NUM_CLASSES)
            .map(|class| Bucket {
                unit_size: unit_size(class) as u32,
                free_head: 0,
            })
            .collect();
        Self { buckets }
    }

    pub fn bucket(&self, class: usize) -> &Bucket {
        &self.buckets[class]
    }

    pub fn free_head(&self, class: usize) -> u64 {
        self.buckets[class].free_head
    }

    pub fn set_free_head(&mut self, class: usize, head: u64) {
        self.buckets[class].free_head = head;
    }

    /// Encode every bucket back to back, `TABLE_SIZE` bytes in total
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(TABLE_SIZE as usize);
        for bucket in &self.buckets {
            bytes.extend_from_slice(&codec::encode(bucket)?);
        }
        Ok(bytes)
    }

    /// Decode a table previously produced by [`SizeClassTable::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < TABLE_SIZE as usize {
            return Err(SpanListError::Serialization(format!(
                "Size-class table truncated: expected {} bytes, got {}",
                TABLE_SIZE,
                bytes.len()
            )));
        }
        let buckets = bytes
            .chunks_exact(BUCKET_SIZE as usize)
            .take(NUM_CLASSES)
            .map(codec::decode::<Bucket>)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { buckets })
    }
}

impl Default for SizeClassTable {
    fn default() -> Self {
        Self::new()
    }
}
