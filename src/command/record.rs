//! Driver record type

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpanListError};

/// Longest name a record can hold
pub const NAME_CAPACITY: usize = 64;

/// Names are stored as two halves; serde derives arrays of at most 32
const HALF: usize = NAME_CAPACITY / 2;

/// `(name, value)` entry, ordered by name then by value
///
/// The name is stored NUL-padded in a fixed array so every record has the
/// same encoded width. Ordering on the padded bytes matches byte-wise string
/// ordering because names never contain NUL; comparing the halves in order
/// is comparing the whole name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Record {
    name: [[u8; HALF]; 2],
    value: i32,
}

impl Record {
    pub fn new(name: &str, value: i32) -> Result<Self> {
        Ok(Self {
            name: encode_name(name)?,
            value,
        })
    }

    /// Smallest record carrying `name`
    pub fn first_of(name: &str) -> Result<Self> {
        Self::new(name, i32::MIN)
    }

    /// Largest record carrying `name`
    pub fn last_of(name: &str) -> Result<Self> {
        Self::new(name, i32::MAX)
    }

    pub fn name(&self) -> String {
        let bytes = self.name.concat();
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(NAME_CAPACITY);
        String::from_utf8_lossy(&bytes[..len]).into_owned()
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.value)
    }
}

fn encode_name(name: &str) -> Result<[[u8; HALF]; 2]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return Err(SpanListError::Command("empty name".to_string()));
    }
    if bytes.len() > NAME_CAPACITY {
        return Err(SpanListError::Command(format!(
            "name {:?} is longer than {} bytes",
            name, NAME_CAPACITY
        )));
    }
    if bytes.contains(&0) {
        return Err(SpanListError::Command(format!(
            "name {:?} contains a NUL byte",
            name
        )));
    }

    let mut halves = [[0u8; HALF]; 2];
    for (half, chunk) in halves.iter_mut().zip(bytes.chunks(HALF)) {
        half[..chunk.len()].copy_from_slice(chunk);
    }
    Ok(halves)
}
