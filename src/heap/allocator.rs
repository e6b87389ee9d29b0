//! Heap file allocator
//!
//! Maps allocate/release requests onto offsets in one file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::codec;
use crate::error::{Result, SpanListError};

use super::{
    size_class, unit_size, SizeClassTable, Tag, HEAP_START, MAX_UNIT_SIZE, NUM_CLASSES, RESERVE,
    TABLE_SIZE, TAG_SIZE,
};

/// Free-list allocator over a single backing file
///
/// The size-class table is cached in memory for the lifetime of the handle
/// and written back to the reserved region on `flush()` and at close. Tags
/// and payloads are always read from and written to the file directly.
pub struct HeapFile {
    /// Backing file path
    path: PathBuf,
    /// Open handle (read + write)
    file: File,
    /// Cached bucket heads
    table: SizeClassTable,
    /// Whether `open()` created the file
    created: bool,
    /// Set once the table has been written back at end of life
    closed: bool,
    /// Reused buffer for record reads
    scratch: Vec<u8>,
}

impl HeapFile {
    /// Open or create a heap file
    ///
    /// An existing file has its size-class table loaded from the reserved
    /// region. A new file gets an all-empty table, persisted immediately.
    pub fn open(path: &Path) -> Result<Self> {
        let created = !path.exists();

        let mut heap = if created {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(true)
                .open(path)?;

            let mut heap = Self {
                path: path.to_path_buf(),
                file,
                table: SizeClassTable::new(),
                created,
                closed: false,
                scratch: Vec::new(),
            };
            heap.flush()?;
            heap
        } else {
            let mut file = OpenOptions::new().read(true).write(true).open(path)?;

            let mut bytes = vec![0u8; TABLE_SIZE as usize];
            file.seek(SeekFrom::Start(RESERVE))?;
            file.read_exact(&mut bytes)?;

            Self {
                path: path.to_path_buf(),
                file,
                table: SizeClassTable::decode(&bytes)?,
                created,
                closed: false,
                scratch: Vec::new(),
            }
        };

        debug!(
            path = %heap.path.display(),
            created,
            file_len = heap.file_len()?,
            "Opened heap file"
        );

        Ok(heap)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate a unit able to hold `requested_size` bytes
    ///
    /// Pops the class's free list when it is non-empty, otherwise appends a
    /// new tagged unit at end of file. Returns the payload offset (just past
    /// the tag).
    pub fn allocate(&mut self, requested_size: usize) -> Result<u64> {
        let class = size_class(requested_size).ok_or(SpanListError::SizeClass {
            requested: requested_size,
            max: MAX_UNIT_SIZE,
        })?;

        let head = self.table.free_head(class);
        if head != 0 {
            let tag: Tag = self.read(head, TAG_SIZE as usize)?;
            self.table.set_free_head(class, tag.next_free);
            trace!(class, tag_offset = head, "Reused free unit");
            return Ok(head + TAG_SIZE);
        }

        let tag_offset = self.file.seek(SeekFrom::End(0))?.max(HEAP_START);
        self.write(tag_offset, &Tag::fresh(class as u16))?;

        let payload = tag_offset + TAG_SIZE;
        self.file.set_len(payload + unit_size(class) as u64)?;

        trace!(class, tag_offset, "Appended new unit");
        Ok(payload)
    }

    /// Return a unit to its class's free list
    ///
    /// `offset` must be a payload offset previously returned by `allocate()`
    /// and not yet released. Double release corrupts the free list and is
    /// not detected.
    pub fn release(&mut self, offset: u64) -> Result<()> {
        if offset < HEAP_START + TAG_SIZE {
            return Err(SpanListError::InvalidPosition(
                "offset precedes the heap region",
            ));
        }

        let tag_offset = offset - TAG_SIZE;
        let mut tag: Tag = self.read(tag_offset, TAG_SIZE as usize)?;
        let class = tag.class_id as usize;
        if class >= NUM_CLASSES {
            return Err(SpanListError::Serialization(format!(
                "Tag at {} names unknown size class {}",
                tag_offset, class
            )));
        }

        // Persist the link before moving the head so an I/O failure leaves
        // the bucket untouched
        tag.next_free = self.table.free_head(class);
        self.write(tag_offset, &tag)?;
        self.table.set_free_head(class, tag_offset);

        trace!(class, tag_offset, "Released unit");
        Ok(())
    }

    // =========================================================================
    // Raw Record Transfer
    // =========================================================================

    /// Read a record of `size` encoded bytes at an absolute offset
    pub fn read<T: DeserializeOwned>(&mut self, offset: u64, size: usize) -> Result<T> {
        self.scratch.resize(size, 0);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut self.scratch)?;
        codec::decode(&self.scratch)
    }

    /// Write a record at an absolute offset
    pub fn write<T: Serialize>(&mut self, offset: u64, record: &T) -> Result<()> {
        let bytes = codec::encode(record)?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&bytes)?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Truncate the file and start over with an empty table
    pub fn reset(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.table = SizeClassTable::new();
        self.flush()?;
        debug!(path = %self.path.display(), "Reset heap file");
        Ok(())
    }

    /// Write the size-class table back to the reserved region
    pub fn flush(&mut self) -> Result<()> {
        let bytes = self.table.encode()?;
        self.file.seek(SeekFrom::Start(RESERVE))?;
        self.file.write_all(&bytes)?;
        Ok(())
    }

    /// Force file contents to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Flush the table and sync, consuming the handle
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    /// End-of-life write-back; runs at most once
    pub(crate) fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.flush()?;
        self.sync()?;
        debug!(path = %self.path.display(), "Closed heap file");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether `open()` created a new file
    pub fn created(&self) -> bool {
        self.created
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size-class table
    pub fn table(&self) -> &SizeClassTable {
        &self.table
    }

    /// Current file length in bytes
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of units on a class's free list (walks the chain)
    pub fn free_list_len(&mut self, class: usize) -> Result<usize> {
        let mut count = 0;
        let mut cursor = self.table.free_head(class);
        while cursor != 0 {
            let tag: Tag = self.read(cursor, TAG_SIZE as usize)?;
            cursor = tag.next_free;
            count += 1;
        }
        Ok(count)
    }
}

impl Drop for HeapFile {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(path = %self.path.display(), error = %e, "Failed to write back size-class table");
        }
    }
}
