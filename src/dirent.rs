//! Directory listing entries
//!
//! Directory-listing features build an ordered list of name + metadata
//! entries. The list always keeps one spare slot after the last entry whose
//! name is empty, so a consumer can walk it without knowing the length.

use std::time::SystemTime;

use crate::buf::GrowBuf;
use crate::error::Result;

/// Longest name stored in an entry, in bytes.
pub const MAX_NAME_LEN: usize = 1023;

/// Metadata for a listed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlStat {
    pub size: Option<u64>,
    pub atime: Option<SystemTime>,
    pub mtime: Option<SystemTime>,
}

/// One listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirEntry {
    name: String,
    pub stat: UrlStat,
}

impl DirEntry {
    /// Creates an entry, truncating `name` to [`MAX_NAME_LEN`] bytes on a
    /// character boundary.
    pub fn new(name: &str, stat: UrlStat) -> Self {
        Self {
            name: bounded_name(name).to_string(),
            stat,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the empty terminator slot.
    pub fn is_sentinel(&self) -> bool {
        self.name.is_empty()
    }
}

fn bounded_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Sentinel-terminated list of directory entries.
#[derive(Debug, Clone)]
pub struct EntryList {
    /// Entries followed by one sentinel once anything has been added
    buf: GrowBuf<DirEntry>,
    len: usize,
}

impl EntryList {
    /// Slots allocated by the first append
    pub const INITIAL_CAPACITY: usize = 8;

    pub fn new() -> Self {
        Self {
            buf: GrowBuf::new(Self::INITIAL_CAPACITY),
            len: 0,
        }
    }

    /// Appends an entry and moves the sentinel one slot further.
    ///
    /// On allocation failure the list is unchanged.
    pub fn add_entry(&mut self, name: &str, stat: &UrlStat) -> Result<()> {
        if !self.buf.is_allocated() {
            self.buf.ensure_capacity(Self::INITIAL_CAPACITY)?;
            self.buf.push(DirEntry::default())?;
        }

        // the sentinel already occupies slot `len`; make room for the next one
        self.buf.ensure_capacity(1)?;

        self.buf.as_mut_slice()[self.len] = DirEntry::new(name, *stat);
        self.buf.push(DirEntry::default())?;
        self.len += 1;
        Ok(())
    }

    /// Number of entries, not counting the sentinel.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slots, including the one reserved for the sentinel.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The used entries.
    pub fn entries(&self) -> &[DirEntry] {
        &self.buf.as_slice()[..self.len]
    }

    /// The used entries followed by the sentinel. Empty if nothing was added.
    pub fn as_terminated(&self) -> &[DirEntry] {
        self.buf.as_slice()
    }

    /// Walks entries up to the sentinel without consulting the length.
    pub fn iter_until_sentinel(&self) -> impl Iterator<Item = &DirEntry> {
        self.buf.as_slice().iter().take_while(|e| !e.is_sentinel())
    }

    /// Consumes the list and returns the used entries.
    pub fn into_entries(self) -> Vec<DirEntry> {
        let mut entries = self.buf.into_vec();
        entries.truncate(self.len);
        entries
    }
}

impl Default for EntryList {
    fn default() -> Self {
        Self::new()
    }
}
