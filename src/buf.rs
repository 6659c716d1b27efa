//! Growable buffer
//!
//! `GrowBuf` is an append-only buffer that is reused across calls. It keeps
//! its own logical capacity so that growth follows a fixed policy: the first
//! allocation uses a per-use initial size, and every later growth at least
//! doubles the capacity (plus one). Growth is fallible: when an allocation is
//! refused the buffer keeps its previous contents and capacity.
//!
//! # Examples
//!
//! ```
//! use fetchcore::buf::GrowBuf;
//!
//! let mut line = GrowBuf::for_lines();
//! line.extend_from_slice(b"HTTP/1.1 200 OK\r\n").unwrap();
//! assert_eq!(line.as_slice(), b"HTTP/1.1 200 OK\r\n");
//! assert_eq!(line.capacity(), GrowBuf::<u8>::LINE_INITIAL_CAPACITY);
//! ```

use std::fmt;
use std::io;

use crate::error::{FetchError, Result};

/// Append-only buffer with a doubling growth policy.
#[derive(Clone)]
pub struct GrowBuf<T> {
    /// Stored elements; `data.len()` is the used length
    data: Vec<T>,
    /// Logical capacity, zero while unallocated
    capacity: usize,
    /// Capacity of the first allocation
    initial: usize,
}

impl GrowBuf<u8> {
    /// Initial capacity of a line buffer
    pub const LINE_INITIAL_CAPACITY: usize = 1024;

    /// Creates an unallocated byte buffer sized for text lines.
    pub fn for_lines() -> Self {
        Self::new(Self::LINE_INITIAL_CAPACITY)
    }

    /// Returns the contents as text, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

impl<T> GrowBuf<T> {
    /// Creates an unallocated buffer whose first allocation holds `initial`
    /// elements. Nothing is allocated until the first `ensure_capacity`.
    pub fn new(initial: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            initial: initial.max(1),
        }
    }

    /// Whether the first allocation has happened.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.capacity != 0
    }

    /// Makes room for at least `additional` more elements.
    ///
    /// Allocates the initial capacity on first use. When the current capacity
    /// cannot hold `len + additional`, grows to `2 * capacity + 1` or to the
    /// required size, whichever is larger. On failure the buffer is left
    /// exactly as it was and [`FetchError::OutOfMemory`] is returned.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .data
            .len()
            .checked_add(additional)
            .ok_or(FetchError::OutOfMemory)?;

        let target = if !self.is_allocated() {
            self.initial.max(needed)
        } else if needed > self.capacity {
            self.capacity
                .checked_mul(2)
                .and_then(|c| c.checked_add(1))
                .ok_or(FetchError::OutOfMemory)?
                .max(needed)
        } else {
            return Ok(());
        };

        self.data.try_reserve_exact(target - self.data.len())?;
        self.capacity = target;
        Ok(())
    }

    /// Appends one element, growing if the buffer is full.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.ensure_capacity(1)?;
        self.data.push(value);
        Ok(())
    }

    /// Drops all elements but keeps the allocation for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns the used elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of used elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical capacity; always at least `len()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consumes the buffer and returns the used elements.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Clone> GrowBuf<T> {
    /// Appends a slice, growing once for the whole slice.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<()> {
        self.ensure_capacity(values.len())?;
        self.data.extend_from_slice(values);
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowBuf")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .field("data", &self.data)
            .finish()
    }
}

impl<T> Default for GrowBuf<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> AsRef<[T]> for GrowBuf<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

/// Lets a byte buffer be used anywhere an `io::Write` is expected.
impl io::Write for GrowBuf<u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf)
            .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
