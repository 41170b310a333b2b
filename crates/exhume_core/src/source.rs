//! Byte source abstraction over disk images and raw byte streams.
//!
//! The engine never assumes the whole source fits in memory: everything is
//! expressed as stateless positional reads so independent workers can share
//! one source without locking.

use crate::error::Result;

/// A read-only source of raw bytes with a known total length.
///
/// Reads are positional and take `&self`, so a single source can be shared
/// across scanning and extraction workers. Implementations are expected to
/// be cheap to read from at arbitrary offsets (memory map, `pread`, or an
/// in-memory buffer).
pub trait ByteSource: Send + Sync {
    /// Reads bytes at `offset` into `buf`, returning how many were read.
    ///
    /// A return of less than `buf.len()` is only expected at end of source;
    /// zero means `offset` is at or past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total length of the source in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSource for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = (offset.min(self.len() as u64)) as usize;
        let end = start.saturating_add(buf.len()).min(self.len());
        let n = end - start;
        buf[..n].copy_from_slice(&self[start..end]);
        Ok(n)
    }

    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.as_slice().read_at(offset, buf)
    }

    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }
}
