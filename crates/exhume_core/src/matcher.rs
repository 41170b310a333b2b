//! Single-pattern streaming search.
//!
//! `find_all` yields every non-overlapping occurrence of one pattern in
//! ascending offset order, reading the source in chunks so it scales to
//! images far larger than memory. Chunks are re-read with a
//! pattern-length-minus-one overlap, so an occurrence spanning a chunk
//! boundary is found exactly once.

use crate::error::{CarveError, Result};
use crate::source::ByteSource;
use memchr::memmem::Finder;

pub(crate) const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Returns a lazy iterator over all non-overlapping occurrences of
/// `pattern` in `source`, starting at or after `search_start`.
///
/// After a match at offset `i`, the search resumes at `i + pattern.len()`:
/// an occurrence never starts inside a previous occurrence of the same
/// pattern. The iterator is restartable by calling `find_all` again with a
/// new `search_start`.
pub fn find_all<'a, S>(
    source: &'a S,
    pattern: &'a [u8],
    search_start: u64,
) -> Result<PatternScan<'a, S>>
where
    S: ByteSource + ?Sized,
{
    PatternScan::with_chunk_size(source, pattern, search_start, DEFAULT_CHUNK_SIZE)
}

pub struct PatternScan<'a, S: ?Sized> {
    source: &'a S,
    finder: Finder<'a>,
    pattern_len: usize,
    chunk_size: usize,
    /// Next absolute offset a match may start at.
    pos: u64,
    buf: Vec<u8>,
    buf_start: u64,
    buf_len: usize,
    done: bool,
}

impl<'a, S: ByteSource + ?Sized> PatternScan<'a, S> {
    pub(crate) fn with_chunk_size(
        source: &'a S,
        pattern: &'a [u8],
        search_start: u64,
        chunk_size: usize,
    ) -> Result<Self> {
        if pattern.is_empty() {
            return Err(CarveError::InvalidPattern);
        }
        Ok(Self {
            source,
            finder: Finder::new(pattern),
            pattern_len: pattern.len(),
            chunk_size: chunk_size.max(pattern.len() * 2),
            pos: search_start,
            buf: Vec::new(),
            buf_start: 0,
            buf_len: 0,
            done: false,
        })
    }

    /// Loads a fresh chunk starting at `self.pos`. Returns `false` once no
    /// further occurrence can exist (fewer than `pattern_len` bytes left).
    fn refill(&mut self) -> Result<bool> {
        if self.pos + self.pattern_len as u64 > self.source.len() {
            return Ok(false);
        }
        self.buf.resize(self.chunk_size, 0);
        let mut filled = 0usize;
        while filled < self.buf.len() {
            let n = self
                .source
                .read_at(self.pos + filled as u64, &mut self.buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled < self.pattern_len {
            return Ok(false);
        }
        self.buf_start = self.pos;
        self.buf_len = filled;
        Ok(true)
    }
}

impl<S: ByteSource + ?Sized> Iterator for PatternScan<'_, S> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let buf_end = self.buf_start + self.buf_len as u64;
            let in_buf =
                self.pos >= self.buf_start && self.pos + self.pattern_len as u64 <= buf_end;

            if in_buf {
                let lo = (self.pos - self.buf_start) as usize;
                if let Some(rel) = self.finder.find(&self.buf[lo..self.buf_len]) {
                    let found = self.pos + rel as u64;
                    self.pos = found + self.pattern_len as u64;
                    return Some(Ok(found));
                }
                // No match in this chunk; the next one can only start in
                // the last pattern_len - 1 bytes, which the next refill
                // re-reads.
                self.pos = buf_end - (self.pattern_len as u64 - 1);
            }

            match self.refill() {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
