//! Combined multi-pattern scan.
//!
//! One streaming pass over the source with an Aho-Corasick automaton built
//! over every distinct header and footer pattern, instead of one rescan per
//! signature. The result is an index of ascending occurrence offsets per
//! pattern, which the resolver consults with a binary search.

use crate::error::{CarveError, Result};
use crate::signature::SignatureRegistry;
use crate::source::ByteSource;
use aho_corasick::AhoCorasick;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Scan progress snapshot handed to the progress callback between chunks.
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress {
    pub total_bytes: u64,
    pub scanned_bytes: u64,
    pub matches_found: usize,
}

pub type ProgressFn = dyn Fn(&ScanProgress) + Send + Sync;

/// Occurrence offsets per pattern, ascending and non-overlapping.
#[derive(Debug, Default)]
pub struct SignatureIndex {
    occurrences: Vec<Vec<u64>>,
    scanned_bytes: u64,
}

impl SignatureIndex {
    pub fn occurrences(&self, pattern_id: usize) -> &[u64] {
        self.occurrences
            .get(pattern_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_matches(&self) -> usize {
        self.occurrences.iter().map(Vec::len).sum()
    }

    /// How far the scan got; less than the source length when cancelled.
    pub fn scanned_bytes(&self) -> u64 {
        self.scanned_bytes
    }

    /// Drops occurrences that start inside a preceding occurrence of the
    /// same pattern, so the per-pattern lists obey the matcher's
    /// non-overlap rule.
    fn finalize(&mut self, pattern_lens: &[usize]) {
        for (occ, &len) in self.occurrences.iter_mut().zip(pattern_lens) {
            let mut next_allowed = 0u64;
            occ.retain(|&offset| {
                if offset >= next_allowed {
                    next_allowed = offset + len as u64;
                    true
                } else {
                    false
                }
            });
        }
    }
}

/// Aho-Corasick automaton over the distinct patterns of a registry, with
/// the mapping from each signature back to its header/footer pattern ids.
pub struct SignatureScanner {
    automaton: AhoCorasick,
    pattern_lens: Vec<usize>,
    header_ids: Vec<usize>,
    footer_ids: Vec<Option<usize>>,
}

impl SignatureScanner {
    pub fn new(registry: &SignatureRegistry) -> Result<Self> {
        let mut ids: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut patterns: Vec<Vec<u8>> = Vec::new();
        let mut header_ids = Vec::with_capacity(registry.len());
        let mut footer_ids = Vec::with_capacity(registry.len());

        for sig in registry.signatures() {
            header_ids.push(intern(&mut ids, &mut patterns, sig.header()));
            footer_ids.push(sig.footer().map(|f| intern(&mut ids, &mut patterns, f)));
        }

        let automaton = AhoCorasick::new(&patterns).map_err(|e| {
            CarveError::Configuration(format!("failed to build pattern automaton: {e}"))
        })?;
        let pattern_lens = patterns.iter().map(Vec::len).collect();

        Ok(Self {
            automaton,
            pattern_lens,
            header_ids,
            footer_ids,
        })
    }

    /// Header occurrences for the signature at `sig_idx` (registry order).
    pub fn headers<'i>(&self, index: &'i SignatureIndex, sig_idx: usize) -> &'i [u64] {
        index.occurrences(self.header_ids[sig_idx])
    }

    /// Footer occurrences for the signature at `sig_idx`; empty when the
    /// signature has no footer.
    pub fn footers<'i>(&self, index: &'i SignatureIndex, sig_idx: usize) -> &'i [u64] {
        self.footer_ids[sig_idx]
            .map(|id| index.occurrences(id))
            .unwrap_or(&[])
    }

    /// Streams the source once, recording every pattern occurrence.
    ///
    /// `running` is checked between chunks; a cleared flag stops the scan
    /// and the partial index is returned. Matches starting inside the tail
    /// overlap of a chunk are deferred to the next chunk so each
    /// occurrence is recorded exactly once.
    pub fn scan<S>(
        &self,
        source: &S,
        chunk_size: usize,
        running: &AtomicBool,
        progress: Option<&ProgressFn>,
    ) -> Result<SignatureIndex>
    where
        S: ByteSource + ?Sized,
    {
        let mut index = SignatureIndex {
            occurrences: vec![Vec::new(); self.pattern_lens.len()],
            scanned_bytes: 0,
        };
        let Some(max_len) = self.pattern_lens.iter().copied().max() else {
            return Ok(index);
        };

        let overlap = (max_len - 1) as u64;
        let chunk_size = chunk_size.max(max_len * 2);
        let total = source.len();
        let mut buf = vec![0u8; chunk_size];
        let mut offset: u64 = 0;
        let mut matches_found = 0usize;

        while offset < total {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            let mut filled = 0usize;
            while filled < buf.len() {
                let n = source.read_at(offset + filled as u64, &mut buf[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if filled == 0 {
                break;
            }

            let chunk_end = offset + filled as u64;
            let is_last = chunk_end >= total;
            let accept_below = if is_last { chunk_end } else { chunk_end - overlap };

            for mat in self.automaton.find_overlapping_iter(&buf[..filled]) {
                let abs = offset + mat.start() as u64;
                if abs < accept_below {
                    index.occurrences[mat.pattern().as_usize()].push(abs);
                    matches_found += 1;
                }
            }

            index.scanned_bytes = chunk_end.min(total);
            if let Some(cb) = progress {
                cb(&ScanProgress {
                    total_bytes: total,
                    scanned_bytes: index.scanned_bytes,
                    matches_found,
                });
            }

            if is_last {
                break;
            }
            let next = chunk_end - overlap;
            if next <= offset {
                break;
            }
            offset = next;
        }

        index.finalize(&self.pattern_lens);
        Ok(index)
    }
}

fn intern(ids: &mut HashMap<Vec<u8>, usize>, patterns: &mut Vec<Vec<u8>>, pattern: &[u8]) -> usize {
    if let Some(&id) = ids.get(pattern) {
        return id;
    }
    let id = patterns.len();
    ids.insert(pattern.to_vec(), id);
    patterns.push(pattern.to_vec());
    id
}
