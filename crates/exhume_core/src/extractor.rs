//! Materializes a resolved region as an owned artifact.

use crate::error::{CarveError, Result};
use crate::resolver::CarveRegion;
use crate::source::ByteSource;

const EXTRACTION_BUFFER_SIZE: usize = 64 * 1024;

/// A carved file: the region's bytes copied out of the source, independent
/// of the source's lifetime. Terminal output of the engine, handed to a
/// persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarvedArtifact {
    pub type_name: String,
    pub start_offset: u64,
    pub payload: Vec<u8>,
}

impl CarvedArtifact {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Copies `source[region.start..region.end]` into an owned artifact.
///
/// A region outside the source bounds means the resolver and extractor
/// disagree on the source length; that is an internal invariant violation,
/// not a user error, so it asserts in debug builds and surfaces as
/// `OutOfBounds` rather than being clamped a second time.
pub fn extract<S>(region: &CarveRegion<'_>, source: &S) -> Result<CarvedArtifact>
where
    S: ByteSource + ?Sized,
{
    let source_len = source.len();
    debug_assert!(
        region.start < region.end && region.end <= source_len,
        "resolver handed the extractor an invalid region {}..{} (source length {})",
        region.start,
        region.end,
        source_len,
    );
    if region.start >= region.end || region.end > source_len {
        return Err(CarveError::OutOfBounds {
            start: region.start,
            end: region.end,
            len: source_len,
        });
    }

    let total = (region.end - region.start) as usize;
    let mut payload = Vec::with_capacity(total);
    let mut buf = vec![0u8; EXTRACTION_BUFFER_SIZE.min(total)];
    let mut offset = region.start;

    while payload.len() < total {
        let want = (total - payload.len()).min(buf.len());
        let n = source.read_at(offset, &mut buf[..want])?;
        if n == 0 {
            return Err(CarveError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("short read at offset {offset}"),
            )));
        }
        payload.extend_from_slice(&buf[..n]);
        offset += n as u64;
    }

    Ok(CarvedArtifact {
        type_name: region.type_name.to_string(),
        start_offset: region.start,
        payload,
    })
}
