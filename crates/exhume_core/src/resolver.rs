//! Boundary resolution: turning a header match into a concrete byte range.

use crate::error::{CarveError, Result};
use crate::signature::SignatureDefinition;

/// What to do with a header match whose signature defines a footer but no
/// footer occurs anywhere after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterPolicy {
    /// Truncate at the fallback length, like a footerless signature.
    Fallback,
    /// Drop the match and record a diagnostic.
    Discard,
}

/// A resolved extraction range. Invariant: `start < end <= source length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarveRegion<'a> {
    pub type_name: &'a str,
    pub start: u64,
    pub end: u64,
}

impl CarveRegion<'_> {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves the end offset for a header match.
///
/// With a footer defined, the *first* footer occurrence at or after the end
/// of the header wins and the region runs through the end of that footer.
/// A file embedding a copy of its own footer marker is truncated at the
/// embedded copy; that is the deliberate tie-break, chosen for auditable
/// reproducibility over cleverness. No footer anywhere after the header is
/// `NoFooterFound`, which the orchestrator maps through its policy.
///
/// `footers` must be the ascending occurrence list for this signature's
/// footer pattern over the whole source.
pub fn resolve<'a>(
    header: u64,
    signature: &'a SignatureDefinition,
    footers: &[u64],
    source_len: u64,
    fallback_length: u64,
) -> Result<CarveRegion<'a>> {
    let end = match signature.footer() {
        Some(footer) => {
            let from = header + signature.header().len() as u64;
            let idx = footers.partition_point(|&f| f < from);
            match footers.get(idx) {
                Some(&f) => f + footer.len() as u64,
                None => return Err(CarveError::NoFooterFound { header }),
            }
        }
        None => fallback_end(header, signature, source_len, fallback_length),
    };
    region(signature, header, end, source_len)
}

/// Fallback-length resolution, used for footerless signatures and for the
/// `NoFooterFound` path under `FooterPolicy::Fallback`: the region spans
/// the header plus `fallback_length` payload bytes, clamped to the source
/// end.
pub fn resolve_with_fallback<'a>(
    header: u64,
    signature: &'a SignatureDefinition,
    source_len: u64,
    fallback_length: u64,
) -> Result<CarveRegion<'a>> {
    let end = fallback_end(header, signature, source_len, fallback_length);
    region(signature, header, end, source_len)
}

fn fallback_end(
    header: u64,
    signature: &SignatureDefinition,
    source_len: u64,
    fallback_length: u64,
) -> u64 {
    (header + signature.header().len() as u64)
        .saturating_add(fallback_length)
        .min(source_len)
}

fn region<'a>(
    signature: &'a SignatureDefinition,
    start: u64,
    end: u64,
    source_len: u64,
) -> Result<CarveRegion<'a>> {
    if end <= start || end > source_len {
        return Err(CarveError::DegenerateRegion {
            type_name: signature.type_name().to_string(),
            start,
            end,
        });
    }
    Ok(CarveRegion {
        type_name: signature.type_name(),
        start,
        end,
    })
}
