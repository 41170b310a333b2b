mod carver;
mod error;
mod extractor;
mod matcher;
mod resolver;
mod scan;
mod signature;
mod source;

pub use carver::{
    CarveConfig, CarveReport, Carver, SkipReason, SkippedMatch, DEFAULT_FALLBACK_LENGTH,
};
pub use error::{CarveError, Result};
pub use extractor::{extract, CarvedArtifact};
pub use matcher::{find_all, PatternScan};
pub use resolver::{resolve, resolve_with_fallback, CarveRegion, FooterPolicy};
pub use scan::{ProgressFn, ScanProgress, SignatureIndex, SignatureScanner};
pub use signature::{RawSignature, SignatureDefinition, SignatureRegistry};
pub use source::ByteSource;
