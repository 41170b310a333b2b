use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid signature configuration: {0}")]
    Configuration(String),

    #[error("empty search pattern")]
    InvalidPattern,

    #[error("no footer found after header at offset {header}")]
    NoFooterFound { header: u64 },

    #[error("degenerate region {start}..{end} for type '{type_name}'")]
    DegenerateRegion {
        type_name: String,
        start: u64,
        end: u64,
    },

    #[error("region {start}..{end} exceeds source length {len}")]
    OutOfBounds { start: u64, end: u64, len: u64 },

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, CarveError>;
