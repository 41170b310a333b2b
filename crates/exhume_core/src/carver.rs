//! Carve orchestrator: drives registry -> scan -> resolve -> extract.

use crate::error::{CarveError, Result};
use crate::extractor::{self, CarvedArtifact};
use crate::matcher::DEFAULT_CHUNK_SIZE;
use crate::resolver::{self, FooterPolicy};
use crate::scan::{ProgressFn, SignatureScanner};
use crate::signature::{SignatureDefinition, SignatureRegistry};
use crate::source::ByteSource;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_FALLBACK_LENGTH: u64 = 512;

#[derive(Debug, Clone)]
pub struct CarveConfig {
    /// Extraction length (payload bytes after the header) when a signature
    /// has no footer, or when `footer_policy` is `Fallback` and no footer
    /// was found.
    pub fallback_length: u64,
    pub footer_policy: FooterPolicy,
    /// Chunk size for the streaming scan pass.
    pub chunk_size: usize,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            fallback_length: DEFAULT_FALLBACK_LENGTH,
            footer_policy: FooterPolicy::Fallback,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFooter,
    DegenerateRegion,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFooter => write!(f, "no footer found"),
            Self::DegenerateRegion => write!(f, "degenerate region"),
        }
    }
}

/// A header match that produced no artifact, kept as a diagnostic.
#[derive(Debug, Clone)]
pub struct SkippedMatch {
    pub type_name: String,
    pub header_offset: u64,
    pub reason: SkipReason,
}

/// Everything a completed (or cancelled) run produced.
#[derive(Debug)]
pub struct CarveReport {
    pub artifacts: Vec<CarvedArtifact>,
    pub skipped: Vec<SkippedMatch>,
    pub headers_found: usize,
    pub scanned_bytes: u64,
    pub elapsed: Duration,
    pub cancelled: bool,
}

/// Drives one carve run over a source.
///
/// The run is stateless and idempotent: the same source and registry
/// always produce the same set of `(type_name, start_offset, payload)`
/// triples. Signatures are processed on a worker pool, each worker
/// touching only its own result vector against the shared read-only
/// source; results are merged back in registry order.
#[derive(Debug)]
pub struct Carver {
    registry: SignatureRegistry,
    config: CarveConfig,
}

impl Carver {
    pub fn new(registry: SignatureRegistry, config: CarveConfig) -> Result<Self> {
        if config.fallback_length == 0 {
            return Err(CarveError::Configuration(
                "fallback length must be positive".to_string(),
            ));
        }
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &SignatureRegistry {
        &self.registry
    }

    pub fn carve<S>(&self, source: &S, running: &AtomicBool) -> Result<CarveReport>
    where
        S: ByteSource + ?Sized,
    {
        self.carve_with_progress(source, running, None)
    }

    pub fn carve_with_progress<S>(
        &self,
        source: &S,
        running: &AtomicBool,
        progress: Option<&ProgressFn>,
    ) -> Result<CarveReport>
    where
        S: ByteSource + ?Sized,
    {
        let start = Instant::now();
        let source_len = source.len();

        let scanner = SignatureScanner::new(&self.registry)?;
        let index = scanner.scan(source, self.config.chunk_size, running, progress)?;

        let signatures = self.registry.signatures();
        let headers_found: usize = (0..signatures.len())
            .map(|i| scanner.headers(&index, i).len())
            .sum();

        let per_signature: Vec<Result<(Vec<CarvedArtifact>, Vec<SkippedMatch>)>> = signatures
            .par_iter()
            .enumerate()
            .map(|(i, sig)| {
                self.carve_signature(
                    sig,
                    scanner.headers(&index, i),
                    scanner.footers(&index, i),
                    source,
                    source_len,
                    running,
                )
            })
            .collect();

        let mut report = CarveReport {
            artifacts: Vec::new(),
            skipped: Vec::new(),
            headers_found,
            scanned_bytes: index.scanned_bytes(),
            elapsed: Duration::ZERO,
            cancelled: false,
        };
        for result in per_signature {
            let (artifacts, skipped) = result?;
            report.artifacts.extend(artifacts);
            report.skipped.extend(skipped);
        }

        report.cancelled = !running.load(Ordering::SeqCst);
        report.elapsed = start.elapsed();
        info!(
            artifacts = report.artifacts.len(),
            skipped = report.skipped.len(),
            headers = report.headers_found,
            "carve run complete"
        );
        Ok(report)
    }

    fn carve_signature<S>(
        &self,
        sig: &SignatureDefinition,
        headers: &[u64],
        footers: &[u64],
        source: &S,
        source_len: u64,
        running: &AtomicBool,
    ) -> Result<(Vec<CarvedArtifact>, Vec<SkippedMatch>)>
    where
        S: ByteSource + ?Sized,
    {
        let mut artifacts = Vec::new();
        let mut skipped = Vec::new();

        for &header in headers {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            let resolved =
                resolver::resolve(header, sig, footers, source_len, self.config.fallback_length);
            let region = match resolved {
                Ok(region) => region,
                Err(CarveError::NoFooterFound { .. }) => match self.config.footer_policy {
                    FooterPolicy::Fallback => {
                        debug!(
                            type_name = sig.type_name(),
                            offset = header,
                            "no footer found, truncating at fallback length"
                        );
                        match resolver::resolve_with_fallback(
                            header,
                            sig,
                            source_len,
                            self.config.fallback_length,
                        ) {
                            Ok(region) => region,
                            Err(_) => {
                                warn!(
                                    type_name = sig.type_name(),
                                    offset = header,
                                    "fallback region is degenerate, skipping match"
                                );
                                skipped.push(SkippedMatch {
                                    type_name: sig.type_name().to_string(),
                                    header_offset: header,
                                    reason: SkipReason::DegenerateRegion,
                                });
                                continue;
                            }
                        }
                    }
                    FooterPolicy::Discard => {
                        warn!(
                            type_name = sig.type_name(),
                            offset = header,
                            "no footer found, discarding match"
                        );
                        skipped.push(SkippedMatch {
                            type_name: sig.type_name().to_string(),
                            header_offset: header,
                            reason: SkipReason::NoFooter,
                        });
                        continue;
                    }
                },
                Err(CarveError::DegenerateRegion { .. }) => {
                    warn!(
                        type_name = sig.type_name(),
                        offset = header,
                        "degenerate region, skipping match"
                    );
                    skipped.push(SkippedMatch {
                        type_name: sig.type_name().to_string(),
                        header_offset: header,
                        reason: SkipReason::DegenerateRegion,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            artifacts.push(extractor::extract(&region, source)?);
        }

        Ok((artifacts, skipped))
    }
}
