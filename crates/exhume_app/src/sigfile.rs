//! Loader for the signature definition text format.
//!
//! ```text
//! # comment
//! [jpeg]
//! header=FFD8FF
//! footer=FFD9
//! ```
//!
//! Sections declare file types; `header` and `footer` carry hexadecimal
//! byte patterns. Decoding and validation happen later in the registry;
//! this loader only produces the ordered raw entries.

use anyhow::{bail, Context, Result};
use exhume_core::RawSignature;
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn load_signature_file(path: &Path) -> Result<Vec<(String, RawSignature)>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read signature file {}", path.display()))?;
    parse_signatures(&text)
}

pub fn parse_signatures(text: &str) -> Result<Vec<(String, RawSignature)>> {
    let mut entries: Vec<(String, RawSignature)> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let Some(name) = rest.strip_suffix(']') else {
                bail!("line {lineno}: unterminated section header '{line}'");
            };
            entries.push((name.trim().to_string(), RawSignature::default()));
        } else if let Some((key, value)) = line.split_once('=') {
            let Some((_, current)) = entries.last_mut() else {
                bail!("line {lineno}: field outside of a [type] section");
            };
            match key.trim() {
                "header" => current.header = Some(value.trim().to_string()),
                "footer" => current.footer = Some(value.trim().to_string()),
                other => {
                    debug!(key = other, line = lineno, "ignoring unknown signature field");
                }
            }
        } else {
            bail!("line {lineno}: expected [type] or key=value, got '{line}'");
        }
    }

    Ok(entries)
}
