//! Persists carved artifacts and their chain-of-custody sidecars.

use anyhow::{Context, Result};
use chrono::Utc;
use exhume_core::CarvedArtifact;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
struct CustodyRecord {
    filename: String,
    source_offset: String,
    source_offset_decimal: u64,
    file_size: u64,
    sha256_hash: String,
    recovery_timestamp: String,
    file_type: String,
}

/// Writes artifacts into one output directory under deterministic names.
///
/// The name is `recovered_<start_offset>_<type_name>.dat`; start offsets
/// are unique per match origin, so collisions cannot occur within a run.
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn write(&self, artifact: &CarvedArtifact) -> Result<PathBuf> {
        let filename = format!(
            "recovered_{}_{}.dat",
            artifact.start_offset,
            sanitize(&artifact.type_name)
        );
        let path = self.output_dir.join(&filename);

        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::with_capacity(131_072, file);
        writer.write_all(&artifact.payload)?;
        writer.flush()?;

        self.write_custody(&path, &filename, artifact)?;

        info!(
            path = %path.display(),
            size = artifact.payload.len(),
            "recovered {} file",
            artifact.type_name
        );
        Ok(path)
    }

    fn write_custody(&self, path: &Path, filename: &str, artifact: &CarvedArtifact) -> Result<()> {
        let mut hasher = Sha256::new();
        hasher.update(&artifact.payload);

        let record = CustodyRecord {
            filename: filename.to_string(),
            source_offset: format!("0x{:016X}", artifact.start_offset),
            source_offset_decimal: artifact.start_offset,
            file_size: artifact.payload.len() as u64,
            sha256_hash: format!("{:x}", hasher.finalize()),
            recovery_timestamp: Utc::now().to_rfc3339(),
            file_type: artifact.type_name.clone(),
        };

        let sidecar = path.with_extension("dat.custody.json");
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&sidecar, json)
            .with_context(|| format!("failed to write {}", sidecar.display()))?;
        Ok(())
    }
}

/// Type names come from user configuration; keep them filesystem-safe.
fn sanitize(type_name: &str) -> String {
    type_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(type_name: &str, start_offset: u64, payload: &[u8]) -> CarvedArtifact {
        CarvedArtifact {
            type_name: type_name.to_string(),
            start_offset,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn writes_payload_under_deterministic_name() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let path = writer.write(&artifact("jpeg", 4096, b"payload bytes")).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "recovered_4096_jpeg.dat"
        );
        assert_eq!(fs::read(&path).unwrap(), b"payload bytes");
    }

    #[test]
    fn writes_custody_sidecar_with_hash() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let path = writer.write(&artifact("png", 7, b"abc")).unwrap();
        let sidecar = path.with_extension("dat.custody.json");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();

        assert_eq!(json["filename"], "recovered_7_png.dat");
        assert_eq!(json["source_offset_decimal"], 7);
        assert_eq!(json["file_size"], 3);
        assert_eq!(json["file_type"], "png");
        // SHA-256 of "abc".
        assert_eq!(
            json["sha256_hash"],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn distinct_offsets_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let a = writer.write(&artifact("raw", 1, b"a")).unwrap();
        let b = writer.write(&artifact("raw", 2, b"b")).unwrap();

        assert_ne!(a, b);
        assert_eq!(fs::read(a).unwrap(), b"a");
        assert_eq!(fs::read(b).unwrap(), b"b");
    }

    #[test]
    fn hostile_type_names_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let path = writer.write(&artifact("../evil/type", 0, b"x")).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "recovered_0_.._evil_type.dat");
        assert!(path.parent().unwrap().ends_with(dir.path().file_name().unwrap()));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/recovered");
        let writer = ArtifactWriter::new(&nested).unwrap();
        writer.write(&artifact("raw", 0, b"x")).unwrap();
        assert!(nested.join("recovered_0_raw.dat").exists());
    }
}
