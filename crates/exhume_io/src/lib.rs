mod file;
mod mmap;

pub use file::FileSource;
pub use mmap::MmapSource;

use exhume_core::{ByteSource, Result};
use std::path::Path;

/// A byte source that prefers memory mapping and falls back to positional
/// file reads when the target cannot be mapped (some block devices, empty
/// files).
pub enum Source {
    Mmap(MmapSource),
    File(FileSource),
}

impl Source {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match MmapSource::open(path) {
            Ok(source) => Ok(Source::Mmap(source)),
            Err(_) => Ok(Source::File(FileSource::open(path)?)),
        }
    }

    #[inline]
    pub fn is_mmap(&self) -> bool {
        matches!(self, Source::Mmap(_))
    }
}

impl ByteSource for Source {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self {
            Source::Mmap(s) => s.read_at(offset, buf),
            Source::File(s) => s.read_at(offset, buf),
        }
    }

    fn len(&self) -> u64 {
        match self {
            Source::Mmap(s) => s.len(),
            Source::File(s) => s.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn open_prefers_mmap_for_regular_files() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"image data").unwrap();
        temp_file.flush().unwrap();

        let source = Source::open(temp_file.path()).unwrap();
        assert!(source.is_mmap());
        assert_eq!(source.len(), 10);
    }

    #[test]
    fn open_falls_back_for_empty_files() {
        let temp_file = NamedTempFile::new().unwrap();
        let source = Source::open(temp_file.path()).unwrap();
        assert!(!source.is_mmap());
        assert_eq!(source.len(), 0);
    }

    #[test]
    fn open_missing_path_fails() {
        assert!(Source::open("/does/not/exist.img").is_err());
    }
}
