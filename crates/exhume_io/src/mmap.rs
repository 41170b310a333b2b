use exhume_core::{ByteSource, CarveError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| CarveError::SourceUnavailable(format!("{}: {e}", path.display())))?;
        let size = file
            .metadata()
            .map_err(|e| CarveError::SourceUnavailable(format!("{}: {e}", path.display())))?
            .len();

        if size == 0 {
            return Err(CarveError::SourceUnavailable(format!(
                "{}: cannot mmap empty file",
                path.display()
            )));
        }

        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| CarveError::SourceUnavailable(format!("{}: {e}", path.display())))?;

        if mmap.is_empty() {
            return Err(CarveError::SourceUnavailable(format!(
                "{}: mmap returned empty mapping (block device not supported)",
                path.display()
            )));
        }

        #[cfg(target_os = "linux")]
        {
            use memmap2::Advice;

            let _ = mmap.advise(Advice::Sequential);
            let _ = mmap.advise(Advice::WillNeed);
        }

        Ok(Self { mmap })
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }
}

impl ByteSource for MmapSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        <[u8] as ByteSource>::read_at(&self.mmap, offset, buf)
    }

    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mmap_source_basic() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let test_data = b"Hello, World! This is test data for MmapSource.";
        temp_file.write_all(test_data).unwrap();
        temp_file.flush().unwrap();

        let source = MmapSource::open(temp_file.path()).unwrap();
        assert_eq!(source.len(), test_data.len() as u64);

        let mut buffer = vec![0u8; 13];
        let n = source.read_at(0, &mut buffer).unwrap();
        assert_eq!(n, 13);
        assert_eq!(&buffer, b"Hello, World!");
        assert_eq!(&source.as_slice()[7..11], b"Worl");
    }

    #[test]
    fn test_mmap_source_beyond_eof() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Short").unwrap();
        temp_file.flush().unwrap();

        let source = MmapSource::open(temp_file.path()).unwrap();

        let mut buffer = vec![0u8; 100];
        let n = source.read_at(0, &mut buffer).unwrap();
        assert_eq!(n, 5);

        let n = source.read_at(100, &mut buffer).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_mmap_source_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let result = MmapSource::open(temp_file.path());
        assert!(result.is_err());
    }
}
