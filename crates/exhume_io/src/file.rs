//! Positional-read source for image files and block devices.

use exhume_core::{ByteSource, CarveError, Result};
use std::fs::File;
use std::path::Path;

/// A read-only byte source backed by an open file handle.
///
/// Reads are positional (`pread`-style), so the source can be shared by
/// concurrent scan and extraction workers without seek coordination. Works
/// for anything `File::open` accepts: disk images, partition devices, raw
/// block devices.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: u64,
}

impl FileSource {
    /// Opens `path` read-only. Failure to open or stat the file is
    /// `SourceUnavailable`, which is fatal for the whole run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| CarveError::SourceUnavailable(format!("{}: {e}", path.display())))?;
        let size = file
            .metadata()
            .map_err(|e| CarveError::SourceUnavailable(format!("{}: {e}", path.display())))?
            .len();

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{fadvise, Advice};

            let _ = fadvise(&file, 0, None, Advice::Sequential);
        }

        Ok(Self { file, size })
    }
}

impl ByteSource for FileSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }
    }

    fn len(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_basic() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let test_data = b"Hello, World! This is test data for FileSource.";
        temp_file.write_all(test_data).unwrap();
        temp_file.flush().unwrap();

        let source = FileSource::open(temp_file.path()).unwrap();
        assert_eq!(source.len(), test_data.len() as u64);

        let mut buffer = vec![0u8; 13];
        let n = source.read_at(0, &mut buffer).unwrap();
        assert_eq!(n, 13);
        assert_eq!(&buffer, b"Hello, World!");

        let mut buffer = vec![0u8; 4];
        let n = source.read_at(7, &mut buffer).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buffer, b"Worl");
    }

    #[test]
    fn test_file_source_read_beyond_end() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Short").unwrap();
        temp_file.flush().unwrap();

        let source = FileSource::open(temp_file.path()).unwrap();

        let mut buffer = vec![0u8; 100];
        let n = source.read_at(0, &mut buffer).unwrap();
        assert_eq!(n, 5);

        let n = source.read_at(100, &mut buffer).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = FileSource::open("/does/not/exist.img").unwrap_err();
        assert!(matches!(err, CarveError::SourceUnavailable(_)));
    }
}
