//! File access for the executables being analyzed or patched.
//!
//! Executables are memory-mapped: read-only for extraction and read-write
//! for patching, where the patch engine writes through a cursor over the
//! mapped bytes. File size is bounded by `IOLimits`.

pub mod backup;

pub use backup::with_source_copy;

use crate::error::{PatchError, Result};
use memmap2::{Mmap, MmapMut};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resource limits for mapped files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOLimits {
    /// The largest file that will be opened
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024, // 1GB
        }
    }
}

fn check_size(path: &Path, file: &File, limits: &IOLimits) -> Result<u64> {
    let file_size = file.metadata()?.len();
    debug!(
        path = %path.display(),
        size = file_size,
        limits.max_file_size = limits.max_file_size,
        "Opening file"
    );
    if file_size > limits.max_file_size {
        warn!(
            path = %path.display(),
            size = file_size,
            limit = limits.max_file_size,
            "File is too large"
        );
        return Err(PatchError::FileTooLarge {
            limit: limits.max_file_size,
            found: file_size,
        });
    }
    if file_size == 0 {
        // memmap cannot map empty files, and an empty file is no executable
        return Err(PatchError::InvalidFormat(format!("{} is empty", path.display())));
    }
    Ok(file_size)
}

/// Map a file read-only.
pub fn map_readonly<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Mmap> {
    let path = path.as_ref();
    let file = File::open(path)?;
    check_size(path, &file, limits)?;
    // Safety: read-only map of a regular file; the caller owns the file for
    // the duration of the analysis.
    Ok(unsafe { Mmap::map(&file)? })
}

/// A file mapped read-write for in-place patching.
///
/// Writes go straight to the mapping; `flush` makes them durable.
pub struct PatchTarget {
    path: PathBuf,
    mmap: MmapMut,
}

impl PatchTarget {
    /// Open and map `path` for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        check_size(path, &file, limits)?;
        // Safety: the working copy is private to this process while patching;
        // nothing else is expected to truncate it underneath the mapping.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Current file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// A seekable writer over the mapping; writes past the end fail.
    pub fn writer(&mut self) -> Cursor<&mut [u8]> {
        Cursor::new(&mut self.mmap[..])
    }

    pub fn flush(&self) -> Result<()> {
        self.mmap.flush()?;
        debug!(path = %self.path.display(), "Flushed patched file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content).unwrap();
        temp_file
    }

    #[test]
    fn map_readonly_successfully() {
        let file = create_temp_file(b"hello world");
        let map = map_readonly(file.path(), &IOLimits::default()).unwrap();
        assert_eq!(&map[..], b"hello world");
    }

    #[test]
    fn open_file_too_large() {
        let file = create_temp_file(&[0; 100]);
        let limits = IOLimits { max_file_size: 50 };
        assert!(matches!(
            map_readonly(file.path(), &limits),
            Err(PatchError::FileTooLarge { limit: 50, found: 100 })
        ));
        assert!(matches!(
            PatchTarget::open(file.path(), &limits),
            Err(PatchError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = create_temp_file(b"");
        assert!(matches!(
            map_readonly(file.path(), &IOLimits::default()),
            Err(PatchError::InvalidFormat(_))
        ));
    }

    #[test]
    fn writes_reach_the_file() {
        let file = create_temp_file(b"hello world");
        {
            let mut target = PatchTarget::open(file.path(), &IOLimits::default()).unwrap();
            let mut w = target.writer();
            w.seek(SeekFrom::Start(6)).unwrap();
            w.write_all(b"there").unwrap();
            assert_eq!(target.bytes(), b"hello there");
            target.flush().unwrap();
        }
        assert_eq!(std::fs::read(file.path()).unwrap(), b"hello there");
    }

    #[test]
    fn writes_past_end_fail() {
        let file = create_temp_file(b"abc");
        let mut target = PatchTarget::open(file.path(), &IOLimits::default()).unwrap();
        let mut w = target.writer();
        w.seek(SeekFrom::Start(2)).unwrap();
        assert!(w.write_all(b"xyz").is_err());
    }
}
