//! Working copies of the executable.
//!
//! The source executable is never modified. It is copied to the destination
//! first and every patch step runs on the copy.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Copy `src` to `dest` and run `f` on `dest`.
///
/// If `f` fails and `cleanup` is set, `dest` is removed. The error from `f`
/// is returned either way; a failure to remove is only logged.
pub fn with_source_copy<T, F>(src: &Path, dest: &Path, cleanup: bool, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    info!(src = %src.display(), dest = %dest.display(), "Copying source file...");
    if let Err(e) = fs::copy(src, dest) {
        info!("Failed.");
        return Err(e.into());
    }
    info!("Success.");

    match f(dest) {
        Ok(value) => Ok(value),
        Err(err) => {
            if cleanup {
                info!(dest = %dest.display(), "Removing patched file");
                if let Err(e) = fs::remove_file(dest) {
                    warn!(error = %e, dest = %dest.display(), "Could not remove patched file");
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatchError;
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("game.exe");
        let dest = dir.path().join("game_patched.exe");
        fs::write(&src, b"MZ original").unwrap();
        (dir, src, dest)
    }

    #[test]
    fn copy_then_run() {
        let (_dir, src, dest) = setup();
        let len = with_source_copy(&src, &dest, true, |p| {
            fs::write(p, b"MZ patched!")?;
            Ok(fs::metadata(p)?.len())
        })
        .unwrap();
        assert_eq!(len, 11);
        assert_eq!(fs::read(&src).unwrap(), b"MZ original");
        assert_eq!(fs::read(&dest).unwrap(), b"MZ patched!");
    }

    #[test]
    fn failure_with_cleanup_removes_copy() {
        let (_dir, src, dest) = setup();
        let res: Result<()> = with_source_copy(&src, &dest, true, |_| {
            Err(PatchError::InvalidInput("boom".into()))
        });
        assert!(matches!(res, Err(PatchError::InvalidInput(_))));
        assert!(!dest.exists());
        assert!(src.exists());
    }

    #[test]
    fn failure_without_cleanup_keeps_copy() {
        let (_dir, src, dest) = setup();
        let res: Result<()> = with_source_copy(&src, &dest, false, |_| {
            Err(PatchError::InvalidInput("boom".into()))
        });
        assert!(res.is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"MZ original");
    }

    #[test]
    fn missing_source_is_io_error() {
        let (dir, _src, dest) = setup();
        let res = with_source_copy(&dir.path().join("nope.exe"), &dest, true, |_| Ok(()));
        assert!(matches!(res, Err(PatchError::Io(_))));
    }
}
