//! Moving snapshot content between the working copy and the snapshot store.
//!
//! [`move_or_copy`] tries a rename first and falls back to copy-then-delete.
//! Filesystem access goes through [`FileSystem`] so tests can force either
//! branch without a real device boundary.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Filesystem primitives used when moving content.
pub trait FileSystem: Send + Sync {
    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy the bytes of `from` to `to`, replacing `to` if it exists.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

/// How [`move_or_copy`] ended.
#[derive(Debug)]
pub enum MoveOutcome {
    /// The rename succeeded.
    Moved,
    /// The rename failed; the bytes were copied and the source removed.
    CopiedFallback,
    /// Neither strategy worked. The source still holds the bytes.
    Failed(io::Error),
}

impl MoveOutcome {
    /// Whether the bytes now live at the destination only.
    pub fn is_success(&self) -> bool {
        !matches!(self, MoveOutcome::Failed(_))
    }
}

/// Move `src` to `dst`, falling back to copy-then-delete.
///
/// On every outcome exactly one of `src` and `dst` holds the bytes: a copy
/// whose source cannot be removed is removed again and reported as
/// [`MoveOutcome::Failed`].
pub fn move_or_copy(fs: &dyn FileSystem, src: &Path, dst: &Path) -> MoveOutcome {
    let rename_err = match fs.rename(src, dst) {
        Ok(()) => return MoveOutcome::Moved,
        Err(e) => e,
    };
    debug!(
        "Rename {} -> {} failed ({}), copying instead",
        src.display(),
        dst.display(),
        rename_err
    );

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs.create_dir_all(parent) {
            return MoveOutcome::Failed(e);
        }
    }

    if let Err(e) = fs.copy(src, dst) {
        return MoveOutcome::Failed(e);
    }

    if let Err(e) = fs.remove_file(src) {
        warn!(
            "Copied {} but could not remove it ({}), undoing the copy",
            src.display(),
            e
        );
        if let Err(undo) = fs.remove_file(dst) {
            warn!("Could not remove copy {}: {}", dst.display(), undo);
        }
        return MoveOutcome::Failed(e);
    }

    MoveOutcome::CopiedFallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Delegates to `std::fs` but can refuse renames, copies or removals.
    #[derive(Default)]
    struct FlakyFs {
        refuse_rename: bool,
        refuse_copy: bool,
        refuse_remove: Option<PathBuf>,
    }

    fn refused() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "refused")
    }

    impl FileSystem for FlakyFs {
        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.refuse_rename {
                return Err(refused());
            }
            StdFileSystem.rename(from, to)
        }

        fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.refuse_copy {
                return Err(refused());
            }
            StdFileSystem.copy(from, to)
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            if self.refuse_remove.as_deref() == Some(path) {
                return Err(refused());
            }
            StdFileSystem.remove_file(path)
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            StdFileSystem.create_dir_all(path)
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("nested").join("dst.txt");
        fs::write(&src, "A").unwrap();
        (temp, src, dst)
    }

    #[test]
    fn rename_wins_when_possible() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        fs::write(&src, "A").unwrap();

        let outcome = move_or_copy(&StdFileSystem, &src, &dst);

        assert!(matches!(outcome, MoveOutcome::Moved));
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "A");
    }

    #[test]
    fn copy_fallback_creates_parents() {
        let (_temp, src, dst) = setup();
        let fs_impl = FlakyFs {
            refuse_rename: true,
            ..Default::default()
        };

        let outcome = move_or_copy(&fs_impl, &src, &dst);

        assert!(matches!(outcome, MoveOutcome::CopiedFallback));
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "A");
    }

    #[test]
    fn failed_copy_keeps_source() {
        let (_temp, src, dst) = setup();
        let fs_impl = FlakyFs {
            refuse_rename: true,
            refuse_copy: true,
            ..Default::default()
        };

        let outcome = move_or_copy(&fs_impl, &src, &dst);

        assert!(!outcome.is_success());
        assert_eq!(fs::read_to_string(&src).unwrap(), "A");
        assert!(!dst.exists());
    }

    #[test]
    fn undeletable_source_undoes_the_copy() {
        let (_temp, src, dst) = setup();
        let fs_impl = FlakyFs {
            refuse_rename: true,
            refuse_remove: Some(src.clone()),
            ..Default::default()
        };

        let outcome = move_or_copy(&fs_impl, &src, &dst);

        assert!(matches!(outcome, MoveOutcome::Failed(_)));
        assert!(src.exists());
        assert!(!dst.exists());
    }

    #[test]
    fn missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let outcome = move_or_copy(
            &StdFileSystem,
            &temp.path().join("absent"),
            &temp.path().join("dst"),
        );
        assert!(matches!(outcome, MoveOutcome::Failed(_)));
    }
}
