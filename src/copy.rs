//! Copying the planned libraries into the target directory.

use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::filter::CopyPlan;
use crate::paths::basename;

/// The filesystem operations the resolver needs.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;
    /// Byte-for-byte copy. Returns the number of bytes written.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl FileSystem for HostFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Create `dir` and any missing parents if it is not already a directory.
///
/// # Errors
///
/// Returns [`Error::CreateDir`] if the directory cannot be created.
pub fn ensure_dir(fs: &dyn FileSystem, dir: &Path, mode: u32) -> Result<()> {
    if fs.is_dir(dir) {
        return Ok(());
    }
    fs.create_dir_all(dir, mode).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Copy every library in `plan` to `target_dir/<basename>`.
///
/// Stops at the first failure. Files copied before it are left in place.
/// Returns the destination paths in plan order.
///
/// # Errors
///
/// - [`Error::CreateDir`] if `target_dir` cannot be created
/// - [`Error::CopyFailed`] for the first library that cannot be copied
pub fn copy_all(
    fs: &dyn FileSystem,
    plan: &CopyPlan,
    target_dir: &Path,
    dir_mode: u32,
) -> Result<Vec<PathBuf>> {
    ensure_dir(fs, target_dir, dir_mode)?;

    let mut copied = Vec::with_capacity(plan.len());
    for library in plan.iter() {
        let destination = target_dir.join(basename(library));

        info!("Copying {} to {}", library.display(), destination.display());

        fs.copy(library, &destination)
            .map_err(|source| Error::CopyFailed {
                source_path: library.clone(),
                destination: destination.clone(),
                source,
            })?;
        copied.push(destination);
    }

    Ok(copied)
}
