//! Path helpers shared by the filter and the copier.

use std::path::{Path, PathBuf};

/// Final path component as a string, or the whole path if it has none.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Textual prefix test, so `/opt/lib` matches `/opt/lib64/libfoo.so` as well.
pub fn has_reserved_prefix(path: &Path, prefix: &str) -> bool {
    path.to_string_lossy().starts_with(prefix)
}

/// Resolve the baseline manifest relative to the directory holding the utility.
///
/// Absolute manifest paths are returned unchanged.
#[must_use = "resolved manifest path should be used"]
pub fn manifest_path(utility_dir: &Path, manifest: &Path) -> PathBuf {
    utility_dir.join(manifest)
}

/// Directory containing the running executable.
pub fn utility_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
