//! Deciding which dependencies must be bundled.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::copy::FileSystem;
use crate::error::{Error, Result};
use crate::paths::{basename, has_reserved_prefix};

/// Library basenames already present in the execution environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaselineLibrarySet {
    names: HashSet<String>,
}

impl BaselineLibrarySet {
    /// One basename per line. Lines are trimmed, blank lines ignored.
    pub fn parse(manifest: &str) -> Self {
        manifest
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if the file cannot be read.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let text = fs.read_to_string(path).map_err(|source| Error::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Exact string match on the basename.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for BaselineLibrarySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Libraries to copy, in dependency order, plus the ones skipped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPlan {
    pub libraries: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl CopyPlan {
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.libraries.iter()
    }
}

/// Keep a dependency unless the environment already ships it.
///
/// Anything under `reserved_prefix` is kept regardless: those are libraries we
/// compiled because the environment's copies are too old.
pub fn filter(
    dependencies: &[PathBuf],
    baseline: &BaselineLibrarySet,
    reserved_prefix: &str,
) -> CopyPlan {
    let mut plan = CopyPlan::default();

    for lib in dependencies {
        let is_reserved = has_reserved_prefix(lib, reserved_prefix);
        let is_known_baseline = baseline.contains(&basename(lib));

        if is_reserved || !is_known_baseline {
            plan.libraries.push(lib.clone());
        } else {
            info!("Skipping {} because it's already in the environment", lib.display());
            plan.skipped.push(lib.clone());
        }
    }

    plan
}
