//! The end-to-end run: list, filter, copy.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::analyze::list_dependencies;
use crate::config::ResolverConfig;
use crate::copy::{copy_all, FileSystem, HostFs};
use crate::error::{Error, Result};
use crate::filter::{filter, BaselineLibrarySet, CopyPlan};
use crate::runner::{HostRunner, ProcessRunner};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub plan: CopyPlan,
    pub copied: Vec<PathBuf>,
}

/// Wires the lister, filter and copier to a process runner and a filesystem.
pub struct Resolver<'a> {
    runner: &'a dyn ProcessRunner,
    fs: &'a dyn FileSystem,
    config: ResolverConfig,
}

impl Resolver<'static> {
    /// Resolver backed by the host's processes and filesystem.
    pub fn host(config: ResolverConfig) -> Self {
        Self::new(&HostRunner, &HostFs, config)
    }
}

impl<'a> Resolver<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        fs: &'a dyn FileSystem,
        config: ResolverConfig,
    ) -> Self {
        Self { runner, fs, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if the manifest cannot be read.
    pub fn load_baseline(&self, manifest: &Path) -> Result<BaselineLibrarySet> {
        BaselineLibrarySet::load(self.fs, manifest)
    }

    /// Dependencies of `target` that are not already provided by `baseline`.
    ///
    /// Nothing is written to disk.
    ///
    /// # Errors
    ///
    /// - [`Error::TargetMissing`] if `target` does not exist
    /// - any error from [`list_dependencies`]
    pub fn plan(&self, target: &Path, baseline: &BaselineLibrarySet) -> Result<CopyPlan> {
        // Check file exists first for a clear error message
        if !self.fs.exists(target) {
            return Err(Error::TargetMissing(target.to_path_buf()));
        }

        let deps = list_dependencies(self.runner, &self.config, target)?;
        debug!(binary = %target.display(), count = deps.len(), "found dependencies");

        Ok(filter(&deps, baseline, &self.config.reserved_prefix))
    }

    /// Plan, then copy everything in the plan to `target_dir`.
    ///
    /// # Errors
    ///
    /// Everything [`Resolver::plan`] returns, plus [`Error::CreateDir`] and
    /// [`Error::CopyFailed`] from the copy step.
    pub fn run(
        &self,
        target: &Path,
        target_dir: &Path,
        baseline: &BaselineLibrarySet,
    ) -> Result<Report> {
        let plan = self.plan(target, baseline)?;
        let copied = copy_all(self.fs, &plan, target_dir, self.config.dir_mode)?;
        Ok(Report { plan, copied })
    }
}
