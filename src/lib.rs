//! Shared-library bundling for PHP binaries and extensions.
//!
//! Lists what a binary or `.so` needs with `ldd` (falling back to the loader
//! trace when `ldd` crashes on cross-platform binaries), drops what the
//! execution environment already provides, and copies the rest next to it.

mod analyze;
mod copy;
mod filter;
mod paths;
mod resolver;
mod runner;

pub mod bootstrap;
pub mod config;
pub mod error;

pub use analyze::{
    capture_listing, is_loader_crash, list_dependencies, parse_ldd_output, ListingStrategy,
    CRASH_SIGNATURE,
};
pub use config::ResolverConfig;
pub use copy::{copy_all, ensure_dir, FileSystem, HostFs};
pub use error::{Error, Result};
pub use filter::{filter, BaselineLibrarySet, CopyPlan};
pub use paths::{basename, has_reserved_prefix, manifest_path, utility_dir};
pub use resolver::{Report, Resolver};
pub use runner::{
    ldd_invocation, loader_trace_invocation, HostRunner, Invocation, ProcessRunner,
};
