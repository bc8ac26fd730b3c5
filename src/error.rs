//! Error types for dependency resolution and copying.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a resolve-and-copy run.
///
/// None of these are recovered internally: the first one raised ends the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("File does not exist: {}", .0.display())]
    TargetMissing(PathBuf),

    #[error("Could not run '{program}' - is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "{library} is a dependency of {} but cannot be found by 'ldd':\n{line}",
        .target.display()
    )]
    DependencyMissing {
        library: String,
        target: PathBuf,
        line: String,
    },

    #[error("Could not list dependencies for {}", .0.display())]
    NoOutput(PathBuf),

    #[error("Failed to read library manifest {}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not copy {} to {}", .source_path.display(), .destination.display())]
    CopyFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
