//! Settings for the PHP runtime bootstrap.
//!
//! The bootstrap script that runs inside the function needs two things: the
//! Composer autoloader to `require` and the runtime class whose `run()` it
//! calls. Which variables feed them, and what the defaults are, is written down
//! here as data so the precedence is visible in one place.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::copy::FileSystem;

pub const AUTOLOAD_PATH_VAR: &str = "BREF_AUTOLOAD_PATH";
pub const TASK_ROOT_VAR: &str = "LAMBDA_TASK_ROOT";
pub const RUNTIME_CLASS_VAR: &str = "RUNTIME_CLASS";

pub const FPM_DEFAULT_AUTOLOAD_PATH: &str = "/var/vendor/autoload.php";
pub const FPM_DEFAULT_RUNTIME_CLASS: &str = "Bref\\FpmRuntime\\Main";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("Neither BREF_AUTOLOAD_PATH nor LAMBDA_TASK_ROOT is set, cannot locate the autoloader")]
    NoAutoloadSource,

    #[error("RUNTIME_CLASS is not set")]
    NoRuntimeClass,

    #[error("Autoloader not found at {}", .0.display())]
    AutoloadMissing(PathBuf),

    #[error(
        "Bref is not installed in your application (could not find the class \"{0}\" in Composer dependencies). Did you run \"composer require bref/bref\"?"
    )]
    RuntimeClassNotFound(String),
}

/// Which bootstrap flavour is being configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Function layers: the application ships its own vendor directory.
    Layer,
    /// The FPM image: vendor lives in `/var/vendor` unless told otherwise.
    Fpm,
}

/// Where a setting comes from, first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Value of a variable, used as-is.
    Var(&'static str),
    /// Value of a variable with a suffix appended.
    VarJoined(&'static str, &'static str),
    Default(&'static str),
}

impl Profile {
    /// Precedence for the autoloader path.
    pub fn autoload_sources(self) -> &'static [Source] {
        const LAYER: &[Source] = &[
            Source::Var(AUTOLOAD_PATH_VAR),
            Source::VarJoined(TASK_ROOT_VAR, "vendor/autoload.php"),
        ];
        const FPM: &[Source] = &[
            Source::Var(AUTOLOAD_PATH_VAR),
            Source::Default(FPM_DEFAULT_AUTOLOAD_PATH),
        ];
        match self {
            Profile::Layer => LAYER,
            Profile::Fpm => FPM,
        }
    }

    /// Precedence for the runtime class.
    pub fn runtime_class_sources(self) -> &'static [Source] {
        const LAYER: &[Source] = &[Source::Var(RUNTIME_CLASS_VAR)];
        const FPM: &[Source] = &[
            Source::Var(RUNTIME_CLASS_VAR),
            Source::Default(FPM_DEFAULT_RUNTIME_CLASS),
        ];
        match self {
            Profile::Layer => LAYER,
            Profile::Fpm => FPM,
        }
    }
}

/// Resolved bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub autoload_path: PathBuf,
    pub runtime_class: String,
}

impl BootstrapConfig {
    /// Resolve settings for `profile`, reading variables through `lookup`.
    ///
    /// Empty values count as unset. Pass `|name| std::env::var(name).ok()` to
    /// read the process environment.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::NoAutoloadSource`] if no autoloader source is set
    /// - [`BootstrapError::NoRuntimeClass`] if the profile has no default class and none is set
    pub fn resolve<F>(profile: Profile, lookup: F) -> Result<Self, BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let autoload_path = first_match(profile.autoload_sources(), &get)
            .map(PathBuf::from)
            .ok_or(BootstrapError::NoAutoloadSource)?;
        let runtime_class = first_match(profile.runtime_class_sources(), &get)
            .ok_or(BootstrapError::NoRuntimeClass)?;

        Ok(Self {
            autoload_path,
            runtime_class,
        })
    }

    /// Check that the autoloader is actually there.
    pub fn verify(&self, fs: &dyn FileSystem) -> Result<(), BootstrapError> {
        if fs.exists(&self.autoload_path) {
            Ok(())
        } else {
            Err(BootstrapError::AutoloadMissing(self.autoload_path.clone()))
        }
    }

    /// Error to raise when the runtime class is not loadable.
    pub fn runtime_not_installed(&self) -> BootstrapError {
        BootstrapError::RuntimeClassNotFound(self.runtime_class.clone())
    }
}

fn first_match(sources: &[Source], get: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    sources.iter().find_map(|source| match source {
        Source::Var(name) => get(name),
        Source::VarJoined(name, suffix) => {
            get(name).map(|root| Path::new(&root).join(suffix).to_string_lossy().into_owned())
        }
        Source::Default(value) => Some((*value).to_string()),
    })
}
