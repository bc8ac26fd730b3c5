//! Copies the system dependencies used by a binary/extension.
//!
//! ```text
//! copy-dependencies /opt/bin/php /opt/lib libs-x86.txt
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use copy_dependencies::{
    config::DEFAULT_LDD_PROGRAM, config::DEFAULT_RESERVED_PREFIX, manifest_path, utility_dir,
    BaselineLibrarySet, Resolver, ResolverConfig,
};

/// Copy the shared libraries a binary or extension needs into a directory
#[derive(Parser, Debug)]
#[command(name = "copy-dependencies", version, about, long_about = None)]
struct Cli {
    /// Binary or shared library to analyze (e.g. /opt/bin/php)
    #[arg(value_parser = clap::builder::ValueParser::os_string())]
    target: Option<OsString>,

    /// Directory the libraries are copied into (e.g. /opt/lib)
    #[arg(value_parser = clap::builder::ValueParser::os_string())]
    target_directory: Option<OsString>,

    /// Libraries already present in the environment, one per line.
    /// Relative paths are resolved next to this executable.
    libraries_manifest: Option<PathBuf>,

    /// Libraries under this prefix are always copied
    #[arg(long, default_value = DEFAULT_RESERVED_PREFIX)]
    reserved_prefix: String,

    /// Dynamic linker introspection tool
    #[arg(long, default_value = DEFAULT_LDD_PROGRAM)]
    ldd: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// An empty positional counts as missing.
fn non_empty(arg: Option<OsString>) -> Option<PathBuf> {
    arg.filter(|value| !value.is_empty()).map(PathBuf::from)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let Some(target) = non_empty(cli.target) else {
        println!("Missing the first argument, check the file to see how to use it");
        return Ok(ExitCode::from(1));
    };
    let Some(target_dir) = non_empty(cli.target_directory) else {
        println!("Missing the second argument, check the file to see how to use it");
        return Ok(ExitCode::from(1));
    };

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("copy_dependencies={}", log_level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .without_time(),
        )
        .init();

    let config = ResolverConfig::default()
        .with_reserved_prefix(cli.reserved_prefix)
        .with_ldd_program(cli.ldd);
    let resolver = Resolver::host(config);
    debug!(
        ldd = %resolver.config().ldd_program,
        reserved_prefix = %resolver.config().reserved_prefix,
        "resolver configured"
    );

    let baseline = match &cli.libraries_manifest {
        Some(manifest) => {
            let dir = utility_dir().context("Failed to locate the running executable")?;
            resolver.load_baseline(&manifest_path(&dir, manifest))?
        }
        None => BaselineLibrarySet::default(),
    };

    let report = resolver
        .run(&target, &target_dir, &baseline)
        .with_context(|| format!("Failed to copy dependencies of {}", target.display()))?;

    info!(
        copied = report.copied.len(),
        skipped = report.plan.skipped.len(),
        "done"
    );
    Ok(ExitCode::SUCCESS)
}
