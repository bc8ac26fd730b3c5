//! External process execution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// A single external command: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Runs external commands and hands back their combined output.
///
/// The exit status is deliberately not part of the contract: callers decide
/// from the text alone, the same way a shell `2>&1` capture would.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<String>;
}

/// Runs commands on the host with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HostRunner;

impl ProcessRunner for HostRunner {
    fn run(&self, invocation: &Invocation) -> Result<String> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|source| Error::Spawn {
                program: invocation.program_name(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        Ok(text)
    }
}

/// `ldd <target>`
pub fn ldd_invocation(ldd_program: &str, target: &Path) -> Invocation {
    Invocation::new(ldd_program).arg(target)
}

/// `<VAR>=1 <target>`
pub fn loader_trace_invocation(trace_env_var: &str, target: &Path) -> Invocation {
    Invocation::new(target).env(trace_env_var, "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ldd_invocation() {
        let inv = ldd_invocation("ldd", Path::new("/opt/bin/php"));
        assert_eq!(inv.program, PathBuf::from("ldd"));
        assert_eq!(inv.args, vec![OsString::from("/opt/bin/php")]);
        assert!(inv.env.is_empty());
    }

    #[test]
    fn test_loader_trace_invocation() {
        let inv = loader_trace_invocation("LD_TRACE_LOADED_OBJECTS", Path::new("/opt/bin/php"));
        assert_eq!(inv.program, PathBuf::from("/opt/bin/php"));
        assert!(inv.args.is_empty());
        assert_eq!(
            inv.env,
            vec![("LD_TRACE_LOADED_OBJECTS".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_host_runner_merges_stdout_and_stderr() {
        let inv = Invocation::new("sh")
            .arg("-c")
            .arg("echo out; echo err 1>&2");
        let output = HostRunner.run(&inv).unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[test]
    fn test_host_runner_passes_env() {
        let inv = Invocation::new("sh")
            .arg("-c")
            .arg("echo $COPY_DEPS_TEST")
            .env("COPY_DEPS_TEST", "1");
        assert_eq!(HostRunner.run(&inv).unwrap(), "1\n");
    }

    #[test]
    fn test_host_runner_missing_program() {
        let inv = Invocation::new("/nonexistent/introspection-tool");
        let err = HostRunner.run(&inv).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/introspection-tool"));
    }
}
