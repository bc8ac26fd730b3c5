//! Shared-library dependency listing using ldd.
//!
//! `ldd` works for both executables and shared objects on the host architecture.
//! On cross-platform builds it segfaults on executables (the host loader cannot
//! run them), so we fall back to `LD_TRACE_LOADED_OBJECTS=1 <binary>`, which makes
//! the binary's own loader print its dependencies. The trace trick does not work
//! for `.so` files, which is why `ldd` stays the primary strategy.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::runner::{ldd_invocation, loader_trace_invocation, ProcessRunner};

/// Text `ldd` prints as its last line when the inspected binary crashed with SIGSEGV.
///
/// This is matched as a substring; the exit status of `ldd` is not consulted.
pub const CRASH_SIGNATURE: &str = "exited with unknown exit code (139)";

const NOT_FOUND_SUFFIX: &str = " => not found";

/// Ways of asking the dynamic linker for a dependency listing, in the order tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStrategy {
    /// `ldd <target>`
    Ldd,
    /// Run the target with the loader trace variable set.
    LoaderTrace,
}

/// True when the last line of `ldd` output carries the crash signature.
pub fn is_loader_crash(output: &str) -> bool {
    output
        .trim_end()
        .lines()
        .last()
        .is_some_and(|line| line.contains(CRASH_SIGNATURE))
}

/// Raw introspection output, tagged with the strategy that produced it.
///
/// Runs `ldd` first and only switches to the loader trace if [`is_loader_crash`]
/// says so. The fallback runs at most once.
pub fn capture_listing(
    runner: &dyn ProcessRunner,
    config: &ResolverConfig,
    target: &Path,
) -> Result<(ListingStrategy, String)> {
    let output = runner.run(&ldd_invocation(&config.ldd_program, target))?;
    if !is_loader_crash(&output) {
        debug!(binary = %target.display(), "listed dependencies with {}", config.ldd_program);
        return Ok((ListingStrategy::Ldd, output));
    }

    warn!(
        binary = %target.display(),
        "{} crashed on the target, falling back to {}=1",
        config.ldd_program,
        config.trace_env_var
    );
    let output = runner.run(&loader_trace_invocation(&config.trace_env_var, target))?;
    if output.trim().is_empty() {
        return Err(Error::NoOutput(target.to_path_buf()));
    }
    Ok((ListingStrategy::LoaderTrace, output))
}

/// List the absolute paths of every shared library `target` needs at runtime.
///
/// # Errors
///
/// - [`Error::Spawn`] if the introspection tool cannot be started
/// - [`Error::NoOutput`] if the loader trace fallback printed nothing
/// - [`Error::DependencyMissing`] if any library is reported as `not found`
#[must_use = "library dependencies should be processed"]
pub fn list_dependencies(
    runner: &dyn ProcessRunner,
    config: &ResolverConfig,
    target: &Path,
) -> Result<Vec<PathBuf>> {
    let (_, output) = capture_listing(runner, config, target)?;
    parse_ldd_output(&output, target)
}

/// Parse ldd (or loader trace) output into dependency paths.
///
/// Example output:
/// ```text
///     linux-vdso.so.1 (0x00007ffd4c7f2000)
///     libxml2.so.2 => /opt/lib/libxml2.so.2 (0x00007f1c2a000000)
///     libc.so.6 => /lib64/libc.so.6 (0x00007f1c29c00000)
///     /lib64/ld-linux-x86-64.so.2 (0x00007f1c2a400000)
/// ```
///
/// Only `=> <path> (0x<hex>)` lines yield a dependency. The first line ending in
/// `=> not found` aborts the whole parse.
pub fn parse_ldd_output(output: &str, target: &Path) -> Result<Vec<PathBuf>> {
    let mut deps = Vec::new();

    for raw in output.lines() {
        let line = raw.trim_end();

        if line.ends_with(NOT_FOUND_SUFFIX) {
            let library = line[..line.len() - NOT_FOUND_SUFFIX.len()].trim().to_string();
            return Err(Error::DependencyMissing {
                library,
                target: target.to_path_buf(),
                line: line.to_string(),
            });
        }

        if let Some(path) = parse_resolved_path(line) {
            deps.push(PathBuf::from(path));
        }
    }

    Ok(deps)
}

/// Extract `<path>` from `... => <path> (0x<hex>)...`.
///
/// The path runs up to the last well-formed address group on the line.
fn parse_resolved_path(line: &str) -> Option<&str> {
    let start = line.find("=> ")? + 3;
    let rest = &line[start..];

    rest.match_indices(" (0x")
        .map(|(idx, _)| idx)
        .filter(|&idx| is_address_group(&rest[idx + 4..]))
        .last()
        .map(|idx| &rest[..idx])
}

/// `<hex digits>)` at the start of `s`, at least one digit.
fn is_address_group(s: &str) -> bool {
    let digits = s
        .bytes()
        .take_while(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
        .count();
    digits > 0 && s.as_bytes().get(digits) == Some(&b')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Invocation;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned outputs in order and records every invocation.
    struct ScriptedRunner {
        outputs: RefCell<VecDeque<String>>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        fn new(outputs: &[&str]) -> Self {
            Self {
                outputs: RefCell::new(outputs.iter().map(|s| s.to_string()).collect()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> Result<String> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(self.outputs.borrow_mut().pop_front().unwrap_or_default())
        }
    }

    const LDD_OUTPUT: &str = "\
\tlinux-vdso.so.1 (0x00007ffd4c7f2000)
\tlibxml2.so.2 => /opt/lib/libxml2.so.2 (0x00007f1c2a000000)
\tlibc.so.6 => /lib64/libc.so.6 (0x00007f1c29c00000)
\t/lib64/ld-linux-x86-64.so.2 (0x00007f1c2a400000)
";

    #[test]
    fn test_parse_ldd_output() {
        let deps = parse_ldd_output(LDD_OUTPUT, Path::new("/opt/bin/php")).unwrap();
        assert_eq!(
            deps,
            vec![
                PathBuf::from("/opt/lib/libxml2.so.2"),
                PathBuf::from("/lib64/libc.so.6"),
            ]
        );
    }

    #[test]
    fn test_parse_statically_linked() {
        let deps = parse_ldd_output("\tstatically linked\n", Path::new("/bin/busybox")).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_parse_requires_hex_address() {
        let output = "libc.so.6 => /lib/libc.so.6 (0x00007f...)\n";
        let deps = parse_ldd_output(output, Path::new("/opt/bin/php")).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_parse_path_is_greedy() {
        let output = "libweird.so => /opt/lib (0x1)/libweird.so (0x00007f0000000000)\n";
        let deps = parse_ldd_output(output, Path::new("/opt/bin/php")).unwrap();
        assert_eq!(deps, vec![PathBuf::from("/opt/lib (0x1)/libweird.so")]);
    }

    #[test]
    fn test_parse_not_found() {
        let output = "\
\tlibc.so.6 => /lib64/libc.so.6 (0x00007f1c29c00000)
\tlibbar.so => not found
\tlibz.so.1 => /lib64/libz.so.1 (0x00007f1c29a00000)
";
        let err = parse_ldd_output(output, Path::new("/opt/bin/php")).unwrap_err();
        match &err {
            Error::DependencyMissing { library, target, .. } => {
                assert_eq!(library, "libbar.so");
                assert_eq!(target, Path::new("/opt/bin/php"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("libbar.so"));
    }

    #[test]
    fn test_not_found_ignores_trailing_whitespace() {
        let err = parse_ldd_output("libbar.so => not found  \r\n", Path::new("/x")).unwrap_err();
        assert!(matches!(err, Error::DependencyMissing { .. }));
    }

    #[test]
    fn test_is_loader_crash_pins_substring() {
        assert!(is_loader_crash(
            "\tlibc.so.6 => /lib/libc.so.6 (0x1)\nldd: exited with unknown exit code (139)\n"
        ));
        // Only the last line counts
        assert!(!is_loader_crash(
            "ldd: exited with unknown exit code (139)\n\tlibc.so.6 => /lib/libc.so.6 (0x1)\n"
        ));
        // Other exit codes are not the crash signature
        assert!(!is_loader_crash("ldd: exited with unknown exit code (134)"));
        assert!(!is_loader_crash(""));
    }

    #[test]
    fn test_capture_uses_ldd_when_it_works() {
        let runner = ScriptedRunner::new(&[LDD_OUTPUT]);
        let config = ResolverConfig::default();

        let (strategy, output) =
            capture_listing(&runner, &config, Path::new("/opt/bin/php")).unwrap();

        assert_eq!(strategy, ListingStrategy::Ldd);
        assert_eq!(output, LDD_OUTPUT);
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, PathBuf::from("ldd"));
    }

    #[test]
    fn test_capture_falls_back_once_on_crash() {
        let runner = ScriptedRunner::new(&[
            "ldd: exited with unknown exit code (139)\n",
            LDD_OUTPUT,
        ]);
        let config = ResolverConfig::default();

        let (strategy, output) =
            capture_listing(&runner, &config, Path::new("/opt/bin/php")).unwrap();

        assert_eq!(strategy, ListingStrategy::LoaderTrace);
        assert_eq!(output, LDD_OUTPUT);
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].program, PathBuf::from("/opt/bin/php"));
        assert_eq!(
            calls[1].env,
            vec![("LD_TRACE_LOADED_OBJECTS".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_capture_fallback_without_output() {
        let runner = ScriptedRunner::new(&["ldd: exited with unknown exit code (139)", "  \n"]);
        let config = ResolverConfig::default();

        let err = capture_listing(&runner, &config, Path::new("/opt/bin/php")).unwrap_err();

        assert!(matches!(err, Error::NoOutput(ref p) if p == Path::new("/opt/bin/php")));
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn test_not_found_through_loader_trace() {
        let runner = ScriptedRunner::new(&[
            "ldd: exited with unknown exit code (139)\n",
            "\tlibc.so.6 => /lib64/libc.so.6 (0x00007f1c29c00000)\n\tlibbar.so => not found\n",
        ]);

        let err = list_dependencies(&runner, &ResolverConfig::default(), Path::new("/opt/bin/php"))
            .unwrap_err();

        match err {
            Error::DependencyMissing { library, .. } => assert_eq!(library, "libbar.so"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn test_list_dependencies_after_fallback() {
        let runner = ScriptedRunner::new(&[
            "ldd: exited with unknown exit code (139)\n",
            "\tlibonig.so.5 => /opt/lib/libonig.so.5 (0x00007f0000001000)\n",
        ]);
        let deps = list_dependencies(&runner, &ResolverConfig::default(), Path::new("/opt/bin/php"))
            .unwrap();
        assert_eq!(deps, vec![PathBuf::from("/opt/lib/libonig.so.5")]);
    }
}
