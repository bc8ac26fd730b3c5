//! Resolver settings.

/// Libraries we compiled ourselves live under this prefix (`/opt/lib`, `/opt/lib64`).
/// They are newer than what the execution environment ships, so they are always bundled.
pub const DEFAULT_RESERVED_PREFIX: &str = "/opt/lib";

pub const DEFAULT_LDD_PROGRAM: &str = "ldd";

/// Makes the glibc loader print the resolved libraries instead of running the program.
pub const DEFAULT_TRACE_ENV_VAR: &str = "LD_TRACE_LOADED_OBJECTS";

/// Tunables for a resolve-and-copy run.
///
/// Every field has a default; the CLI may override some of them, nothing here
/// is read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Dynamic-linker introspection tool for the primary listing strategy.
    pub ldd_program: String,
    /// Variable set to `1` when falling back to the loader trace.
    pub trace_env_var: String,
    /// Dependencies whose path starts with this are copied even if the baseline has them.
    pub reserved_prefix: String,
    /// Mode used when creating the target directory.
    pub dir_mode: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ldd_program: DEFAULT_LDD_PROGRAM.to_string(),
            trace_env_var: DEFAULT_TRACE_ENV_VAR.to_string(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            dir_mode: 0o777,
        }
    }
}

impl ResolverConfig {
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    pub fn with_ldd_program(mut self, program: impl Into<String>) -> Self {
        self.ldd_program = program.into();
        self
    }
}
