use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// The variables and working directory every launched child inherits.
///
/// The environment contains:
/// - `vars`: the exported variables, snapshotted from the process at startup and
///   afterwards changed only through `export`/`unset`.
/// - `current_dir`: the working directory children are started in, and the base
///   for relative redirection targets and wildcard patterns.
///
/// Children receive exactly `vars`, so a variable removed with `unset` stays hidden
/// even though the shell's own process environment is never rewritten.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of exported variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_dir(current_dir)
    }

    /// Snapshot the process variables but start in `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: stdenv::vars().collect(),
            current_dir: dir.into(),
        }
    }

    /// Get the value of an exported variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an exported variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Remove a variable. Returns whether it was set.
    pub fn remove_var(&mut self, key: &str) -> bool {
        self.vars.remove(key).is_some()
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
