//! The interactive prompt.

use crate::env::Environment;
use std::fs;
use std::process::Command;

/// Prompt used when the working directory cannot be shown.
pub const FALLBACK: &str = "> ";

/// Name of this machine.
///
/// Taken from `HOSTNAME` or `HOST` when exported, then from the kernel, then from the
/// `hostname` program. Falls back to `localhost`.
pub fn hostname(env: &Environment) -> String {
    env.get_var("HOSTNAME")
        .or_else(|| env.get_var("HOST"))
        .map(str::to_owned)
        .filter(|h| !h.trim().is_empty())
        .or_else(|| fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .or_else(|| {
            Command::new("hostname")
                .output()
                .ok()
                .filter(|output| output.status.success())
                .and_then(|output| String::from_utf8(output.stdout).ok())
        })
        .map(|h| h.trim().to_owned())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}

/// `user@host:cwd$ ` with the user and host in green and the directory in blue.
///
/// `USER` defaults to `user`. A working directory that no longer exists gives [`FALLBACK`].
pub fn render(env: &Environment, host: &str) -> String {
    if !env.current_dir.is_dir() {
        return FALLBACK.to_owned();
    }
    let user = env.get_var("USER").unwrap_or("user");
    format!(
        "\x1b[1;32m{}@{}\x1b[0m:\x1b[1;34m{}\x1b[0m$ ",
        user,
        host,
        env.current_dir.display()
    )
}
