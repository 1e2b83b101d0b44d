use crate::command::ExitCode;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Translate a child's [`ExitStatus`] into the value stored for `$?`.
pub fn status_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a command name to the program that should be executed.
///
/// Behavior:
/// - Absolute path: returned if it names an existing file.
/// - Any path containing a separator (`bin/sh`, `./foo`): resolved against `cwd`
///   and returned if it names an existing file.
/// - Single component: each directory in `search_paths` (PATH) is searched in order;
///   relative PATH entries are taken relative to `cwd`.
/// - Empty name: `None`.
pub fn find_command_path(search_paths: &OsStr, cwd: &Path, name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return find_by_path(name);
    }

    let mut components = name.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, cwd, x.as_os_str()),
        _ => find_by_path(&cwd.join(name)),
    }
}

fn find_in_path(search_paths: &OsStr, cwd: &Path, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| cwd.join(dir).join(cmd))
        .find_map(|path| find_by_path(&path))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}
