//! Mutable state shared by every stage of line execution.

use crate::command::ExitCode;
use crate::env::Environment;
use crate::external::status_code;
use std::process::Child;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A background child collected by [`Session::reap_background`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaped {
    pub pid: u32,
    pub status: ExitCode,
}

/// The shell-session context passed to the tokenizer-to-launcher chain.
///
/// `last_status` is written only after a foreground command or the terminal
/// stage of a pipeline has been waited for. `running` is true exactly while
/// the shell is blocked on a foreground child; it is shared with the interrupt
/// handler, which is why it is an atomic behind an `Arc`.
#[derive(Debug)]
pub struct Session {
    pub env: Environment,
    last_status: ExitCode,
    running: Arc<AtomicBool>,
    background: Vec<Child>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_env(Environment::new())
    }

    pub fn with_env(env: Environment) -> Self {
        Self {
            env,
            last_status: 0,
            running: Arc::new(AtomicBool::new(false)),
            background: Vec::new(),
        }
    }

    /// Exit status of the most recently completed foreground command.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    pub(crate) fn set_last_status(&mut self, status: ExitCode) {
        log::debug!("exit status {} -> {}", self.last_status, status);
        self.last_status = status;
    }

    /// A handle on the Running-Command Flag, for the interrupt handler.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn track_background(&mut self, child: Child) {
        self.background.push(child);
    }

    /// Number of background children not reaped yet.
    pub fn background_count(&self) -> usize {
        self.background.len()
    }

    /// Collect every background child that has terminated, without blocking.
    ///
    /// Children that are still running stay tracked. A child whose status can
    /// no longer be queried is dropped from the list with a warning.
    pub fn reap_background(&mut self) -> Vec<Reaped> {
        let mut reaped = Vec::new();
        self.background.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                reaped.push(Reaped {
                    pid: child.id(),
                    status: status_code(status),
                });
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::warn!("failed to poll background process {}: {}", child.id(), e);
                false
            }
        });
        for r in &reaped {
            log::debug!("reaped background pid {} with status {}", r.pid, r.status);
        }
        reaped
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
