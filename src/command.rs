/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal are reported as `128 + signal`, the way
/// POSIX shells expose them through `$?`.
pub type ExitCode = i32;

/// What the read-eval loop should do after a line has been executed.
///
/// This is deliberately separate from [`ExitCode`]: only the `exit` builtin
/// produces [`Flow::Stop`], a failing child never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading lines.
    Continue,
    /// Leave the read-eval loop.
    Stop,
}

impl Flow {
    pub fn is_continue(self) -> bool {
        self == Flow::Continue
    }
}
