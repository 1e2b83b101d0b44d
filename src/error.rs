use thiserror::Error;

/// Malformed command lines. These are reported to the user and the line
/// is abandoned; they never terminate the shell.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    /// `>`, `>>` or `<` was the last token of the command.
    #[error("expected argument to \"{0}\"")]
    MissingRedirectTarget(String),
    /// `cmd |` with nothing after the pipe.
    #[error("pipe missing second command")]
    MissingPipeCommand,
    /// `| cmd` with nothing before the pipe.
    #[error("pipe missing first command")]
    MissingPipeSource,
    /// More than one `|` in a single segment.
    #[error("only two-command pipelines are supported")]
    ExtraPipe,
    /// A trailing `&` after a pipeline.
    #[error("pipelines cannot be run in the background")]
    BackgroundPipeline,
}
