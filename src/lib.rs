//! A small command interpreter.
//!
//! A line goes through a fixed chain of stages: [`lexer`] splits it into words honoring
//! double quotes, [`expand`] substitutes `$NAME`/`$?` and then `*`/`?` wildcards,
//! [`logic`] evaluates `&&`/`||` with short-circuiting, and each operand is handed to
//! [`pipeline`], which either dispatches a [`builtin`], connects two programs with a pipe,
//! or starts a single program through [`launcher`] with its redirections applied.
//!
//! All mutable state (variables, working directory, last exit status, the
//! running-command flag and background children) lives in a [`Session`].
//! The main entry point is [`Interpreter::execute_line`].

pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod expand;
pub mod external;
mod interpreter;
pub mod launcher;
pub mod lexer;
pub mod logging;
pub mod logic;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod signals;

pub use command::{ExitCode, Flow};
pub use interpreter::Interpreter;
pub use session::Session;
