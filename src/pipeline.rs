//! Pipeline detection and the two-command pipe.

use crate::builtin::Builtin;
use crate::command::{ExitCode, Flow};
use crate::error::SyntaxError;
use crate::launcher::{self, CommandLine, REDIRECT_FAILED, SpawnError, Streams};
use crate::session::Session;
use std::process::{Child, Stdio};

/// A single logical segment after looking for `|`.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Simple(Vec<String>),
    Pipe(Vec<String>, Vec<String>),
}

fn split_pipe(mut tokens: Vec<String>) -> Result<Segment, SyntaxError> {
    let Some(pos) = tokens.iter().position(|t| t == "|") else {
        return Ok(Segment::Simple(tokens));
    };
    let right = tokens.split_off(pos + 1);
    tokens.pop();
    let left = tokens;

    if right.is_empty() {
        return Err(SyntaxError::MissingPipeCommand);
    }
    if left.is_empty() {
        return Err(SyntaxError::MissingPipeSource);
    }
    if right.iter().any(|t| t == "|") {
        return Err(SyntaxError::ExtraPipe);
    }
    if right.last().is_some_and(|t| t == "&") {
        return Err(SyntaxError::BackgroundPipeline);
    }
    Ok(Segment::Pipe(left, right))
}

/// Execute one segment of a line: a two-command pipeline, a builtin or a single program.
///
/// Builtins are only recognised outside pipelines; inside a pipe leg `cd` and friends
/// are looked up as ordinary programs.
pub fn run(tokens: Vec<String>, session: &mut Session) -> Flow {
    if tokens.is_empty() {
        return Flow::Continue;
    }
    match split_pipe(tokens) {
        Ok(Segment::Pipe(left, right)) => {
            run_pipe(left, right, session);
            Flow::Continue
        }
        Ok(Segment::Simple(tokens)) => match Builtin::lookup(&tokens[0]) {
            Some(builtin) => builtin.run(&tokens[1..], session, &mut std::io::stdout()),
            None => launcher::launch(tokens, session),
        },
        Err(e) => {
            eprintln!("tinysh: {}", e);
            Flow::Continue
        }
    }
}

/// Connect `left`'s standard output to `right`'s standard input and wait for both.
///
/// The status of the right-hand command becomes the exit status. A left command that
/// cannot be started leaves the right one reading an empty stream.
fn run_pipe(left: Vec<String>, right: Vec<String>, session: &mut Session) {
    let (left, right) = match (CommandLine::parse(left), CommandLine::parse(right)) {
        (Ok(left), Ok(right)) => (left, right),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("tinysh: {}", e);
            session.set_last_status(REDIRECT_FAILED);
            return;
        }
    };
    log::debug!("pipeline {:?} | {:?}", left.argv, right.argv);

    session.set_running(true);

    let mut producer = match start_producer(&left, session) {
        Ok(child) => Some(child),
        Err(e @ SpawnError::Command(..)) => {
            e.report();
            None
        }
        Err(e) => {
            e.report();
            session.set_running(false);
            return;
        }
    };
    let pipe_out = producer
        .as_mut()
        .and_then(|child| child.stdout.take())
        .map_or_else(Stdio::null, Stdio::from);

    let consumer = start_consumer(&right, pipe_out, session);

    if let Some(mut child) = producer {
        if let Err(e) = launcher::wait(&mut child) {
            eprintln!("tinysh: {:#}", e);
        }
    }
    let status: Option<ExitCode> = match consumer {
        Ok(mut child) => match launcher::wait(&mut child) {
            Ok(code) => Some(code),
            Err(e) => {
                eprintln!("tinysh: {:#}", e);
                None
            }
        },
        Err(e) => {
            e.report();
            e.status()
        }
    };
    if let Some(status) = status {
        session.set_last_status(status);
    }
    session.set_running(false);
}

fn start_producer(line: &CommandLine, session: &Session) -> Result<Child, SpawnError> {
    let streams = Streams::open(&line.redirects, session)
        .map_err(|e| SpawnError::Command(REDIRECT_FAILED, e))?;
    let mut cmd = launcher::prepare(&line.argv, session)?;
    if let Some(stdin) = streams.stdin {
        cmd.stdin(Stdio::from(stdin));
    }
    match streams.stdout {
        Some(stdout) => cmd.stdout(Stdio::from(stdout)),
        None => cmd.stdout(Stdio::piped()),
    };
    launcher::spawn(&mut cmd, &line.argv[0])
}

/// `pipe_out` is moved into the command and released when it is dropped on return,
/// so the shell keeps no handle on the pipe while waiting.
fn start_consumer(
    line: &CommandLine,
    pipe_out: Stdio,
    session: &Session,
) -> Result<Child, SpawnError> {
    let streams = Streams::open(&line.redirects, session)
        .map_err(|e| SpawnError::Command(REDIRECT_FAILED, e))?;
    let mut cmd = launcher::prepare(&line.argv, session)?;
    match streams.stdin {
        Some(stdin) => cmd.stdin(Stdio::from(stdin)),
        None => cmd.stdin(pipe_out),
    };
    if let Some(stdout) = streams.stdout {
        cmd.stdout(Stdio::from(stdout));
    }
    launcher::spawn(&mut cmd, &line.argv[0])
}
