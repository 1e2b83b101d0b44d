//! Starting a single external command.
//!
//! A command's words are split into the argument vector proper, its redirections and
//! the trailing background marker by [`CommandLine::parse`]. [`launch`] then starts the
//! program, blocking for foreground commands.

use crate::command::{ExitCode, Flow};
use crate::error::SyntaxError;
use crate::external::{find_command_path, status_code};
use crate::session::Session;
use anyhow::{Context, Result, anyhow};
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Reported when the program cannot be found.
pub(crate) const NOT_FOUND: ExitCode = 127;
/// Reported when the program exists but cannot be executed.
pub(crate) const NOT_EXECUTABLE: ExitCode = 126;
/// Reported when a redirection cannot be set up.
pub(crate) const REDIRECT_FAILED: ExitCode = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: read standard input from the file.
    Input,
    /// `>`: write standard output to the file, truncating it.
    Output,
    /// `>>`: append standard output to the file.
    Append,
}

impl RedirectKind {
    fn from_operator(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectKind::Input),
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            _ => None,
        }
    }

    fn open(self, path: &Path) -> std::io::Result<File> {
        match self {
            RedirectKind::Input => File::open(path),
            RedirectKind::Output => output_options().truncate(true).open(path),
            RedirectKind::Append => output_options().append(true).open(path),
        }
    }
}

fn output_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub target: String,
}

/// One command with its redirections pulled out of the argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub argv: Vec<String>,
    pub redirects: Vec<Redirect>,
    pub background: bool,
}

impl CommandLine {
    /// Split `tokens` into arguments, redirections and the background marker.
    ///
    /// Only a lone `&` in last position marks a background command. Each `>`, `>>`
    /// and `<` consumes the following word as its target; both are removed from
    /// the argument vector.
    pub fn parse(mut tokens: Vec<String>) -> Result<Self, SyntaxError> {
        let background = tokens.last().is_some_and(|t| t == "&");
        if background {
            tokens.pop();
        }

        let mut argv = Vec::with_capacity(tokens.len());
        let mut redirects = Vec::new();
        let mut words = tokens.into_iter();
        while let Some(word) = words.next() {
            match RedirectKind::from_operator(&word) {
                Some(kind) => {
                    let target = words
                        .next()
                        .ok_or(SyntaxError::MissingRedirectTarget(word))?;
                    redirects.push(Redirect { kind, target });
                }
                None => argv.push(word),
            }
        }

        Ok(Self {
            argv,
            redirects,
            background,
        })
    }
}

/// Standard streams of a child after its redirections have been opened.
/// `None` keeps whatever the caller would otherwise give the child.
#[derive(Debug, Default)]
pub(crate) struct Streams {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

impl Streams {
    /// Open every redirection target in order; a later redirection of the same stream wins.
    pub fn open(redirects: &[Redirect], session: &Session) -> Result<Self> {
        let mut streams = Streams::default();
        for redirect in redirects {
            let file = redirect
                .kind
                .open(&session.env.resolve(&redirect.target))
                .with_context(|| redirect.target.clone())?;
            match redirect.kind {
                RedirectKind::Input => streams.stdin = Some(file),
                RedirectKind::Output | RedirectKind::Append => streams.stdout = Some(file),
            }
        }
        Ok(streams)
    }
}

/// Why a child could not be started.
#[derive(Debug)]
pub(crate) enum SpawnError {
    /// The failure belongs to the command (missing program, bad redirection) and is
    /// recorded as that command's exit status.
    Command(ExitCode, anyhow::Error),
    /// The shell could not create the process at all; no status is recorded.
    Resource(anyhow::Error),
}

impl SpawnError {
    pub fn report(&self) {
        match self {
            SpawnError::Command(_, e) | SpawnError::Resource(e) => eprintln!("tinysh: {:#}", e),
        }
    }

    pub fn status(&self) -> Option<ExitCode> {
        match self {
            SpawnError::Command(status, _) => Some(*status),
            SpawnError::Resource(_) => None,
        }
    }
}

/// Build the [`Command`] for `argv`, resolving the program through the session's PATH.
pub(crate) fn prepare(argv: &[String], session: &Session) -> Result<Command, SpawnError> {
    let Some(name) = argv.first() else {
        return Err(SpawnError::Command(NOT_FOUND, anyhow!("empty command")));
    };
    let search_paths = session.env.get_var("PATH").unwrap_or_default();
    let program = find_command_path(
        OsStr::new(search_paths),
        &session.env.current_dir,
        Path::new(name),
    )
    .ok_or_else(|| SpawnError::Command(NOT_FOUND, anyhow!("{}: command not found", name)))?;

    let mut cmd = Command::new(program);
    cmd.args(&argv[1..])
        .env_clear()
        .envs(&session.env.vars)
        .current_dir(&session.env.current_dir);
    Ok(cmd)
}

/// Spawn `cmd`, classifying the failure.
pub(crate) fn spawn(cmd: &mut Command, name: &str) -> Result<Child, SpawnError> {
    cmd.spawn().map_err(|e| {
        let kind = e.kind();
        let e = anyhow::Error::new(e).context(name.to_owned());
        match kind {
            ErrorKind::NotFound => SpawnError::Command(NOT_FOUND, e),
            ErrorKind::PermissionDenied => SpawnError::Command(NOT_EXECUTABLE, e),
            _ => SpawnError::Resource(e),
        }
    })
}

/// Block until `child` terminates and return its status.
///
/// [`Child::wait`] only returns once the child has exited or been killed; stop and
/// continue transitions do not wake it.
pub(crate) fn wait(child: &mut Child) -> Result<ExitCode> {
    let pid = child.id();
    let status = child
        .wait()
        .with_context(|| format!("waiting for process {}", pid))?;
    let code = status_code(status);
    log::debug!("process {} finished with {}", pid, code);
    Ok(code)
}

/// Run one external command.
///
/// Foreground commands set the Running-Command Flag for the duration of the wait and
/// record the child's status. Background commands print a notice and are handed to the
/// session for later reaping, leaving both the flag and the exit status untouched.
pub fn launch(tokens: Vec<String>, session: &mut Session) -> Flow {
    let background = tokens.last().is_some_and(|t| t == "&");
    let line = match CommandLine::parse(tokens) {
        Ok(line) => line,
        Err(e) => {
            eprintln!("tinysh: {}", e);
            if !background {
                session.set_last_status(REDIRECT_FAILED);
            }
            return Flow::Continue;
        }
    };
    if line.argv.is_empty() {
        // `> file` alone only creates or truncates its targets
        let status = match Streams::open(&line.redirects, session) {
            Ok(_) => 0,
            Err(e) => {
                eprintln!("tinysh: {:#}", e);
                REDIRECT_FAILED
            }
        };
        if !line.background {
            session.set_last_status(status);
        }
        return Flow::Continue;
    }

    if !line.background {
        session.set_running(true);
    }

    match start(&line, session) {
        Ok(mut child) if !line.background => {
            match wait(&mut child) {
                Ok(code) => session.set_last_status(code),
                Err(e) => eprintln!("tinysh: {:#}", e),
            }
            session.set_running(false);
        }
        Ok(child) => {
            println!("[started] {}", child.id());
            log::debug!("background process {} started: {:?}", child.id(), line.argv);
            session.track_background(child);
        }
        Err(e) => {
            e.report();
            match e.status() {
                Some(status) if !line.background => session.set_last_status(status),
                _ => {}
            }
            session.set_running(false);
        }
    }
    Flow::Continue
}

fn start(line: &CommandLine, session: &Session) -> Result<Child, SpawnError> {
    let streams = Streams::open(&line.redirects, session)
        .map_err(|e| SpawnError::Command(REDIRECT_FAILED, e))?;
    let mut cmd = prepare(&line.argv, session)?;
    if let Some(stdin) = streams.stdin {
        cmd.stdin(Stdio::from(stdin));
    }
    if let Some(stdout) = streams.stdout {
        cmd.stdout(Stdio::from(stdout));
    }
    log::debug!("spawning {:?}", line.argv);
    spawn(&mut cmd, &line.argv[0])
}
