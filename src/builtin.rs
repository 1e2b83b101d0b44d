use crate::command::Flow;
use crate::session::Session;
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;

/// Commands implemented inside the shell.
///
/// Builtins run in-process, never create a child and never touch the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Help,
    Exit,
    Export,
    Unset,
}

/// Name table consulted with the first word of a command, before any process is created.
const BUILTINS: [(&str, Builtin); 5] = [
    ("cd", Builtin::Cd),
    ("help", Builtin::Help),
    ("exit", Builtin::Exit),
    ("export", Builtin::Export),
    ("unset", Builtin::Unset),
];

impl Builtin {
    /// Exact-match lookup of a command name.
    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTINS
            .iter()
            .find(|(builtin_name, _)| *builtin_name == name)
            .map(|(_, builtin)| *builtin)
    }

    pub fn name(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(_, builtin)| *builtin == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    /// Run the builtin with `args` (the words after its name).
    ///
    /// Usage errors and failures are reported on stderr and the shell keeps going;
    /// only `exit` yields [`Flow::Stop`].
    pub fn run(self, args: &[String], session: &mut Session, stdout: &mut dyn Write) -> Flow {
        log::debug!("builtin {} {:?}", self.name(), args);
        let result = match self {
            // any words after `exit` are ignored, flags included
            Builtin::Exit => return Flow::Stop,
            Builtin::Cd => parse::<Cd>(self, args).map(|cmd| cmd.execute(session)),
            Builtin::Help => parse::<Help>(self, args).map(|cmd| cmd.execute(stdout)),
            Builtin::Export => parse::<Export>(self, args).map(|cmd| cmd.execute(session)),
            Builtin::Unset => parse::<Unset>(self, args).map(|cmd| cmd.execute(session)),
        };
        match result {
            Ok(Ok(flow)) => flow,
            Ok(Err(e)) => {
                eprintln!("tinysh: {:#}", e);
                Flow::Continue
            }
            Err(EarlyExit { output, status }) => {
                if status.is_ok() {
                    let _ = stdout.write_all(output.as_bytes());
                } else {
                    eprintln!("tinysh: {}", output.trim_end());
                }
                Flow::Continue
            }
        }
    }
}

fn parse<T: FromArgs>(builtin: Builtin, args: &[String]) -> Result<T, EarlyExit> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    T::from_args(&[builtin.name()], &args)
}

#[derive(FromArgs)]
/// Change the working directory of the shell and of every command it starts.
struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to, absolute or relative to the current directory; further
    /// words are ignored.
    words: Vec<String>,
}

impl Cd {
    fn execute(self, session: &mut Session) -> Result<Flow> {
        let Some(target) = self.words.into_iter().next() else {
            bail!("expected argument to \"cd\"");
        };
        let new_dir = session.env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir).with_context(|| format!("cd: {}", target))?;
        env::set_current_dir(&canonical).with_context(|| format!("cd: {}", target))?;
        session.env.current_dir = canonical;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List the builtin commands.
struct Help {
    #[argh(positional, greedy)]
    /// ignored.
    _topics: Vec<String>,
}

impl Help {
    fn execute(self, stdout: &mut dyn Write) -> Result<Flow> {
        writeln!(stdout, "tinysh: a small command interpreter")?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout, "The following are built in:")?;
        for (name, _) in BUILTINS {
            writeln!(stdout, "  {}", name)?;
        }
        writeln!(stdout, "Use the man command for information on other programs.")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Set variables for this shell and the commands it starts.
struct Export {
    #[argh(positional, greedy)]
    /// assignments in the form KEY=VALUE.
    assignments: Vec<String>,
}

impl Export {
    fn execute(self, session: &mut Session) -> Result<Flow> {
        if self.assignments.is_empty() {
            bail!("expected argument to \"export\"");
        }
        // validate everything first so a bad word leaves the environment untouched
        let mut pairs = Vec::with_capacity(self.assignments.len());
        for assignment in &self.assignments {
            match assignment.split_once('=') {
                Some((key, value)) if !key.is_empty() => pairs.push((key, value)),
                _ => bail!("export: invalid format {:?} (use KEY=VALUE)", assignment),
            }
        }
        for (key, value) in pairs {
            session.env.set_var(key, value);
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Remove variables.
struct Unset {
    #[argh(positional, greedy)]
    /// names of the variables to remove.
    names: Vec<String>,
}

impl Unset {
    fn execute(self, session: &mut Session) -> Result<Flow> {
        if self.names.is_empty() {
            bail!("expected argument to \"unset\"");
        }
        for name in &self.names {
            session.env.remove_var(name);
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn session_in(dir: &std::path::Path) -> Session {
        Session::with_env(Environment::with_dir(dir))
    }

    fn run(builtin: Builtin, args: &[&str], session: &mut Session) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = builtin.run(&words(args), session, &mut out);
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(Builtin::lookup("cd"), Some(Builtin::Cd));
        assert_eq!(Builtin::lookup("exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup("CD"), None);
        assert_eq!(Builtin::lookup("ls"), None);
        assert_eq!(Builtin::lookup("export "), None);
    }

    #[test]
    fn names_round_trip_through_table() {
        for (name, builtin) in BUILTINS {
            assert_eq!(builtin.name(), name);
        }
    }

    #[test]
    fn help_lists_every_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        let (flow, out) = run(Builtin::Help, &[], &mut session);
        assert_eq!(flow, Flow::Continue);
        for name in ["cd", "help", "exit", "export", "unset"] {
            assert!(out.contains(&format!("  {}\n", name)), "missing {} in {}", name, out);
        }
    }

    #[test]
    fn exit_stops_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        assert_eq!(run(Builtin::Exit, &[], &mut session).0, Flow::Stop);
        assert_eq!(run(Builtin::Exit, &["3"], &mut session).0, Flow::Stop);
        assert_eq!(run(Builtin::Exit, &["-1"], &mut session).0, Flow::Stop);
        assert_eq!(run(Builtin::Exit, &["--bogus", "x"], &mut session).0, Flow::Stop);
    }

    #[test]
    fn help_ignores_extra_words() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        let (flow, out) = run(Builtin::Help, &["cd", "more"], &mut session);
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("  exit\n"), "unexpected help output: {}", out);
    }

    #[test]
    fn export_splits_on_first_equals() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        let (flow, _) = run(Builtin::Export, &["FOO=a=b"], &mut session);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(session.env.get_var("FOO"), Some("a=b"));

        run(Builtin::Export, &["EMPTY="], &mut session);
        assert_eq!(session.env.get_var("EMPTY"), Some(""));
    }

    #[test]
    fn export_rejects_bad_syntax_without_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        let (flow, _) = run(Builtin::Export, &["GOOD=1", "NOEQUALS"], &mut session);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(session.env.get_var("GOOD"), None);
        assert_eq!(session.env.get_var("NOEQUALS"), None);

        run(Builtin::Export, &["=value"], &mut session);
        assert_eq!(session.env.get_var(""), None);

        assert_eq!(run(Builtin::Export, &[], &mut session).0, Flow::Continue);
    }

    #[test]
    fn unset_removes_variable() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.env.set_var("GONE", "soon");
        assert_eq!(run(Builtin::Unset, &["GONE"], &mut session).0, Flow::Continue);
        assert_eq!(session.env.get_var("GONE"), None);
        // missing argument is only reported
        assert_eq!(run(Builtin::Unset, &[], &mut session).0, Flow::Continue);
    }

    #[test]
    fn builtins_leave_exit_status_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.set_last_status(7);
        run(Builtin::Export, &["BAD"], &mut session);
        run(Builtin::Unset, &[], &mut session);
        run(Builtin::Help, &[], &mut session);
        assert_eq!(session.last_status(), 7);
    }

    #[test]
    fn cd_changes_session_and_process_dir() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let canonical = fs::canonicalize(tmp.path().join("sub")).unwrap();

        let mut session = session_in(tmp.path());
        let (flow, _) = run(Builtin::Cd, &["sub"], &mut session);
        let now = env::current_dir().unwrap();
        env::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(flow, Flow::Continue);
        assert_eq!(session.env.current_dir, canonical);
        assert_eq!(fs::canonicalize(now).unwrap(), canonical);
    }

    #[test]
    fn cd_uses_first_word_only() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        let canonical = fs::canonicalize(tmp.path().join("a")).unwrap();

        let mut session = session_in(tmp.path());
        let (flow, _) = run(Builtin::Cd, &["a", "b"], &mut session);
        env::set_current_dir(&orig).expect("failed to restore cwd");

        assert_eq!(flow, Flow::Continue);
        assert_eq!(session.env.current_dir, canonical);
    }

    #[test]
    fn cd_failures_are_not_fatal() {
        let _lock = lock_current_dir();
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());

        assert_eq!(run(Builtin::Cd, &[], &mut session).0, Flow::Continue);
        assert_eq!(run(Builtin::Cd, &["does-not-exist"], &mut session).0, Flow::Continue);
        assert_eq!(session.env.current_dir, tmp.path());
    }
}
