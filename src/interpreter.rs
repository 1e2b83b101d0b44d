use crate::command::{ExitCode, Flow};
use crate::session::Session;
use crate::{expand, lexer, logic, prompt};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::io::BufRead;
use std::sync::{Arc, Mutex};

/// Number of lines kept in the interactive history.
const HISTORY_SIZE: usize = 50;

/// A minimal shell that executes command lines against a [`Session`].
///
/// Example
/// ```
/// use tinysh::{Flow, Interpreter};
/// let mut sh = Interpreter::new();
/// assert_eq!(sh.execute_line("export GREETING=hi"), Flow::Continue);
/// assert_eq!(sh.session().env.get_var("GREETING"), Some("hi"));
/// assert_eq!(sh.execute_line("exit"), Flow::Stop);
/// ```
pub struct Interpreter {
    session: Session,
    prompt: Arc<Mutex<String>>,
}

impl Interpreter {
    /// Create an interpreter for the current process environment and directory.
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            prompt: Arc::new(Mutex::new(prompt::FALLBACK.to_owned())),
        }
    }

    /// The prompt most recently shown by [`Interpreter::repl`], shared with the
    /// interrupt handler so it can redraw it.
    pub fn prompt_handle(&self) -> Arc<Mutex<String>> {
        Arc::clone(&self.prompt)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Exit status of the most recent foreground command.
    pub fn last_status(&self) -> ExitCode {
        self.session.last_status()
    }

    /// Execute one raw command line.
    ///
    /// The line is tokenized, variables and then wildcards are expanded, and the result is
    /// evaluated with `&&`/`||` short-circuiting. Errors are reported on stderr; the only
    /// way to get [`Flow::Stop`] is the `exit` builtin.
    pub fn execute_line(&mut self, line: &str) -> Flow {
        let tokens = lexer::split_into_tokens(line);
        if tokens.is_empty() {
            return Flow::Continue;
        }
        let tokens =
            expand::expand_variables(tokens, &self.session.env, self.session.last_status());
        let tokens = expand::expand_wildcards(tokens, &self.session.env);
        log::debug!("expanded: {:?}", tokens);
        logic::evaluate(tokens, &mut self.session)
    }

    /// Report background commands that have finished since the last call.
    pub fn reap_background(&mut self) {
        for reaped in self.session.reap_background() {
            println!("[done] {} exit {}", reaped.pid, reaped.status);
        }
    }

    /// Execute lines from `input` until it is exhausted or `exit` is run.
    pub fn run_lines<R: BufRead>(&mut self, input: R) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line?;
            self.reap_background();
            if !self.execute_line(&line).is_continue() {
                break;
            }
        }
        self.reap_background();
        Ok(())
    }

    /// Interactive Read-Eval-Print Loop.
    ///
    /// The prompt reads `user@host:cwd$ ` and follows `cd`.
    /// Non-empty lines are committed to a history of the last 50 entries; a line equal
    /// to the previous entry is not stored twice. Ctrl-C at the prompt starts a fresh
    /// line, Ctrl-D leaves the loop.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let config = Config::builder()
            .max_history_size(HISTORY_SIZE)?
            .history_ignore_dups(true)?
            .auto_add_history(false)
            .build();
        let mut rl = DefaultEditor::with_config(config)?;
        let host = prompt::hostname(&self.session.env);

        loop {
            self.reap_background();
            let prompt = prompt::render(&self.session.env, &host);
            if let Ok(mut shared) = self.prompt.lock() {
                shared.clone_from(&prompt);
            }
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if !self.execute_line(&line).is_continue() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
