use anyhow::Context;
use argh::FromArgs;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use tinysh::{Interpreter, logging, signals};

#[derive(FromArgs)]
/// A small command interpreter with pipes, redirections and && / || chaining.
struct Args {
    #[argh(option, short = 'c')]
    /// execute this command line and exit with its status.
    command: Option<String>,

    #[argh(switch, short = 'v')]
    /// log every execution stage to stderr.
    verbose: bool,

    #[argh(positional)]
    /// script to execute line by line instead of reading commands.
    script: Option<PathBuf>,
}

fn main() -> std::process::ExitCode {
    let args: Args = argh::from_env();
    logging::init(args.verbose);

    let interactive =
        args.command.is_none() && args.script.is_none() && io::stdin().is_terminal();
    let mut sh = Interpreter::new();
    let prompt = interactive.then(|| sh.prompt_handle());
    if let Err(e) = signals::install(sh.session().running_flag(), prompt) {
        log::warn!("cannot install interrupt handler: {}", e);
    }

    let result = if let Some(command) = args.command {
        sh.execute_line(&command);
        sh.reap_background();
        Ok(())
    } else if let Some(path) = args.script {
        File::open(&path)
            .with_context(|| format!("{}", path.display()))
            .and_then(|file| sh.run_lines(BufReader::new(file)))
    } else if interactive {
        sh.repl().context("line editor")
    } else {
        sh.run_lines(io::stdin().lock())
    };

    match result {
        Ok(()) => std::process::ExitCode::from(u8::try_from(sh.last_status()).unwrap_or(1)),
        Err(e) => {
            eprintln!("tinysh: {:#}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
