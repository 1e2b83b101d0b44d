use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Install the Ctrl-C handler for the whole process.
///
/// The shell itself never dies from an interrupt. While `running` is set the foreground
/// child gets the signal through the terminal as usual and the shell only moves to a new
/// line. Otherwise an interactive shell redraws the prompt currently held in `prompt`;
/// without a prompt (scripts, `-c`) only the newline is written.
pub fn install(
    running: Arc<AtomicBool>,
    prompt: Option<Arc<Mutex<String>>>,
) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let text = notice(running.load(Ordering::SeqCst), prompt.as_deref());
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    })
}

fn notice(running: bool, prompt: Option<&Mutex<String>>) -> String {
    match prompt {
        Some(prompt) if !running => match prompt.lock() {
            Ok(prompt) => format!("\n{}", prompt),
            Err(_) => "\n".to_owned(),
        },
        _ => "\n".to_owned(),
    }
}
