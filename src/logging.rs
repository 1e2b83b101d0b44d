use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

/// Environment variable overriding the log level (`off`, `error`, `warn`, `info`,
/// `debug` or `trace`).
pub const LOG_ENV: &str = "TINYSH_LOG";

/// Install the stderr logger. Diagnostics never go to stdout, which belongs to the
/// commands being run.
pub fn init(verbose: bool) {
    let level = level_from(std::env::var(LOG_ENV).ok().as_deref(), verbose);
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    if TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        log::debug!("logger already installed");
    }
}

fn level_from(value: Option<&str>, verbose: bool) -> LevelFilter {
    match value.and_then(|v| v.trim().parse().ok()) {
        Some(level) => level,
        None if verbose => LevelFilter::Debug,
        None => LevelFilter::Warn,
    }
}
