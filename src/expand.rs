//! Word expansion passes, applied in order: variables first, then wildcards.
//!
//! Both passes take ownership of the token sequence and build a fresh one.

use crate::command::ExitCode;
use crate::env::Environment;
use glob::{MatchOptions, Pattern};
use std::borrow::Cow;
use std::path::Path;

/// Replace whole-token `$NAME` references.
///
/// `$?` becomes the decimal `last_status`, any other `$NAME` becomes the variable's
/// value or an empty token when it is unset. A lone `$` and tokens that merely
/// contain a `$` (`foo$BAR`) are left alone. The output has the same length as the input.
pub fn expand_variables(
    tokens: Vec<String>,
    env: &Environment,
    last_status: ExitCode,
) -> Vec<String> {
    tokens
        .into_iter()
        .map(|token| match token.strip_prefix('$') {
            Some("?") => last_status.to_string(),
            Some(name) if !name.is_empty() => env.get_var(name).unwrap_or_default().to_owned(),
            _ => token,
        })
        .collect()
}

/// Replace every token containing `*` or `?` with the sorted paths it matches.
///
/// Relative patterns are matched against the working directory and produce relative
/// paths. A leading `~` (alone or before `/`) stands for `HOME`. A pattern that matches
/// nothing, or is not a valid pattern, is kept literally.
pub fn expand_wildcards(tokens: Vec<String>, env: &Environment) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.contains(['*', '?']) {
            let matches = glob_matches(&token, env);
            if matches.is_empty() {
                log::debug!("wildcard {:?} matched nothing, keeping it", token);
                out.push(token);
            } else {
                out.extend(matches);
            }
        } else {
            out.push(token);
        }
    }
    out
}

/// `~` and `~/rest` with `HOME` substituted; anything else (including `~user`) unchanged.
fn expand_tilde<'a>(token: &'a str, env: &Environment) -> Cow<'a, str> {
    let Some(rest) = token.strip_prefix('~') else {
        return Cow::Borrowed(token);
    };
    if !(rest.is_empty() || rest.starts_with('/')) {
        return Cow::Borrowed(token);
    }
    match env.get_var("HOME") {
        Some(home) => Cow::Owned(format!("{}{}", Pattern::escape(home), rest)),
        None => Cow::Borrowed(token),
    }
}

fn glob_matches(token: &str, env: &Environment) -> Vec<String> {
    let token = expand_tilde(token, env);
    let cwd = env.current_dir.as_path();
    let relative = Path::new(token.as_ref()).is_relative();
    let pattern = if relative {
        format!("{}/{}", Pattern::escape(&cwd.to_string_lossy()), token)
    } else {
        token.to_string()
    };
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let paths = match glob::glob_with(&pattern, options) {
        Ok(paths) => paths,
        Err(e) => {
            log::debug!("invalid wildcard {:?}: {}", token, e);
            return Vec::new();
        }
    };

    paths
        .flatten()
        .map(|path| {
            let shown = if relative {
                path.strip_prefix(cwd).unwrap_or(&path)
            } else {
                &path
            };
            shown.to_string_lossy().into_owned()
        })
        .collect()
}
