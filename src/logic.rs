//! Short-circuit evaluation of `&&` and `||`.

use crate::command::{ExitCode, Flow};
use crate::pipeline;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "&&" => Some(Operator::And),
            "||" => Some(Operator::Or),
            _ => None,
        }
    }

    fn should_continue(self, status: ExitCode) -> bool {
        match self {
            Operator::And => status == 0,
            Operator::Or => status != 0,
        }
    }
}

/// Evaluate a token sequence that may contain `&&` and `||`.
///
/// The sequence is cut into operands at every operator and folded from the left: the
/// first operand always runs, each following one runs only when the exit status left
/// by the previous evaluation satisfies its operator, so `a && b || c` means
/// `(a && b) || c`. An empty operand is a no-op.
///
/// The result is the [`Flow`] of the last operand that ran. `exit` leaves the exit
/// status alone, so `exit && cmd` still runs `cmd` when the status was 0.
pub fn evaluate(tokens: Vec<String>, session: &mut Session) -> Flow {
    let mut operands = split_operands(tokens).into_iter();
    let Some((_, first)) = operands.next() else {
        return Flow::Continue;
    };

    let mut flow = pipeline::run(first, session);
    for (op, operand) in operands {
        let status = session.last_status();
        if op.is_some_and(|op| op.should_continue(status)) {
            log::debug!("{:?}: status {}, running {:?}", op, status, operand);
            flow = pipeline::run(operand, session);
        } else {
            log::debug!("{:?}: status {}, skipping {:?}", op, status, operand);
        }
    }
    flow
}

/// Operands paired with the operator in front of them; the first has none.
fn split_operands(tokens: Vec<String>) -> Vec<(Option<Operator>, Vec<String>)> {
    let mut operands = vec![(None, Vec::new())];
    for token in tokens {
        match Operator::from_token(&token) {
            Some(op) => operands.push((Some(op), Vec::new())),
            None => {
                if let Some((_, operand)) = operands.last_mut() {
                    operand.push(token);
                }
            }
        }
    }
    operands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use std::fs;
    use std::path::Path;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_owned).collect()
    }

    fn session_in(dir: &Path) -> Session {
        Session::with_env(Environment::with_dir(dir))
    }

    fn read(dir: &Path, name: &str) -> Option<String> {
        fs::read_to_string(dir.join(name)).ok()
    }

    #[test]
    fn operands_are_split_at_every_operator() {
        let operands = split_operands(words("a x && b || && c"));
        let shape: Vec<_> = operands.iter().map(|(op, w)| (*op, w.join(" "))).collect();
        assert_eq!(
            shape,
            vec![
                (None, "a x".to_string()),
                (Some(Operator::And), "b".to_string()),
                (Some(Operator::Or), String::new()),
                (Some(Operator::And), "c".to_string()),
            ]
        );
    }

    #[test]
    fn and_runs_right_after_success() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        evaluate(words("true && printf ran > r.txt"), &mut session);
        assert_eq!(read(tmp.path(), "r.txt").as_deref(), Some("ran"));
        assert_eq!(session.last_status(), 0);
    }

    #[test]
    fn and_skips_right_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        evaluate(words("false && printf ran > r.txt"), &mut session);
        assert_eq!(read(tmp.path(), "r.txt"), None);
        assert_eq!(session.last_status(), 1);
    }

    #[test]
    fn or_runs_right_only_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        evaluate(words("false || printf ran > r.txt"), &mut session);
        assert_eq!(read(tmp.path(), "r.txt").as_deref(), Some("ran"));
        assert_eq!(session.last_status(), 0);

        evaluate(words("true || printf again > s.txt"), &mut session);
        assert_eq!(read(tmp.path(), "s.txt"), None);
    }

    #[test]
    fn operators_group_to_the_left() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        // (false && a) || b
        evaluate(
            words("false && printf a > a.txt || printf b > b.txt"),
            &mut session,
        );
        assert_eq!(read(tmp.path(), "a.txt"), None);
        assert_eq!(read(tmp.path(), "b.txt").as_deref(), Some("b"));

        // (true || a) && b
        evaluate(words("true || printf c > c.txt && printf d > d.txt"), &mut session);
        assert_eq!(read(tmp.path(), "c.txt"), None);
        assert_eq!(read(tmp.path(), "d.txt").as_deref(), Some("d"));
    }

    #[test]
    fn right_status_becomes_result() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        evaluate(words("true && false"), &mut session);
        assert_eq!(session.last_status(), 1);
    }

    #[test]
    fn empty_operands_are_no_ops() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        assert_eq!(evaluate(words("&&"), &mut session), Flow::Continue);
        assert_eq!(evaluate(words("true ||"), &mut session), Flow::Continue);
        assert_eq!(evaluate(words("&& true"), &mut session), Flow::Continue);
        assert_eq!(session.last_status(), 0);
    }

    #[test]
    fn exit_result_is_kept_only_when_last_to_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        assert_eq!(
            evaluate(words("exit && printf x > x.txt"), &mut session),
            Flow::Continue
        );
        assert_eq!(read(tmp.path(), "x.txt").as_deref(), Some("x"));

        assert_eq!(evaluate(words("false || exit"), &mut session), Flow::Stop);
        assert_eq!(evaluate(words("true && exit"), &mut session), Flow::Stop);

        // skipped operands do not replace the result
        session.set_last_status(0);
        assert_eq!(evaluate(words("exit || printf y > y.txt"), &mut session), Flow::Stop);
        assert_eq!(read(tmp.path(), "y.txt"), None);
    }
}
