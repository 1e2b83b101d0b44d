//! Lexical analysis (tokenization) of a single command line.
//!
//! Words are separated by runs of blanks (space, tab, carriage return, newline, bell).
//! A double quote toggles a quoted span in which blanks are ordinary characters; the
//! quote characters themselves never reach the produced token. Operators such as `|`,
//! `&&` or `>` are only recognised later, as whole tokens, so they must be surrounded
//! by blanks to take effect.

const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingDoubleQuote,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    buffer: String,
}

impl<'a> LexingFSM<'a> {
    fn new(line: &'a str) -> Self {
        LexingFSM {
            input: line.chars(),
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    fn make_tokens(mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.input.next() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        if self.state == LexingState::ReadingDoubleQuote {
            log::warn!("unterminated quote, closing it at end of line");
        }
        self.finish_word(&mut out);
        out
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            c if DELIMITERS.contains(&c) => {}
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            c if DELIMITERS.contains(&c) => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    /// Quotes with nothing inside (`""`) contribute no characters, so a word made
    /// only of them produces no token.
    fn finish_word(&mut self, out: &mut Vec<String>) {
        if !self.buffer.is_empty() {
            out.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Split `line` into words.
///
/// An unterminated double quote is closed implicitly at the end of the line.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    let tokens = LexingFSM::new(line).make_tokens();
    log::trace!("tokens: {:?}", tokens);
    tokens
}

#[cfg(test)]
mod tests {
    use super::split_into_tokens;

    fn toks(line: &str) -> Vec<String> {
        split_into_tokens(line)
    }

    #[test]
    fn splits_on_any_blank_run() {
        assert_eq!(toks("  ls \t -la\r\n"), vec!["ls", "-la"]);
        assert_eq!(toks("a\x07b"), vec!["a", "b"]);
    }

    #[test]
    fn empty_and_blank_lines_have_no_tokens() {
        assert!(toks("").is_empty());
        assert!(toks(" \t  ").is_empty());
    }

    #[test]
    fn quoted_span_is_one_token_without_quotes() {
        assert_eq!(
            toks(r#"echo "hello   world" done"#),
            vec!["echo", "hello   world", "done"]
        );
    }

    #[test]
    fn quotes_join_adjacent_text() {
        assert_eq!(toks(r#"pre"fix suf"fix"#), vec!["prefix suffix"]);
    }

    #[test]
    fn operators_are_plain_words() {
        assert_eq!(
            toks("a && b || c | d > f >> g < h &"),
            vec!["a", "&&", "b", "||", "c", "|", "d", ">", "f", ">>", "g", "<", "h", "&"]
        );
    }

    #[test]
    fn quoted_operators_are_not_split() {
        assert_eq!(toks(r#"echo "a | b""#), vec!["echo", "a | b"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(toks(r#"echo "open quote"#), vec!["echo", "open quote"]);
    }

    #[test]
    fn empty_quotes_yield_no_token() {
        assert_eq!(toks(r#"echo "" x"#), vec!["echo", "x"]);
    }

    #[test]
    fn single_quotes_are_ordinary_characters() {
        assert_eq!(toks("echo 'a b'"), vec!["echo", "'a", "b'"]);
    }
}
