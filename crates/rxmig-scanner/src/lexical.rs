//! Lexical helpers that skip strings, template literals and comments
//!
//! Used for balanced-delimiter checks on generated text and for cutting call
//! expressions out of method bodies without a full parse.

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Str(char),
    Template,
}

/// Iterator over delimiter characters that sit in code position
///
/// Yields `(byte_index, char, line)` for `(){}[]` outside strings and
/// comments, and optionally `,`. The `${`/`}` pair of a template expression
/// is not yielded.
pub(crate) struct CodeDelimiters<'a> {
    chars: Peekable<CharIndices<'a>>,
    mode: Mode,
    line: usize,
    template_braces: Vec<usize>,
    commas: bool,
}

impl<'a> CodeDelimiters<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            mode: Mode::Code,
            line: 1,
            template_braces: Vec::new(),
            commas: false,
        }
    }

    fn next_is(&mut self, expected: char) -> bool {
        if self.chars.peek().is_some_and(|&(_, c)| c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn skip_escaped(&mut self) {
        if let Some((_, c)) = self.chars.next() {
            if c == '\n' {
                self.line += 1;
            }
        }
    }
}

impl Iterator for CodeDelimiters<'_> {
    type Item = (usize, char, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, ch)) = self.chars.next() {
            let line = self.line;
            if ch == '\n' {
                self.line += 1;
            }
            match self.mode {
                Mode::LineComment => {
                    if ch == '\n' {
                        self.mode = Mode::Code;
                    }
                }
                Mode::BlockComment => {
                    if ch == '*' && self.next_is('/') {
                        self.mode = Mode::Code;
                    }
                }
                Mode::Str(quote) => {
                    if ch == '\\' {
                        self.skip_escaped();
                    } else if ch == quote || ch == '\n' {
                        self.mode = Mode::Code;
                    }
                }
                Mode::Template => {
                    if ch == '\\' {
                        self.skip_escaped();
                    } else if ch == '`' {
                        self.mode = Mode::Code;
                    } else if ch == '$' && self.next_is('{') {
                        self.template_braces.push(0);
                        self.mode = Mode::Code;
                    }
                }
                Mode::Code => match ch {
                    '/' if self.next_is('/') => self.mode = Mode::LineComment,
                    '/' if self.next_is('*') => self.mode = Mode::BlockComment,
                    '\'' | '"' => self.mode = Mode::Str(ch),
                    '`' => self.mode = Mode::Template,
                    '{' => {
                        if let Some(depth) = self.template_braces.last_mut() {
                            *depth += 1;
                        }
                        return Some((idx, ch, line));
                    }
                    '}' => {
                        if let Some(depth) = self.template_braces.last_mut() {
                            if *depth == 0 {
                                self.template_braces.pop();
                                self.mode = Mode::Template;
                                continue;
                            }
                            *depth -= 1;
                        }
                        return Some((idx, ch, line));
                    }
                    '(' | ')' | '[' | ']' => return Some((idx, ch, line)),
                    ',' if self.commas => return Some((idx, ch, line)),
                    _ => {}
                },
            }
        }
        None
    }
}

/// Delimiters plus commas in code position
pub(crate) fn code_delimiters_and_commas(text: &str) -> CodeDelimiters<'_> {
    let mut iter = CodeDelimiters::new(text);
    iter.commas = true;
    iter
}

/// A delimiter that does not pair up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imbalance {
    /// 1-based line of the offending delimiter
    pub line: usize,
    /// Closer found (None when input ended with openers left)
    pub found: Option<char>,
    /// Closer that was expected (None when nothing was open)
    pub expected: Option<char>,
}

impl std::fmt::Display for Imbalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.found, self.expected) {
            (Some(found), Some(expected)) => write!(
                f,
                "line {}: found '{}' where '{}' was expected",
                self.line, found, expected
            ),
            (Some(found), None) => write!(f, "line {}: unmatched '{}'", self.line, found),
            (None, Some(expected)) => {
                write!(f, "line {}: unclosed delimiter, expected '{}'", self.line, expected)
            }
            (None, None) => write!(f, "line {}: delimiter imbalance", self.line),
        }
    }
}

#[inline]
fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Check that `(){}[]` pair up outside strings and comments
///
/// # Errors
/// Returns the first [`Imbalance`]
pub fn check_balance(text: &str) -> Result<(), Imbalance> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (_, ch, line) in CodeDelimiters::new(text) {
        match ch {
            '(' | '[' | '{' => stack.push((ch, line)),
            _ => match stack.pop() {
                Some((open, _)) if closer_for(open) == ch => {}
                Some((open, _)) => {
                    return Err(Imbalance {
                        line,
                        found: Some(ch),
                        expected: Some(closer_for(open)),
                    })
                }
                None => {
                    return Err(Imbalance {
                        line,
                        found: Some(ch),
                        expected: None,
                    })
                }
            },
        }
    }
    match stack.pop() {
        Some((open, line)) => Err(Imbalance {
            line,
            found: None,
            expected: Some(closer_for(open)),
        }),
        None => Ok(()),
    }
}

/// Byte index of the delimiter closing the one at `open_idx`
#[must_use]
pub fn matching_close(text: &str, open_idx: usize) -> Option<usize> {
    let tail = text.get(open_idx..)?;
    let mut depth = 0usize;
    for (idx, ch, _) in CodeDelimiters::new(tail) {
        match ch {
            '(' | '[' | '{' => depth += 1,
            _ => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open_idx + idx);
                }
            }
        }
    }
    None
}

/// Text of a call starting at `start` whose argument list opens at `paren_idx`
#[must_use]
pub fn call_text(text: &str, start: usize, paren_idx: usize) -> Option<&str> {
    let close = matching_close(text, paren_idx)?;
    text.get(start..=close)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_code_passes() {
        let text = "foo(a, [b, { c: 1 }]);\nconst s = '(';\n// )\n/* { */";
        assert!(check_balance(text).is_ok());
    }

    #[test]
    fn template_expressions_are_tracked() {
        let text = "const s = `value ${ obj.map((x) => { return x; }) } done`;";
        assert!(check_balance(text).is_ok());
    }

    #[test]
    fn unclosed_brace_reported_at_opener() {
        let text = "class A {\n  load() {\n  }\n";
        let err = check_balance(text).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.expected, Some('}'));
        assert_eq!(err.found, None);
    }

    #[test]
    fn mismatched_closer_reported() {
        let err = check_balance("foo(]").unwrap_err();
        assert_eq!(err.found, Some(']'));
        assert_eq!(err.expected, Some(')'));
    }

    #[test]
    fn matching_close_skips_strings() {
        let text = "svc.get(id, ')', (x) => x)";
        let open = text.find('(').unwrap();
        assert_eq!(matching_close(text, open), Some(text.len() - 1));
        assert_eq!(call_text(text, 0, open), Some(text));
    }

    #[test]
    fn matching_close_unterminated() {
        assert_eq!(matching_close("svc.get(a, (b)", 7), None);
    }
}
