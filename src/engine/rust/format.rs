//! Bracket-depth re-indentation.
//!
//! Each line is re-indented to `indent_width * depth`, where depth counts the
//! brackets left open by earlier lines. Lines starting with closers are
//! dedented by the number of closers they start with, and a leading `.`
//! (method chains) adds one level. Trailing whitespace is dropped. Lines that
//! start inside a string or block comment are left alone.

use crate::text::{edit, Edit, TextSpan};

/// Formatting edits against `source`, limited to lines touching `span`.
pub fn format_edits(source: &str, span: Option<TextSpan>, indent_width: usize) -> Vec<Edit> {
    let formatted = reindent(source, span, indent_width);
    let edits = edit::diff(source, &formatted);
    match span {
        Some(span) => edits
            .into_iter()
            .filter(|e| span.contains_span(e.span))
            .collect(),
        None => edits,
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
enum State {
    Code,
    Str,
    /// Raw string with this many `#`s.
    RawStr(usize),
    /// Nested block comment depth.
    Comment(usize),
}

pub fn reindent(source: &str, span: Option<TextSpan>, indent_width: usize) -> String {
    let mut out = String::with_capacity(source.len());
    let mut depth: usize = 0;
    let mut state = State::Code;
    let mut line_start = 0;

    for raw_line in source.split_inclusive('\n') {
        let line_end = line_start + raw_line.len();
        let (body, newline) = split_newline(raw_line);
        let in_span = span.is_none_or(|s| line_start <= s.end && s.start <= line_end);

        let starts_in_code = state == State::Code;
        let trimmed = body.trim();
        let closers = trimmed
            .chars()
            .take_while(|c| matches!(c, '}' | ')' | ']'))
            .count();

        if !in_span {
            out.push_str(raw_line);
        } else if !starts_in_code {
            out.push_str(body.trim_end_matches([' ', '\t']));
            out.push_str(newline);
        } else if trimmed.is_empty() {
            out.push_str(newline);
        } else {
            let mut level = depth.saturating_sub(closers);
            if trimmed.starts_with('.') {
                level += 1;
            }
            out.push_str(&" ".repeat(level * indent_width));
            out.push_str(trimmed);
            out.push_str(newline);
        }

        let (next_state, delta) = scan(body, state);
        state = next_state;
        depth = (depth as isize + delta).max(0) as usize;
        line_start = line_end;
    }
    out
}

fn split_newline(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Net bracket change over one line, and the lexical state at its end.
fn scan(line: &str, mut state: State) -> (State, isize) {
    let chars: Vec<char> = line.chars().collect();
    let mut delta = 0isize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            State::Code => match c {
                '/' if next == Some('/') => return (state, delta),
                '/' if next == Some('*') => {
                    state = State::Comment(1);
                    i += 1;
                }
                '"' => state = State::Str,
                'r' if is_raw_start(&chars, i) => {
                    let hashes = chars[i + 1..].iter().take_while(|&&h| h == '#').count();
                    state = State::RawStr(hashes);
                    i += hashes + 1;
                }
                '\'' => i += char_literal_len(&chars, i),
                '{' | '(' | '[' => delta += 1,
                '}' | ')' | ']' => delta -= 1,
                _ => {}
            },
            State::Str => match c {
                '\\' => i += 1,
                '"' => state = State::Code,
                _ => {}
            },
            State::RawStr(hashes) => {
                if c == '"' && chars[i + 1..].iter().take(hashes).filter(|&&h| h == '#').count() == hashes {
                    state = State::Code;
                    i += hashes;
                }
            }
            State::Comment(level) => {
                if c == '*' && next == Some('/') {
                    state = if level == 1 { State::Code } else { State::Comment(level - 1) };
                    i += 1;
                } else if c == '/' && next == Some('*') {
                    state = State::Comment(level + 1);
                    i += 1;
                }
            }
        }
        i += 1;
    }
    (state, delta)
}

/// `r"` or `r#..#"` not preceded by an identifier character.
fn is_raw_start(chars: &[char], i: usize) -> bool {
    if i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_') {
        return false;
    }
    let rest = &chars[i + 1..];
    let hashes = rest.iter().take_while(|&&h| h == '#').count();
    rest.get(hashes) == Some(&'"')
}

/// Extra characters to skip for a char literal at `i`; zero for a lifetime.
fn char_literal_len(chars: &[char], i: usize) -> usize {
    match (chars.get(i + 1), chars.get(i + 2)) {
        (Some('\\'), _) => chars
            .get(i + 3..)
            .and_then(|rest| rest.iter().position(|&c| c == '\''))
            .map(|p| p + 3)
            .unwrap_or(0),
        (Some(_), Some('\'')) => 2,
        _ => 0,
    }
}
