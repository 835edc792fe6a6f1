//! Conversion between quoted scalar bodies and their logical values.
//!
//! The functions here work on the text found *between* the quotes. Multi-line bodies are first
//! folded with [`fold_quoted_lines`], then unescaped.

use std::fmt;

use thiserror::Error;

use crate::char_traits::{as_hex, is_blank, is_json_char, is_printable};

/// An error converting a quoted scalar body to or from its logical value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EscapeError {
    /// A `\` was followed by a character that does not name an escape.
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),
    /// A `\x`, `\u` or `\U` escape was followed by a non-hexadecimal digit.
    #[error("invalid hexadecimal digits `{digits}` in `\\{escape}` escape")]
    InvalidHex {
        /// The escape letter (`x`, `u` or `U`).
        escape: char,
        /// The digits that were read.
        digits: String,
    },
    /// A hexadecimal escape designates a value that is not a Unicode scalar value.
    #[error("invalid code point U+{0:X}")]
    InvalidCodePoint(u32),
    /// The body ended in the middle of an escape sequence.
    #[error("truncated escape sequence")]
    TruncatedEscape,
    /// A quote character that should have been escaped was found in the body.
    #[error("unescaped `{0}` in quoted scalar")]
    UnescapedQuote(char),
    /// A character outside of the JSON-compatible range was found in the body.
    #[error("control character {0:?} is not allowed in a quoted scalar")]
    ControlCharacter(char),
    /// The character cannot be written in the requested quoting style.
    #[error("{0:?} cannot be written in a single-quoted scalar")]
    NotRepresentable(char),
}

/// Fold the raw lines of a flow (quoted) scalar into a single logical line.
///
/// `raw` holds the text between the quotes, with line breaks normalized to `\n`. Leading
/// whitespace of continuation lines and trailing whitespace of continued lines are dropped. A
/// single line break becomes a space and `n + 1` consecutive breaks become `n` newlines.
///
/// In double-quoted bodies (`double == true`), a line ending with an unescaped `\` is joined to
/// the next one without any separator and escaped trailing whitespace is preserved.
#[must_use]
pub fn fold_quoted_lines(raw: &str, double: bool) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() == 1 {
        return raw.to_owned();
    }
    let last = lines.len() - 1;
    let mut out = String::with_capacity(raw.len());
    let mut empty_lines = 0;
    let mut joined = false;

    for (i, line) in lines.iter().enumerate() {
        let mut line = *line;
        if i > 0 {
            line = line.trim_start_matches(is_blank);
        }
        if i < last {
            line = trim_end_unescaped(line, double);
        }
        if i > 0 && i < last && line.is_empty() {
            empty_lines += 1;
            continue;
        }
        if i > 0 {
            if empty_lines > 0 {
                out.extend(std::iter::repeat('\n').take(empty_lines));
            } else if !joined {
                out.push(' ');
            }
            empty_lines = 0;
        }
        joined = false;
        if double && i < last && ends_with_unescaped_backslash(line) {
            line = &line[..line.len() - 1];
            joined = true;
        }
        out.push_str(line);
    }
    out
}

/// Trim trailing blanks, keeping one blank if it is escaped by a backslash.
fn trim_end_unescaped(line: &str, double: bool) -> &str {
    let trimmed = line.trim_end_matches(is_blank);
    if double && trimmed.len() < line.len() && ends_with_unescaped_backslash(trimmed) {
        &line[..=trimmed.len()]
    } else {
        trimmed
    }
}

/// Return whether `line` ends with an odd number of backslashes.
fn ends_with_unescaped_backslash(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Convert the body of a double-quoted scalar into its logical value.
///
/// Handles the named single-letter escapes of YAML 1.2 as well as `\xHH`, `\uHHHH` and
/// `\UHHHHHHHH`. Newlines (produced by line folding) are accepted as-is.
///
/// # Errors
/// Returns an [`EscapeError`] on unknown or malformed escapes, unescaped `"` and control
/// characters.
pub fn unescape_double_quoted(body: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escape = chars.next().ok_or(EscapeError::TruncatedEscape)?;
                match escape {
                    '0' => out.push('\0'),
                    'a' => out.push('\x07'),
                    'b' => out.push('\x08'),
                    't' | '\t' => out.push('\t'),
                    'n' => out.push('\n'),
                    'v' => out.push('\x0b'),
                    'f' => out.push('\x0c'),
                    'r' => out.push('\r'),
                    'e' => out.push('\x1b'),
                    ' ' => out.push(' '),
                    '"' => out.push('"'),
                    '/' => out.push('/'),
                    '\\' => out.push('\\'),
                    'N' => out.push('\u{85}'),
                    '_' => out.push('\u{a0}'),
                    'L' => out.push('\u{2028}'),
                    'P' => out.push('\u{2029}'),
                    'x' => out.push(read_hex(&mut chars, 'x', 2)?),
                    'u' => out.push(read_hex(&mut chars, 'u', 4)?),
                    'U' => out.push(read_hex(&mut chars, 'U', 8)?),
                    other => return Err(EscapeError::UnknownEscape(other)),
                }
            }
            '"' => return Err(EscapeError::UnescapedQuote('"')),
            '\n' => out.push('\n'),
            c if !is_json_char(c) => return Err(EscapeError::ControlCharacter(c)),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Read `len` hexadecimal digits and convert them to a character.
fn read_hex(chars: &mut std::str::Chars<'_>, escape: char, len: usize) -> Result<char, EscapeError> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.chars().count() < len {
        return Err(EscapeError::TruncatedEscape);
    }
    let mut value = 0u32;
    for digit in digits.chars() {
        let Some(d) = as_hex(digit) else {
            return Err(EscapeError::InvalidHex { escape, digits });
        };
        value = (value << 4) | d;
    }
    char::from_u32(value).ok_or(EscapeError::InvalidCodePoint(value))
}

/// Convert the body of a single-quoted scalar into its logical value.
///
/// `''` stands for a single `'`; no other escaping exists in this style.
///
/// # Errors
/// Returns an [`EscapeError`] if a lone `'` or a control character is found.
pub fn unescape_single_quoted(body: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            '\'' => return Err(EscapeError::UnescapedQuote('\'')),
            '\n' => out.push('\n'),
            c if !is_json_char(c) => return Err(EscapeError::ControlCharacter(c)),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Write `value` as a double-quoted scalar, quotes included.
///
/// # Errors
/// Returns an error if writing to `wr` fails.
pub fn write_double_quoted(wr: &mut dyn fmt::Write, value: &str) -> fmt::Result {
    wr.write_char('"')?;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        let named = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\0' => "\\0",
            '\x07' => "\\a",
            '\x08' => "\\b",
            '\t' => "\\t",
            '\n' => "\\n",
            '\x0b' => "\\v",
            '\x0c' => "\\f",
            '\r' => "\\r",
            '\x1b' => "\\e",
            '\u{85}' => "\\N",
            '\u{2028}' => "\\L",
            '\u{2029}' => "\\P",
            c if c < '\x20' || c == '\x7f' || !is_printable(c) => "",
            _ => continue,
        };
        if start < i {
            wr.write_str(&value[start..i])?;
        }
        if named.is_empty() {
            let code = u32::from(c);
            if code <= 0xff {
                write!(wr, "\\x{code:02x}")?;
            } else if code <= 0xffff {
                write!(wr, "\\u{code:04x}")?;
            } else {
                write!(wr, "\\U{code:08x}")?;
            }
        } else {
            wr.write_str(named)?;
        }
        start = i + c.len_utf8();
    }
    if start != value.len() {
        wr.write_str(&value[start..])?;
    }
    wr.write_char('"')
}

/// Return `value` escaped as a double-quoted scalar, quotes included.
#[must_use]
pub fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    // Writing into a `String` cannot fail.
    let _ = write_double_quoted(&mut out, value);
    out
}

/// Return `value` escaped as a single-quoted scalar, quotes included.
///
/// # Errors
/// Returns [`EscapeError::NotRepresentable`] if `value` contains a line break or a character
/// that is not printable, since the single-quoted style has no escapes for them.
pub fn escape_single_quoted(value: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\n' | '\r' => return Err(EscapeError::NotRepresentable(c)),
            c if !is_printable(c) => return Err(EscapeError::NotRepresentable(c)),
            c => out.push(c),
        }
    }
    out.push('\'');
    Ok(out)
}
