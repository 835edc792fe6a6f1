//! Holds functions to determine if a character belongs to a specific character set.

/// Check whether the character is nil (`\0`).
///
/// The tokenizer reads the end of its input as `\0`. A `\0` rune in the input ends the token it
/// is met in, and then becomes an unknown token of its own.
#[inline]
#[must_use]
pub fn is_z(c: char) -> bool {
    c == '\0'
}

/// Check whether the character is a line break (`\r` or `\n`).
#[inline]
#[must_use]
pub fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Check whether the character is nil or a line break (`\0`, `\r`, `\n`).
#[inline]
#[must_use]
pub fn is_breakz(c: char) -> bool {
    is_break(c) || is_z(c)
}

/// Check whether the character is a whitespace (` ` or `\t`).
#[inline]
#[must_use]
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Check whether the character is nil, a linebreak or a whitespace.
///
/// `\0`, ` `, `\t`, `\n`, `\r`
#[inline]
#[must_use]
pub fn is_blank_or_breakz(c: char) -> bool {
    is_blank(c) || is_breakz(c)
}

/// Check whether the character is an ascii digit.
#[inline]
#[must_use]
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Check whether the character is a digit, letter, `_` or `-`.
#[inline]
#[must_use]
pub fn is_alpha(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' | '-')
}

/// Check whether the character is a hexadecimal character (case insensitive).
#[inline]
#[must_use]
pub fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Convert the hexadecimal digit to an integer.
///
/// Returns [`None`] if `c` is not a hexadecimal digit.
#[inline]
#[must_use]
pub fn as_hex(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// Check whether the character is a YAML flow character (one of `,[]{}`).
#[inline]
#[must_use]
pub fn is_flow(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Check whether the character closes a flow collection (`]` or `}`).
#[inline]
#[must_use]
pub fn is_flow_end(c: char) -> bool {
    matches!(c, ']' | '}')
}

/// Check whether the character is the BOM character.
#[inline]
#[must_use]
pub fn is_bom(c: char) -> bool {
    c == '\u{FEFF}'
}

/// Check whether the character is a YAML non-breaking character.
#[inline]
#[must_use]
pub fn is_yaml_non_break(c: char) -> bool {
    is_printable(c) && !is_break(c) && !is_bom(c)
}

/// Check whether the character is NOT a YAML whitespace (` ` / `\t`).
#[inline]
#[must_use]
pub fn is_yaml_non_space(c: char) -> bool {
    is_yaml_non_break(c) && !is_blank(c)
}

/// Check whether the character is printable as per the YAML `c-printable` production.
#[inline]
#[must_use]
pub fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r' | '\x20'..='\x7e' | '\u{85}' | '\u{a0}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}')
}

/// Check whether the character may appear in a JSON string (`nb-json`).
#[inline]
#[must_use]
pub fn is_json_char(c: char) -> bool {
    c == '\t' || c >= '\x20'
}

/// Check whether the character is a valid YAML anchor name character.
#[inline]
#[must_use]
pub fn is_anchor_char(c: char) -> bool {
    is_yaml_non_space(c) && !is_flow(c) && !is_z(c)
}

/// Check whether the character is a valid word character.
#[inline]
#[must_use]
pub fn is_word_char(c: char) -> bool {
    is_alpha(c) && c != '_'
}

/// Check whether the character is a valid URI character.
#[inline]
#[must_use]
pub fn is_uri_char(c: char) -> bool {
    is_word_char(c) || "#;/?:@&=+$,_.!~*\'()[]%".contains(c)
}

/// Check whether the character is a valid tag character.
#[inline]
#[must_use]
pub fn is_tag_char(c: char) -> bool {
    is_uri_char(c) && !is_flow(c) && c != '!'
}

/// Check whether the character can follow a `\` in a double-quoted scalar.
///
/// The hexadecimal escapes (`x`, `u`, `U`) are included; their digits are checked separately.
#[inline]
#[must_use]
pub fn is_escape_char(c: char) -> bool {
    matches!(
        c,
        '0' | 'a' | 'b' | 't' | '\t' | 'n' | 'v' | 'f' | 'r' | 'e' | ' ' | '"' | '/' | '\\' | 'N'
            | '_' | 'L' | 'P' | 'x' | 'u' | 'U'
    )
}

/// A named set of characters a token's text may be checked against.
///
/// The discriminant is the slot of the charset in a token's conformance cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    /// Ascii decimal digits only.
    Decimal = 0,
    /// Word characters (`[0-9a-zA-Z-]`).
    Word = 1,
    /// URI characters, including `%`-escapes.
    Uri = 2,
    /// Tag characters: URI characters minus flow indicators and `!`.
    Tag = 3,
    /// Anchor and alias name characters.
    Anchor = 4,
    /// Characters that may appear in a plain scalar inside a flow collection.
    PlainSafe = 5,
    /// The body of a single-quoted scalar: JSON characters, with every `'` doubled.
    SingleQuoted = 6,
    /// The body of a double-quoted scalar: JSON characters, `"` only escaped, valid escapes.
    DoubleQuoted = 7,
}

impl Charset {
    /// All charsets, in cache slot order.
    pub const ALL: [Charset; 8] = [
        Charset::Decimal,
        Charset::Word,
        Charset::Uri,
        Charset::Tag,
        Charset::Anchor,
        Charset::PlainSafe,
        Charset::SingleQuoted,
        Charset::DoubleQuoted,
    ];

    /// Return whether every character of `text` belongs to `self`.
    ///
    /// The quoted charsets also validate quote doubling and escape sequences. An empty string
    /// conforms to the quoted charsets only.
    #[must_use]
    pub fn conforms(self, text: &str) -> bool {
        match self {
            Charset::Decimal => !text.is_empty() && text.chars().all(is_digit),
            Charset::Word => !text.is_empty() && text.chars().all(is_word_char),
            Charset::Uri => !text.is_empty() && conforms_uri(text, is_uri_char),
            Charset::Tag => !text.is_empty() && conforms_uri(text, is_tag_char),
            Charset::Anchor => !text.is_empty() && text.chars().all(is_anchor_char),
            Charset::PlainSafe => {
                !text.is_empty() && text.chars().all(|c| is_yaml_non_space(c) && !is_flow(c))
            }
            Charset::SingleQuoted => crate::escape::unescape_single_quoted(text).is_ok(),
            Charset::DoubleQuoted => crate::escape::unescape_double_quoted(text).is_ok(),
        }
    }
}

/// Check that `text` is made of characters accepted by `accept`, and that every `%` starts a
/// two-digit hexadecimal escape.
fn conforms_uri(text: &str, accept: fn(char) -> bool) -> bool {
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let (Some(hi), Some(lo)) = (chars.next(), chars.next()) else {
                return false;
            };
            if !is_hex(hi) || !is_hex(lo) {
                return false;
            }
        } else if !accept(c) {
            return false;
        }
    }
    true
}
