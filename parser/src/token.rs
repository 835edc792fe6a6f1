//! Tokens produced by the [`Tokenizer`](crate::Tokenizer).

use std::{cell::Cell, fmt};

use crate::char_traits::Charset;

/// A position in the input.
///
/// Rows start at 1. Columns are 1-indexed: the first rune of a line is at column 1, and a line
/// break moves the position to column 0 of the next row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// The line, starting at 1.
    pub row: usize,
    /// The column of the rune on its line, starting at 1.
    pub column: usize,
}

impl Position {
    /// The position before the first rune of the input.
    pub const START: Position = Position { row: 1, column: 0 };

    /// Create a new position.
    #[must_use]
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Return the position after consuming `c`.
    ///
    /// `\r\n` must be fed as a single line break, by calling this only for the `\r`.
    #[must_use]
    pub fn advance(self, c: char) -> Self {
        if c == '\n' || c == '\r' {
            Self {
                row: self.row + 1,
                column: 0,
            }
        } else {
            Self {
                row: self.row,
                column: self.column + 1,
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.row, self.column)
    }
}

/// The kind of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `-` introducing a block sequence entry.
    SequenceEntry,
    /// `?` introducing an explicit mapping key.
    MappingKey,
    /// `:` separating a key from its value.
    MappingValue,
    /// `,` separating flow collection entries.
    CollectEntry,
    /// `[`.
    SequenceStart,
    /// `]`.
    SequenceEnd,
    /// `{`.
    MappingStart,
    /// `}`.
    MappingEnd,
    /// `#` starting a comment. The comment text follows as a [`TokenKind::String`].
    Comment,
    /// `&name`.
    Anchor,
    /// `*name`.
    Alias,
    /// `!`. Tag handles and suffixes follow as [`TokenKind::String`] and further tags.
    Tag,
    /// `|` starting a literal block scalar.
    Literal,
    /// `>` starting a folded block scalar.
    Folded,
    /// `'`, opening or closing.
    SingleQuote,
    /// `"`, opening or closing.
    DoubleQuote,
    /// `%` starting a directive.
    Directive,
    /// `\n`, `\r` or `\r\n`.
    LineBreak,
    /// A single space.
    Space,
    /// A single tab.
    Tab,
    /// The byte order mark.
    Bom,
    /// The end of the input. Repeated forever once reached.
    Eof,
    /// `...`.
    DocumentEnd,
    /// `---`.
    DirectiveEnd,
    /// Scalar content, comment text or directive parameters.
    String,
    /// `-` after a block scalar indicator.
    StripChomping,
    /// `+` after a block scalar indicator.
    KeepChomping,
    /// Anything the tokenizer could not make sense of.
    Unknown,
}

impl TokenKind {
    /// Return whether a word may start right after a token of this kind in block context.
    ///
    /// `None` stands for the start of the stream.
    #[must_use]
    pub fn may_precede_word(kind: Option<TokenKind>) -> bool {
        matches!(
            kind,
            None | Some(
                TokenKind::Space
                    | TokenKind::Tab
                    | TokenKind::LineBreak
                    | TokenKind::Bom
                    | TokenKind::DirectiveEnd
            )
        )
    }

    /// Return whether a word may start right after a token of this kind in flow context.
    ///
    /// In addition to [`TokenKind::may_precede_word`], opening flow indicators and entry
    /// separators are accepted.
    #[must_use]
    pub fn may_precede_word_in_flow(kind: Option<TokenKind>) -> bool {
        Self::may_precede_word(kind)
            || matches!(
                kind,
                Some(TokenKind::SequenceStart | TokenKind::MappingStart | TokenKind::CollectEntry)
            )
    }

    /// Return whether the kind is a space, a tab or a line break.
    #[must_use]
    pub fn is_whitespace(self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Tab | TokenKind::LineBreak)
    }

    /// Return whether the kind is one of the delimiters tracked by the parser's balance checker.
    #[must_use]
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            TokenKind::SequenceStart
                | TokenKind::SequenceEnd
                | TokenKind::MappingStart
                | TokenKind::MappingEnd
                | TokenKind::SingleQuote
                | TokenKind::DoubleQuote
        )
    }
}

/// The memoized results of charset conformance checks for a token.
///
/// Each [`Charset`] takes 2 bits: unknown, conforms or does not conform.
#[derive(Clone, Default)]
pub struct ConformanceCache(Cell<u16>);

// The cache never changes the meaning of a token, so it is ignored when comparing tokens.
impl PartialEq for ConformanceCache {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for ConformanceCache {}

impl ConformanceCache {
    const UNKNOWN: u16 = 0b00;
    const CONFORMS: u16 = 0b01;
    const DIFFERS: u16 = 0b10;

    /// Return the memoized result for `charset`, if any.
    #[must_use]
    pub fn get(&self, charset: Charset) -> Option<bool> {
        match (self.0.get() >> Self::shift(charset)) & 0b11 {
            Self::CONFORMS => Some(true),
            Self::DIFFERS => Some(false),
            _ => None,
        }
    }

    /// Memoize the result for `charset`.
    pub fn set(&self, charset: Charset, conforms: bool) {
        let shift = Self::shift(charset);
        let bits = if conforms { Self::CONFORMS } else { Self::DIFFERS };
        let cleared = self.0.get() & !(0b11 << shift);
        self.0.set(cleared | (bits << shift));
    }

    /// Forget every memoized result.
    pub fn clear(&self) {
        self.0.set(Self::UNKNOWN);
    }

    fn shift(charset: Charset) -> u16 {
        (charset as u16) * 2
    }
}

impl fmt::Debug for ConformanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for charset in Charset::ALL {
            if let Some(conforms) = self.get(charset) {
                list.entry(&charset, &conforms);
            }
        }
        list.finish()
    }
}

/// A token of YAML text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// What the token represents.
    pub kind: TokenKind,
    /// Position of the first rune of the token.
    pub start: Position,
    /// Position of the last rune of the token.
    pub end: Position,
    /// The runes of the token, as found in the input.
    pub origin: String,
    /// Memoized charset checks on `origin`.
    conformance: ConformanceCache,
}

impl Token {
    /// Create a new token.
    #[must_use]
    pub fn new(kind: TokenKind, start: Position, end: Position, origin: String) -> Self {
        Self {
            kind,
            start,
            end,
            origin,
            conformance: ConformanceCache::default(),
        }
    }

    /// Return whether the origin of the token conforms to `charset`.
    ///
    /// The check is computed once per charset and memoized in the token.
    #[must_use]
    pub fn conforms(&self, charset: Charset) -> bool {
        if let Some(conforms) = self.conformance.get(charset) {
            return conforms;
        }
        let conforms = charset.conforms(&self.origin);
        self.conformance.set(charset, conforms);
        conforms
    }

    /// Return the memoized conformance results of the token.
    #[must_use]
    pub fn conformance_cache(&self) -> &ConformanceCache {
        &self.conformance
    }

    /// Return whether the token is of the given kind.
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}({:?}) {}:{}-{}:{}",
            self.kind,
            self.origin,
            self.start.row,
            self.start.column,
            self.end.row,
            self.end.column
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conformance_is_memoized() {
        let token = Token::new(
            TokenKind::String,
            Position::new(1, 1),
            Position::new(1, 3),
            "123".into(),
        );
        assert_eq!(token.conformance_cache().get(Charset::Decimal), None);
        assert!(token.conforms(Charset::Decimal));
        assert!(token.conforms(Charset::Anchor));
        assert!(!token.conforms(Charset::Uri) || token.conforms(Charset::Word));
        assert_eq!(token.conformance_cache().get(Charset::Decimal), Some(true));
        assert_eq!(token.conformance_cache().get(Charset::Word), None);

        let cache = ConformanceCache::default();
        cache.set(Charset::Tag, false);
        cache.set(Charset::Tag, true);
        cache.set(Charset::DoubleQuoted, false);
        assert_eq!(cache.get(Charset::Tag), Some(true));
        assert_eq!(cache.get(Charset::DoubleQuoted), Some(false));
        cache.clear();
        assert_eq!(cache.get(Charset::Tag), None);
    }

    #[test]
    fn positions() {
        let p = Position::START.advance('a');
        assert_eq!(p, Position::new(1, 1));
        let p = p.advance('\n');
        assert_eq!(p, Position::new(2, 0));
        assert_eq!(p.advance('b').to_string(), "line 2 column 1");
    }
}
