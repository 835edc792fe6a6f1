//! The parser: a recursive descent over the token stream, building a [`Node`] tree.
//!
//! Tokens are pulled through an [`Accessor`] so that the parser can look ahead (to tell an
//! implicit mapping key from a scalar, or a plain scalar continuation line from the next node)
//! and rewind. Flow indicators and quotes are fed to a [`BalanceChecker`] as they are consumed;
//! unbalanced input is reported as [`ParseErrorKind::Unbalanced`].

use std::cell::RefCell;

use hashlink::LinkedHashMap;
use thiserror::Error;

use crate::{
    accessor::{Accessor, ResourceStream},
    ast::{Node, Quoting},
    balance::{BalanceChecker, Memento},
    escape::{fold_quoted_lines, unescape_double_quoted, unescape_single_quoted, EscapeError},
    input::{RunePool, RuneStream},
    token::{Position, Token, TokenKind},
    tokenizer::Tokenizer,
};

/// The tag prefix the `!!` handle resolves to, unless overridden by a `%TAG` directive.
const DEFAULT_SECONDARY_PREFIX: &str = "tag:yaml.org,2002:";

/// How deep block nodes and flow collections may nest.
pub const MAX_NESTING: usize = 128;

/// The delimiter pairs tracked by the balance checker.
const DELIMITERS: [(TokenKind, TokenKind); 4] = [
    (TokenKind::SequenceStart, TokenKind::SequenceEnd),
    (TokenKind::MappingStart, TokenKind::MappingEnd),
    (TokenKind::SingleQuote, TokenKind::SingleQuote),
    (TokenKind::DoubleQuote, TokenKind::DoubleQuote),
];

/// The reason a [`ParseError`] was raised.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A flow indicator or quote was never closed, or closed the wrong opener.
    #[error("unbalanced `{0}`")]
    Unbalanced(char),
    /// A token that cannot appear here was found.
    #[error("expected {expected}, found {found:?}")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: &'static str,
        /// The kind of the offending token.
        found: TokenKind,
    },
    /// A `:` was found after a scalar on a line where no mapping can start.
    #[error("mapping values are not allowed in this context")]
    MappingValueNotAllowed,
    /// A line is indented in a way that matches none of the enclosing collections.
    #[error("invalid indentation")]
    BadIndentation,
    /// A node was given two anchors or two tags.
    #[error("a node may only have one {0}")]
    DuplicateProperty(&'static str),
    /// A tag used a named handle that no `%TAG` directive declared.
    #[error("undefined tag handle `{0}`")]
    UndefinedTagHandle(String),
    /// Nodes are nested deeper than [`MAX_NESTING`].
    #[error("nodes nested deeper than {} levels", MAX_NESTING)]
    NestingLimit,
    /// A block scalar header was malformed.
    #[error("invalid block scalar header")]
    BlockScalarHeader,
    /// A quoted scalar could not be unescaped.
    #[error(transparent)]
    Escape(#[from] EscapeError),
    /// A document was followed by something that is neither a document marker nor the end of
    /// the input.
    #[error("unexpected content after the end of the document")]
    TrailingContent,
}

/// An error raised while parsing.
///
/// ```
/// # use yamlet_parser::parse_str;
/// let error = parse_str("key: [1, 2]]").unwrap_err();
/// assert_eq!(error.info(), "unbalanced `]`");
/// assert_eq!(error.to_string(), "unbalanced `]` at line 1 column 12");
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} at {position}")]
pub struct ParseError {
    kind: ParseErrorKind,
    position: Position,
}

impl ParseError {
    /// Create a new error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// Return the reason of the error.
    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Return where the error was detected.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Return a human-readable description of the error, without its position.
    #[must_use]
    pub fn info(&self) -> String {
        self.kind.to_string()
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Chomping of the trailing line breaks of a block scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chomping {
    /// Keep a single trailing line break.
    Clip,
    /// Remove every trailing line break.
    Strip,
    /// Keep every trailing line break.
    Keep,
}

/// A position in the token stream the parser can go back to.
struct Mark {
    current: Token,
    memento: Memento,
    line_indent: isize,
    line_start: bool,
}

/// A YAML parser, building a [`Node::Stream`] from a stream of runes.
pub struct Parser<S> {
    /// The tokens, with checkpointing for lookahead.
    tokens: Accessor<Token, Tokenizer<S>>,
    /// The next token to process.
    current: Token,
    /// Tracks flow indicators and quotes.
    balance: BalanceChecker<TokenKind>,
    /// `%TAG` handles of the current document.
    tag_handles: LinkedHashMap<String, String>,
    /// `%TAG` handles declared for the next document.
    pending_handles: LinkedHashMap<String, String>,
    /// Indentation of the current line, `-1` if it starts with `---`.
    line_indent: isize,
    /// Whether only indentation was consumed on the current line.
    line_start: bool,
    /// The number of block nodes and flow collections being parsed.
    depth: usize,
}

impl Parser<RuneStream> {
    /// Create a parser over a string.
    #[must_use]
    pub fn new_from_str(input: &str) -> Self {
        Self::new(RuneStream::from(input))
    }
}

impl<S: ResourceStream<Option<char>>> Parser<S> {
    /// Create a parser pulling runes from `stream`.
    pub fn new(stream: S) -> Self {
        let mut tokens = Accessor::new(Tokenizer::new(stream));
        let current = tokens.next();
        Self {
            tokens,
            current,
            balance: BalanceChecker::new(&DELIMITERS),
            tag_handles: LinkedHashMap::new(),
            pending_handles: LinkedHashMap::new(),
            line_indent: 0,
            line_start: true,
            depth: 0,
        }
    }

    /// Consume the parser, returning its rune stream.
    pub fn into_inner(self) -> S {
        self.tokens.into_inner().into_inner()
    }

    /// Parse the whole input into a [`Node::Stream`].
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the input is not valid YAML.
    pub fn parse(&mut self) -> Result<Node> {
        let mut documents = Vec::new();
        loop {
            self.skip_whitespace()?;
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::Directive => self.parse_directive()?,
                TokenKind::DocumentEnd => {
                    self.bump()?;
                }
                TokenKind::DirectiveEnd => {
                    self.bump()?;
                    documents.push(self.parse_document(true)?);
                }
                _ => documents.push(self.parse_document(false)?),
            }
        }
        if !self.balance.is_balanced() {
            return Err(self.unbalanced());
        }
        Ok(Node::Stream { documents })
    }

    /// Return the kind of the current token.
    fn kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Return the indentation of the current token, assuming it is the first of its line.
    fn indent(&self) -> isize {
        isize::try_from(self.current.start.column).unwrap_or(isize::MAX) - 1
    }

    /// Consume the current token, returning it.
    fn bump(&mut self) -> Result<Token> {
        let next = self.tokens.next();
        let token = std::mem::replace(&mut self.current, next);
        self.track_line(token.kind);
        if token.kind.is_delimiter() && !self.balance.add(token.kind) {
            return Err(ParseError::new(
                ParseErrorKind::Unbalanced(token.origin.chars().next().unwrap_or('?')),
                token.start,
            ));
        }
        Ok(token)
    }

    /// Update the indentation of the current line after consuming a token of kind `kind`.
    fn track_line(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::LineBreak => {
                self.line_indent = 0;
                self.line_start = true;
            }
            TokenKind::Space if self.line_start => self.line_indent += 1,
            TokenKind::DirectiveEnd if self.line_start => {
                self.line_indent = -1;
                self.line_start = false;
            }
            TokenKind::Bom => {}
            _ => self.line_start = false,
        }
    }

    /// Enter a nested production, failing past [`MAX_NESTING`]. Each call is paired with a
    /// decrement of `depth`.
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::new(
                ParseErrorKind::NestingLimit,
                self.current.start,
            ));
        }
        Ok(())
    }

    fn mark(&mut self) -> Mark {
        self.tokens.set_checkpoint();
        Mark {
            current: self.current.clone(),
            memento: self.balance.memento(),
            line_indent: self.line_indent,
            line_start: self.line_start,
        }
    }

    fn restore(&mut self, mark: Mark) {
        self.tokens.rewind();
        self.current = mark.current;
        self.balance.set_memento(mark.memento);
        self.line_indent = mark.line_indent;
        self.line_start = mark.line_start;
        self.forget_if_unmarked();
    }

    fn commit(&mut self, mark: Mark) {
        drop(mark);
        self.tokens.commit();
        self.forget_if_unmarked();
    }

    fn forget_if_unmarked(&mut self) {
        if self.tokens.depth() == 0 {
            self.balance.forget_mementos();
        }
    }

    /// Skip spaces, tabs, comments and line breaks. Returns whether a line break was crossed.
    fn skip_whitespace(&mut self) -> Result<bool> {
        let mut crossed = false;
        loop {
            match self.kind() {
                TokenKind::Space | TokenKind::Tab | TokenKind::Bom => {}
                TokenKind::LineBreak => crossed = true,
                TokenKind::Comment => {
                    self.bump()?;
                    if self.kind() == TokenKind::String {
                        self.bump()?;
                    }
                    continue;
                }
                _ => return Ok(crossed),
            }
            self.bump()?;
        }
    }

    /// Skip spaces and tabs.
    fn skip_blanks(&mut self) -> Result<()> {
        while matches!(self.kind(), TokenKind::Space | TokenKind::Tab) {
            self.bump()?;
        }
        Ok(())
    }

    /// Return whether the current token ends a document.
    fn at_document_boundary(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Eof | TokenKind::DocumentEnd | TokenKind::DirectiveEnd
        )
    }

    /// Build an error for an unexpected current token.
    fn unexpected(&self, expected: &'static str) -> ParseError {
        let kind = self.kind();
        if kind == TokenKind::Eof && !self.balance.is_balanced() {
            return self.unbalanced();
        }
        if matches!(kind, TokenKind::SequenceEnd | TokenKind::MappingEnd) {
            let mut balance = self.balance.clone();
            if !balance.add(kind) {
                return ParseError::new(
                    ParseErrorKind::Unbalanced(self.current.origin.chars().next().unwrap_or('?')),
                    self.current.start,
                );
            }
        }
        if kind == TokenKind::MappingValue {
            return ParseError::new(ParseErrorKind::MappingValueNotAllowed, self.current.start);
        }
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected,
                found: kind,
            },
            self.current.start,
        )
    }

    /// Build an error for the innermost delimiter that was never closed.
    fn unbalanced(&self) -> ParseError {
        let delimiter = match self.balance.peek_last_unbalanced() {
            Some(TokenKind::SequenceStart) => '[',
            Some(TokenKind::MappingStart) => '{',
            Some(TokenKind::SingleQuote) => '\'',
            Some(TokenKind::DoubleQuote) => '"',
            _ => '?',
        };
        ParseError::new(ParseErrorKind::Unbalanced(delimiter), self.current.start)
    }

    /// Parse a `%` directive. Only `%TAG` has an effect.
    fn parse_directive(&mut self) -> Result<()> {
        self.bump()?;
        if self.kind() == TokenKind::String {
            let text = self.bump()?.origin;
            let mut words = text.split_whitespace();
            if words.next() == Some("TAG") {
                if let (Some(handle), Some(prefix)) = (words.next(), words.next()) {
                    debug_print!("%TAG {handle} {prefix}");
                    self.pending_handles
                        .insert(handle.to_owned(), prefix.to_owned());
                }
            }
        }
        Ok(())
    }

    /// Parse one document, after its `---` if `explicit`.
    fn parse_document(&mut self, explicit: bool) -> Result<Node> {
        self.tag_handles = std::mem::take(&mut self.pending_handles);
        let crossed = self.skip_whitespace()?;
        let node = if self.at_document_boundary() || self.kind() == TokenKind::Directive {
            Node::null()
        } else {
            self.parse_block_node(-1, !explicit || crossed, false)?
        };
        self.skip_whitespace()?;
        match self.kind() {
            TokenKind::Eof | TokenKind::DirectiveEnd => {}
            TokenKind::DocumentEnd => {
                self.bump()?;
            }
            TokenKind::SequenceEnd | TokenKind::MappingEnd => {
                return Err(self.unexpected("the end of the document"))
            }
            TokenKind::MappingValue => {
                return Err(ParseError::new(
                    ParseErrorKind::MappingValueNotAllowed,
                    self.current.start,
                ))
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::TrailingContent,
                    self.current.start,
                ))
            }
        }
        self.tag_handles.clear();
        Ok(node)
    }

    /// Look ahead for an implicit mapping key: a single-line node followed by a `:`.
    fn is_implicit_key(&mut self) -> bool {
        if !matches!(
            self.kind(),
            TokenKind::String
                | TokenKind::Anchor
                | TokenKind::Alias
                | TokenKind::Tag
                | TokenKind::SingleQuote
                | TokenKind::DoubleQuote
                | TokenKind::SequenceStart
                | TokenKind::MappingStart
        ) {
            return false;
        }
        let mark = self.mark();
        let mut depth = 0usize;
        let found = loop {
            match self.kind() {
                TokenKind::MappingValue if depth == 0 => break true,
                TokenKind::Eof
                | TokenKind::LineBreak
                | TokenKind::DocumentEnd
                | TokenKind::DirectiveEnd => break false,
                TokenKind::Comment if depth == 0 => break false,
                TokenKind::SequenceStart | TokenKind::MappingStart => depth += 1,
                TokenKind::SequenceEnd | TokenKind::MappingEnd => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            if self.bump().is_err() {
                break false;
            }
        };
        self.restore(mark);
        found
    }

    /// Parse a node in block context.
    ///
    /// `parent` is the indentation of the enclosing collection. Block collections may start
    /// only if `allow_collection` is set. A block sequence may sit at the indentation of its
    /// parent if `sequence_at_parent` is set (the value of a block mapping entry).
    fn parse_block_node(
        &mut self,
        parent: isize,
        allow_collection: bool,
        sequence_at_parent: bool,
    ) -> Result<Node> {
        let node = self
            .enter()
            .and_then(|()| self.block_node(parent, allow_collection, sequence_at_parent));
        self.depth -= 1;
        node
    }

    fn block_node(
        &mut self,
        parent: isize,
        mut allow_collection: bool,
        sequence_at_parent: bool,
    ) -> Result<Node> {
        debug_print!("block node (parent {parent}) at {}", self.current);
        let mut tag = None;
        let mut anchor = None;
        loop {
            if allow_collection && self.is_implicit_key() {
                let indent = self.indent();
                return Ok(self
                    .parse_block_mapping(indent)?
                    .with_properties(tag, anchor));
            }
            match self.kind() {
                TokenKind::Anchor => {
                    if anchor.is_some() {
                        return Err(self.duplicate("anchor"));
                    }
                    anchor = Some(self.bump()?.origin[1..].to_owned());
                }
                TokenKind::Tag => {
                    if tag.is_some() {
                        return Err(self.duplicate("tag"));
                    }
                    tag = Some(self.parse_tag()?);
                }
                _ => break,
            }
            if self.skip_whitespace()? {
                allow_collection = true;
                let indent = self.indent();
                let sequence_here = sequence_at_parent
                    && self.kind() == TokenKind::SequenceEntry
                    && indent == parent;
                if self.at_document_boundary() || (indent <= parent && !sequence_here) {
                    return Ok(Node::null().with_properties(tag, anchor));
                }
            }
        }

        let node = match self.kind() {
            TokenKind::Eof | TokenKind::DocumentEnd | TokenKind::DirectiveEnd => Node::null(),
            TokenKind::Alias => {
                let alias = self.bump()?;
                return Ok(Node::Alias {
                    text: alias.origin[1..].to_owned(),
                });
            }
            TokenKind::SequenceEntry if allow_collection => {
                let indent = self.indent();
                self.parse_block_sequence(indent)?
            }
            TokenKind::MappingKey | TokenKind::MappingValue if allow_collection => {
                let indent = self.indent();
                self.parse_block_mapping(indent)?
            }
            TokenKind::Literal | TokenKind::Folded => self.parse_block_scalar()?,
            TokenKind::SequenceStart | TokenKind::MappingStart => self.parse_flow_collection()?,
            TokenKind::SingleQuote | TokenKind::DoubleQuote => self.parse_quoted()?,
            TokenKind::String => {
                Node::scalar(self.parse_plain(parent, false, true)?, Quoting::None)
            }
            _ => return Err(self.unexpected("a node")),
        };
        Ok(node.with_properties(tag, anchor))
    }

    /// Parse a block sequence whose entries are at indentation `indent`.
    fn parse_block_sequence(&mut self, indent: isize) -> Result<Node> {
        let mut entries = Vec::new();
        loop {
            // The current token is a `-` at `indent`.
            self.bump()?;
            let crossed = self.skip_whitespace()?;
            let entry = if self.at_document_boundary() || (crossed && self.indent() <= indent) {
                Node::null()
            } else {
                self.parse_block_node(indent, true, false)?
            };
            entries.push(entry);

            self.skip_whitespace()?;
            if self.at_document_boundary() {
                break;
            }
            if !self.line_start {
                return Err(self.unexpected("a line break"));
            }
            let next = self.indent();
            if next == indent && self.kind() == TokenKind::SequenceEntry {
                continue;
            }
            if next > indent {
                return Err(ParseError::new(
                    ParseErrorKind::BadIndentation,
                    self.current.start,
                ));
            }
            break;
        }
        Ok(Node::sequence(entries))
    }

    /// Parse a block mapping whose keys are at indentation `indent`.
    fn parse_block_mapping(&mut self, indent: isize) -> Result<Node> {
        let mut entries = Vec::new();
        loop {
            let (key, value) = match self.kind() {
                TokenKind::MappingKey => {
                    self.bump()?;
                    let crossed = self.skip_whitespace()?;
                    let key = if self.at_document_boundary()
                        || (crossed && self.indent() <= indent)
                        || self.kind() == TokenKind::MappingValue
                    {
                        Node::null()
                    } else {
                        self.parse_block_node(indent, true, false)?
                    };
                    self.skip_whitespace()?;
                    let value = if self.kind() == TokenKind::MappingValue
                        && (self.indent() == indent || !self.line_start)
                    {
                        self.bump()?;
                        self.parse_block_value(indent)?
                    } else {
                        Node::null()
                    };
                    (key, value)
                }
                TokenKind::MappingValue => {
                    self.bump()?;
                    (Node::null(), self.parse_block_value(indent)?)
                }
                _ if self.is_implicit_key() => {
                    let key = self.parse_implicit_key(indent)?;
                    self.skip_blanks()?;
                    if self.kind() != TokenKind::MappingValue {
                        return Err(self.unexpected("`:`"));
                    }
                    self.bump()?;
                    (key, self.parse_block_value(indent)?)
                }
                _ => return Err(self.unexpected("a mapping key")),
            };
            entries.push((key, value));

            self.skip_whitespace()?;
            if self.at_document_boundary() {
                break;
            }
            if !self.line_start {
                return Err(self.unexpected("a line break"));
            }
            let next = self.indent();
            if next == indent {
                continue;
            }
            if next > indent {
                return Err(ParseError::new(
                    ParseErrorKind::BadIndentation,
                    self.current.start,
                ));
            }
            break;
        }
        Ok(Node::mapping(entries))
    }

    /// Parse the value of a block mapping entry, after its `:`.
    fn parse_block_value(&mut self, indent: isize) -> Result<Node> {
        let crossed = self.skip_whitespace()?;
        if self.at_document_boundary() {
            return Ok(Node::null());
        }
        if crossed {
            let next = self.indent();
            let sequence_here = self.kind() == TokenKind::SequenceEntry && next == indent;
            if next <= indent && !sequence_here {
                return Ok(Node::null());
            }
        }
        self.parse_block_node(indent, crossed, true)
    }

    /// Parse an implicit key: a node that fits on a single line.
    fn parse_implicit_key(&mut self, indent: isize) -> Result<Node> {
        let mut tag = None;
        let mut anchor = None;
        loop {
            match self.kind() {
                TokenKind::Anchor => anchor = Some(self.bump()?.origin[1..].to_owned()),
                TokenKind::Tag => tag = Some(self.parse_tag()?),
                _ => break,
            }
            self.skip_blanks()?;
        }
        let node = match self.kind() {
            TokenKind::Alias => {
                let alias = self.bump()?;
                return Ok(Node::Alias {
                    text: alias.origin[1..].to_owned(),
                });
            }
            TokenKind::SingleQuote | TokenKind::DoubleQuote => self.parse_quoted()?,
            TokenKind::SequenceStart | TokenKind::MappingStart => self.parse_flow_collection()?,
            TokenKind::MappingValue => Node::null(),
            _ => Node::scalar(self.parse_plain(indent, false, false)?, Quoting::None),
        };
        Ok(node.with_properties(tag, anchor))
    }

    fn duplicate(&self, property: &'static str) -> ParseError {
        ParseError::new(
            ParseErrorKind::DuplicateProperty(property),
            self.current.start,
        )
    }

    /// Parse a tag and resolve its handle.
    fn parse_tag(&mut self) -> Result<String> {
        let start = self.bump()?.start;
        if self.kind() == TokenKind::Tag {
            // `!!suffix`
            self.bump()?;
            let suffix = self.tag_suffix()?;
            let prefix = self
                .tag_handles
                .get("!!")
                .map_or(DEFAULT_SECONDARY_PREFIX, String::as_str);
            return Ok(format!("{prefix}{suffix}"));
        }
        if self.kind() != TokenKind::String {
            // The non-specific tag `!`.
            return Ok("!".to_owned());
        }
        let text = self.bump()?.origin;
        if self.kind() == TokenKind::Tag {
            // `!name!suffix`
            self.bump()?;
            let handle = format!("!{text}!");
            let suffix = self.tag_suffix()?;
            return match self.tag_handles.get(&handle) {
                Some(prefix) => Ok(format!("{prefix}{suffix}")),
                None => Err(ParseError::new(
                    ParseErrorKind::UndefinedTagHandle(handle),
                    start,
                )),
            };
        }
        if let Some(verbatim) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return Ok(verbatim.to_owned());
        }
        match self.tag_handles.get("!") {
            Some(prefix) => Ok(format!("{prefix}{text}")),
            None => Ok(format!("!{text}")),
        }
    }

    fn tag_suffix(&mut self) -> Result<String> {
        if self.kind() == TokenKind::String {
            Ok(self.bump()?.origin)
        } else {
            Ok(String::new())
        }
    }

    /// Parse a plain scalar, folding continuation lines.
    ///
    /// Continuation lines must be indented more than `parent` in block context. Only the
    /// current line is read if `multiline` is unset.
    fn parse_plain(&mut self, parent: isize, flow: bool, multiline: bool) -> Result<String> {
        let mut text = String::new();
        loop {
            let mut line = String::new();
            while is_plain_text(self.kind(), flow) {
                line.push_str(&self.bump()?.origin);
            }
            text.push_str(line.trim_end_matches([' ', '\t']));

            if !multiline || self.kind() != TokenKind::LineBreak {
                break;
            }
            let mark = self.mark();
            let mut breaks = 0;
            while matches!(
                self.kind(),
                TokenKind::LineBreak | TokenKind::Space | TokenKind::Tab
            ) {
                if self.kind() == TokenKind::LineBreak {
                    breaks += 1;
                }
                self.bump()?;
            }
            let continues = is_plain_text(self.kind(), flow)
                && !self.kind().is_whitespace()
                && (flow || self.indent() > parent);
            if !continues {
                self.restore(mark);
                break;
            }
            self.commit(mark);
            if breaks == 1 {
                text.push(' ');
            } else {
                text.extend(std::iter::repeat('\n').take(breaks - 1));
            }
        }
        Ok(text)
    }

    /// Parse a single- or double-quoted scalar.
    fn parse_quoted(&mut self) -> Result<Node> {
        let open = self.bump()?;
        let double = open.kind == TokenKind::DoubleQuote;
        let mut raw = String::new();
        loop {
            match self.kind() {
                kind if kind == open.kind => {
                    self.bump()?;
                    break;
                }
                TokenKind::LineBreak => {
                    raw.push('\n');
                    self.bump()?;
                }
                TokenKind::Eof => return Err(self.unexpected("a closing quote")),
                _ => raw.push_str(&self.bump()?.origin),
            }
        }
        let folded = fold_quoted_lines(&raw, double);
        let text = if double {
            unescape_double_quoted(&folded)
        } else {
            unescape_single_quoted(&folded)
        }
        .map_err(|e| ParseError::new(e.into(), open.start))?;
        Ok(Node::scalar(
            text,
            if double {
                Quoting::Double
            } else {
                Quoting::Single
            },
        ))
    }

    /// Parse a `|` or `>` block scalar.
    fn parse_block_scalar(&mut self) -> Result<Node> {
        let parent = self.line_indent;
        let indicator = self.bump()?;
        let literal = indicator.kind == TokenKind::Literal;
        let mut chomping = Chomping::Clip;
        let mut explicit = None;
        loop {
            match self.kind() {
                TokenKind::StripChomping => chomping = Chomping::Strip,
                TokenKind::KeepChomping => chomping = Chomping::Keep,
                TokenKind::String => {
                    let digit = self
                        .current
                        .origin
                        .parse::<isize>()
                        .ok()
                        .filter(|d| (1..=9).contains(d))
                        .ok_or_else(|| {
                            ParseError::new(ParseErrorKind::BlockScalarHeader, self.current.start)
                        })?;
                    explicit = Some(digit);
                }
                TokenKind::Space | TokenKind::Tab => {}
                TokenKind::Comment => {
                    self.bump()?;
                    if self.kind() == TokenKind::String {
                        self.bump()?;
                    }
                    continue;
                }
                TokenKind::LineBreak => {
                    self.bump()?;
                    break;
                }
                TokenKind::Eof => break,
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::BlockScalarHeader,
                        self.current.start,
                    ))
                }
            }
            self.bump()?;
        }

        let mut content_indent = explicit.map(|d| (parent + d).max(0));
        // `None` stands for an empty line.
        let mut lines: Vec<Option<String>> = Vec::new();
        loop {
            let mark = self.mark();
            let mut spaces = 0isize;
            while self.kind() == TokenKind::Space {
                spaces += 1;
                self.bump()?;
            }
            match self.kind() {
                TokenKind::LineBreak | TokenKind::Eof => {
                    let extra = content_indent.map_or(0, |ci| spaces - ci);
                    let at_eof = self.kind() == TokenKind::Eof;
                    if extra > 0 {
                        lines.push(Some(" ".repeat(extra.unsigned_abs())));
                    } else if !at_eof {
                        lines.push(None);
                    }
                    if at_eof {
                        self.commit(mark);
                        break;
                    }
                    self.bump()?;
                    self.commit(mark);
                }
                TokenKind::String => {
                    let ci = *content_indent.get_or_insert(spaces);
                    if spaces < ci || spaces <= parent {
                        self.restore(mark);
                        break;
                    }
                    let mut line = " ".repeat((spaces - ci).unsigned_abs());
                    line.push_str(&self.bump()?.origin);
                    lines.push(Some(line));
                    self.commit(mark);
                    match self.kind() {
                        TokenKind::LineBreak => {
                            self.bump()?;
                        }
                        TokenKind::Eof => break,
                        _ => return Err(self.unexpected("a line break")),
                    }
                }
                _ => {
                    self.restore(mark);
                    break;
                }
            }
        }

        let text = if literal {
            join_literal(&lines, chomping)
        } else {
            join_folded(&lines, chomping)
        };
        Ok(Node::scalar(
            text,
            if literal {
                Quoting::Literal
            } else {
                Quoting::Folded
            },
        ))
    }

    /// Parse a `[...]` or `{...}` collection.
    fn parse_flow_collection(&mut self) -> Result<Node> {
        let node = self.enter().and_then(|()| self.flow_collection());
        self.depth -= 1;
        node
    }

    fn flow_collection(&mut self) -> Result<Node> {
        let open = self.bump()?;
        let sequence = open.kind == TokenKind::SequenceStart;
        let close = if sequence {
            TokenKind::SequenceEnd
        } else {
            TokenKind::MappingEnd
        };
        let mut entries = Vec::new();
        let mut pairs = Vec::new();
        loop {
            self.skip_whitespace()?;
            if self.kind() == close {
                self.bump()?;
                break;
            }
            let explicit = self.kind() == TokenKind::MappingKey;
            if explicit {
                self.bump()?;
                self.skip_whitespace()?;
            }
            let key = if matches!(
                self.kind(),
                TokenKind::MappingValue | TokenKind::CollectEntry
            ) || self.kind() == close
            {
                Node::null()
            } else {
                self.parse_flow_node()?
            };
            self.skip_whitespace()?;
            let value = if self.kind() == TokenKind::MappingValue {
                self.bump()?;
                self.skip_whitespace()?;
                if self.kind() == TokenKind::CollectEntry || self.kind() == close {
                    Some(Node::null())
                } else {
                    Some(self.parse_flow_node()?)
                }
            } else if explicit || !sequence {
                Some(Node::null())
            } else {
                None
            };
            match (sequence, value) {
                (true, Some(value)) => entries.push(Node::mapping(vec![(key, value)])),
                (true, None) => entries.push(key),
                (false, value) => pairs.push((key, value.unwrap_or_else(Node::null))),
            }
            self.skip_whitespace()?;
            match self.kind() {
                TokenKind::CollectEntry => {
                    self.bump()?;
                }
                kind if kind == close => {
                    self.bump()?;
                    break;
                }
                _ => {
                    return Err(self.unexpected(if sequence {
                        "`,` or `]`"
                    } else {
                        "`,` or `}`"
                    }))
                }
            }
        }
        Ok(if sequence {
            Node::sequence(entries)
        } else {
            Node::mapping(pairs)
        })
    }

    /// Parse a node inside a flow collection.
    fn parse_flow_node(&mut self) -> Result<Node> {
        let mut tag = None;
        let mut anchor = None;
        loop {
            match self.kind() {
                TokenKind::Anchor => anchor = Some(self.bump()?.origin[1..].to_owned()),
                TokenKind::Tag => tag = Some(self.parse_tag()?),
                _ => break,
            }
            self.skip_whitespace()?;
        }
        let node = match self.kind() {
            TokenKind::Alias => {
                let alias = self.bump()?;
                return Ok(Node::Alias {
                    text: alias.origin[1..].to_owned(),
                });
            }
            TokenKind::SequenceStart | TokenKind::MappingStart => self.parse_flow_collection()?,
            TokenKind::SingleQuote | TokenKind::DoubleQuote => self.parse_quoted()?,
            TokenKind::CollectEntry
            | TokenKind::SequenceEnd
            | TokenKind::MappingEnd
            | TokenKind::MappingValue => Node::null(),
            TokenKind::String => Node::scalar(self.parse_plain(-1, true, true)?, Quoting::None),
            _ => return Err(self.unexpected("a flow node")),
        };
        Ok(node.with_properties(tag, anchor))
    }
}

/// Return whether a token of kind `kind` is part of a plain scalar that already started.
///
/// Indicators that are not followed by a blank are already plain text for the tokenizer. Those
/// that are, mid-scalar, lose their meaning.
fn is_plain_text(kind: TokenKind, flow: bool) -> bool {
    match kind {
        TokenKind::String
        | TokenKind::Space
        | TokenKind::Tab
        | TokenKind::Anchor
        | TokenKind::Alias
        | TokenKind::Tag
        | TokenKind::Literal
        | TokenKind::Folded
        | TokenKind::SequenceEntry
        | TokenKind::MappingKey
        | TokenKind::StripChomping
        | TokenKind::KeepChomping => true,
        TokenKind::SingleQuote
        | TokenKind::DoubleQuote
        | TokenKind::SequenceStart
        | TokenKind::SequenceEnd
        | TokenKind::MappingStart
        | TokenKind::MappingEnd
        | TokenKind::CollectEntry => !flow,
        _ => false,
    }
}

/// Split the lines of a block scalar into its content and its trailing empty lines.
fn split_trailing(lines: &[Option<String>]) -> (&[Option<String>], usize) {
    let content = lines.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    (&lines[..content], lines.len() - content)
}

fn chomp(mut text: String, has_content: bool, trailing: usize, chomping: Chomping) -> String {
    match chomping {
        Chomping::Strip => {}
        Chomping::Clip => {
            if has_content {
                text.push('\n');
            }
        }
        Chomping::Keep => {
            if has_content {
                text.push('\n');
            }
            text.extend(std::iter::repeat('\n').take(trailing));
        }
    }
    text
}

/// Join the lines of a literal block scalar.
fn join_literal(lines: &[Option<String>], chomping: Chomping) -> String {
    let (content, trailing) = split_trailing(lines);
    let text = content
        .iter()
        .map(|line| line.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    chomp(text, !content.is_empty(), trailing, chomping)
}

/// Join the lines of a folded block scalar.
///
/// Line breaks between two lines of text become spaces. Empty lines become line breaks. Lines
/// starting with a blank ("more indented") keep their surrounding line breaks.
fn join_folded(lines: &[Option<String>], chomping: Chomping) -> String {
    let (content, trailing) = split_trailing(lines);
    let mut text = String::new();
    let mut empty = 0;
    let mut previous_more_indented = false;
    let mut first = true;
    for line in content {
        let Some(line) = line else {
            empty += 1;
            continue;
        };
        let more_indented = line.starts_with([' ', '\t']);
        if first {
            text.extend(std::iter::repeat('\n').take(empty));
        } else if more_indented || previous_more_indented {
            text.extend(std::iter::repeat('\n').take(empty + 1));
        } else if empty == 0 {
            text.push(' ');
        } else {
            text.extend(std::iter::repeat('\n').take(empty));
        }
        text.push_str(line);
        previous_more_indented = more_indented;
        empty = 0;
        first = false;
    }
    chomp(text, !content.is_empty(), trailing, chomping)
}

thread_local! {
    /// Rune buffers reused across calls to [`parse_str`].
    static POOL: RefCell<RunePool> = RefCell::new(RunePool::new());
}

/// Parse a string into a [`Node::Stream`].
///
/// The rune buffer backing the input is taken from, and given back to, a thread-local
/// [`RunePool`].
///
/// # Errors
/// Returns a [`ParseError`] if the input is not valid YAML.
pub fn parse_str(input: &str) -> Result<Node> {
    let stream = POOL.with(|pool| pool.borrow_mut().acquire(input));
    let mut parser = Parser::new(stream);
    let result = parser.parse();
    let stream = parser.into_inner();
    POOL.with(|pool| pool.borrow_mut().release(stream));
    result
}

#[cfg(test)]
mod test {
    use super::*;

    fn document(input: &str) -> Node {
        match parse_str(input).unwrap() {
            Node::Stream { mut documents } => {
                assert_eq!(documents.len(), 1, "{input:?}");
                documents.remove(0)
            }
            node => panic!("not a stream: {node:?}"),
        }
    }

    fn plain(text: &str) -> Node {
        Node::scalar(text, Quoting::None)
    }

    #[test]
    fn block_scalar_chomping() {
        let lines = [Some("a".to_owned()), None, Some("b".to_owned()), None, None];
        assert_eq!(join_literal(&lines, Chomping::Clip), "a\n\nb\n");
        assert_eq!(join_literal(&lines, Chomping::Strip), "a\n\nb");
        assert_eq!(join_literal(&lines, Chomping::Keep), "a\n\nb\n\n\n");
        assert_eq!(join_folded(&lines, Chomping::Clip), "a\nb\n");
        let lines = [Some("a".to_owned()), Some("b".to_owned()), Some("  c".to_owned())];
        assert_eq!(join_folded(&lines, Chomping::Strip), "a b\n  c");
        assert_eq!(join_literal(&[None], Chomping::Keep), "\n");
    }

    #[test]
    fn nested_collections() {
        let node = document("a:\n  - 1\n  - [2, {b: c}]\nd: e");
        let expected = Node::mapping(vec![
            (
                plain("a"),
                Node::sequence(vec![
                    plain("1"),
                    Node::sequence(vec![
                        plain("2"),
                        Node::mapping(vec![(plain("b"), plain("c"))]),
                    ]),
                ]),
            ),
            (plain("d"), plain("e")),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn tag_handles() {
        let node = document("%TAG !e! tag:example.com,2000:\n---\n!e!foo x");
        assert_eq!(node.properties(), (Some("tag:example.com,2000:foo"), None));
        let error = parse_str("!x!foo bar").unwrap_err();
        assert_eq!(
            error.kind(),
            &ParseErrorKind::UndefinedTagHandle("!x!".into())
        );
    }
}
