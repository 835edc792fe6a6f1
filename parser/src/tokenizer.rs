//! The tokenizer: a context-sensitive state machine turning runes into [`Token`]s.
//!
//! The meaning of a rune depends on the context the tokenizer is in (block, flow, quoted
//! scalar, ...). Contexts are kept on a stack whose top decides how the next rune is matched.
//! Structural tokens push and pop contexts as a side effect of being emitted.
//!
//! The tokenizer never fails. Runes that cannot start a structural token are gathered into
//! [`TokenKind::String`] tokens.
//!
//! Lookahead is done through an [`Accessor`]: a checkpoint is set before the first rune of every
//! token, as many runes as needed are read, and the accessor is rolled back before consuming
//! exactly the runes of the token.

use crate::{
    accessor::{Accessor, ResourceStream},
    char_traits::{is_anchor_char, is_blank_or_breakz, is_bom, is_break, is_flow, is_printable},
    input::RuneStream,
    token::{Position, Token, TokenKind},
};

/// The context the tokenizer is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextType {
    /// Block context, where indentation gives structure. The bottom of the stack.
    Block,
    /// Inside a `[...]` or `{...}` flow collection.
    Flow,
    /// After a `#`, up to the end of the line. Also used for directive parameters.
    Comment,
    /// After a `|` or `>` block scalar indicator, up to the end of the line.
    MultilineBlockStart,
    /// Inside a `'...'` scalar.
    SingleQuote,
    /// Inside a `"..."` scalar.
    DoubleQuote,
    /// Inside a tag, up to the next whitespace or closing `!`.
    Tag,
}

/// How the context stack changes when a token is emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Transition {
    /// Number of contexts to pop.
    pop: usize,
    /// Context to push once popping is done.
    push: Option<ContextType>,
}

impl Transition {
    const NONE: Transition = Transition { pop: 0, push: None };

    fn push(context: ContextType) -> Self {
        Self {
            pop: 0,
            push: Some(context),
        }
    }

    fn pop(count: usize) -> Self {
        Self {
            pop: count,
            push: None,
        }
    }
}

/// The outcome of matching the rune at some offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// The rune starts a token of the given kind and length.
    Token(TokenKind, usize, Transition),
    /// The rune and the following ones, `n` in total, are ordinary content.
    Content(usize),
    /// The rune is nothing special in this context.
    Nothing,
}

/// State of the tokenizer while in the body of a block scalar.
///
/// In raw mode, only line breaks, indentation spaces and line contents are recognized.
#[derive(Clone, Copy, Debug)]
struct RawMode {
    /// Indentation of the line holding the block scalar indicator. `-1` for a document line.
    parent: isize,
    /// Indentation of the first non-empty line of the block scalar, once known.
    threshold: Option<usize>,
    /// Whether the current line was already checked to belong to the block scalar.
    line_decided: bool,
}

/// A tokenizer over a stream of runes.
///
/// ```
/// # use yamlet_parser::{tokenize, TokenKind};
/// let kinds: Vec<_> = tokenize("- a").into_iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     [TokenKind::SequenceEntry, TokenKind::Space, TokenKind::String, TokenKind::Eof]
/// );
/// ```
pub struct Tokenizer<S> {
    /// The runes, with checkpointing for lookahead.
    runes: Accessor<Option<char>, S>,
    /// Runes read since the checkpoint of the current token. The end of the input reads as `\0`.
    scratch: Vec<char>,
    /// Offset in `scratch` where the input ends, if it was reached.
    end: Option<usize>,
    /// The context stack. Empty means block context.
    contexts: Vec<ContextType>,
    /// Whether the last token ended with a backslash escaping the next rune.
    escaped: bool,
    /// Set while tokenizing the body of a block scalar.
    raw: Option<RawMode>,
    /// Indentation of the line of the last block scalar indicator.
    block_parent: isize,
    /// Kind of the last emitted token, `None` at the start of the stream.
    last: Option<TokenKind>,
    /// Position of the last consumed rune.
    position: Position,
    /// Number of spaces at the start of the current line.
    line_indent: usize,
    /// Whether a token other than an indentation space was emitted on the current line.
    line_has_content: bool,
    /// Whether the current line starts with `---`.
    document_line: bool,
    /// Whether the end of the stream was reached.
    done: bool,
}

impl<S: ResourceStream<Option<char>>> Tokenizer<S> {
    /// Create a tokenizer reading from `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            runes: Accessor::new(stream),
            scratch: Vec::new(),
            end: None,
            contexts: Vec::new(),
            escaped: false,
            raw: None,
            block_parent: 0,
            last: None,
            position: Position::START,
            line_indent: 0,
            line_has_content: false,
            document_line: false,
            done: false,
        }
    }

    /// Return the context on top of the stack.
    #[must_use]
    pub fn context(&self) -> ContextType {
        self.contexts.last().copied().unwrap_or(ContextType::Block)
    }

    /// Return the whole context stack, innermost last. Block context is implied at the bottom.
    #[must_use]
    pub fn contexts(&self) -> &[ContextType] {
        &self.contexts
    }

    /// Return whether the tokenizer is in the body of a block scalar.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Return the position of the last consumed rune.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Consume the tokenizer, returning its rune stream.
    pub fn into_inner(self) -> S {
        self.runes.into_inner()
    }

    /// Produce the next token.
    ///
    /// Once the end of the input is reached, [`TokenKind::Eof`] tokens are returned forever.
    pub fn next_token(&mut self) -> Token {
        if self.done {
            return Token::new(TokenKind::Eof, self.position, self.position, String::new());
        }
        self.runes.set_checkpoint();
        self.scratch.clear();
        self.end = None;
        let (kind, len, transition) = self.scan();
        self.emit(kind, len, transition)
    }

    /// Return the rune at `offset` from the start of the current token.
    fn peek(&mut self, offset: usize) -> char {
        while self.scratch.len() <= offset {
            let c = self.runes.next();
            if c.is_none() && self.end.is_none() {
                self.end = Some(self.scratch.len());
            }
            self.scratch.push(c.unwrap_or('\0'));
        }
        self.scratch[offset]
    }

    /// Return whether the input ends at `offset`, as opposed to holding a `\0` rune there.
    fn is_end(&mut self, offset: usize) -> bool {
        self.peek(offset);
        self.end.is_some_and(|end| offset >= end)
    }

    /// Return the context `depth` entries below the top of the stack.
    fn context_below(&self, depth: usize) -> ContextType {
        self.contexts
            .len()
            .checked_sub(depth + 1)
            .map_or(ContextType::Block, |i| self.contexts[i])
    }

    /// Decide the kind and length of the next token.
    fn scan(&mut self) -> (TokenKind, usize, Transition) {
        if let Some(token) = self.scan_raw() {
            return token;
        }
        let prev = self.last;
        match self.match_at(0, prev) {
            Step::Token(kind, len, transition) => (kind, len, transition),
            Step::Content(len) => self.scan_string(len),
            Step::Nothing => self.scan_string(1),
        }
    }

    /// Gather content runes, starting with the first `len` ones, into a string token.
    fn scan_string(&mut self, mut len: usize) -> (TokenKind, usize, Transition) {
        loop {
            match self.match_at(len, Some(TokenKind::String)) {
                Step::Token(..) => break,
                Step::Content(n) => len += n,
                Step::Nothing => len += 1,
            }
        }
        (TokenKind::String, len, Transition::NONE)
    }

    /// Match the rune at `offset` in the current context, given the previous token kind.
    fn match_at(&mut self, offset: usize, prev: Option<TokenKind>) -> Step {
        let mut depth = 0;
        // Tags end on any rune that cannot be part of them; the rune is then matched in the
        // enclosing context.
        while self.context_below(depth) == ContextType::Tag {
            match self.match_tag(offset, prev) {
                Step::Nothing => return Step::Nothing,
                Step::Token(TokenKind::Unknown, ..) => depth += 1,
                step => return step,
            }
        }
        let step = match self.context_below(depth) {
            ContextType::Block => self.match_block(offset, prev),
            ContextType::Flow => self.match_flow(offset, prev),
            ContextType::Comment => self.match_comment(offset),
            ContextType::MultilineBlockStart => self.match_block_start(offset, prev),
            ContextType::SingleQuote => self.match_single_quote(offset),
            ContextType::DoubleQuote => self.match_double_quote(offset),
            ContextType::Tag => Step::Nothing,
        };
        let step = match step {
            Step::Nothing => self.match_base(offset),
            step => step,
        };
        match step {
            // Line breaks already account for every context on top of the stack.
            Step::Token(kind, len, transition) if depth > 0 && kind != TokenKind::LineBreak => {
                Step::Token(
                    kind,
                    len,
                    Transition {
                        pop: transition.pop + depth,
                        push: transition.push,
                    },
                )
            }
            step => step,
        }
    }

    /// Matcher for the inside of a tag.
    ///
    /// Returns an [`TokenKind::Unknown`] token to signal that the tag ends before the rune.
    fn match_tag(&mut self, offset: usize, prev: Option<TokenKind>) -> Step {
        let c = self.peek(offset);
        match c {
            '!' => Step::Token(TokenKind::Tag, 1, Transition::pop(1)),
            '<' if prev == Some(TokenKind::Tag) => {
                let mut len = 1;
                loop {
                    let c = self.peek(offset + len);
                    if is_blank_or_breakz(c) {
                        break;
                    }
                    len += 1;
                    if c == '>' {
                        break;
                    }
                }
                Step::Content(len)
            }
            c if is_blank_or_breakz(c) => Step::Token(TokenKind::Unknown, 0, Transition::NONE),
            c if is_flow(c) => Step::Token(TokenKind::Unknown, 0, Transition::NONE),
            _ => Step::Nothing,
        }
    }

    /// Matcher for block context.
    fn match_block(&mut self, offset: usize, prev: Option<TokenKind>) -> Step {
        let c = self.peek(offset);
        let may_precede = TokenKind::may_precede_word(prev);
        let next = self.peek(offset + 1);
        match c {
            '-' if self.at_line_start(prev) && self.is_marker(offset, '-') => {
                Step::Token(TokenKind::DirectiveEnd, 3, Transition::NONE)
            }
            '-' if may_precede && is_blank_or_breakz(next) => {
                Step::Token(TokenKind::SequenceEntry, 1, Transition::NONE)
            }
            '.' if self.at_line_start(prev) && self.is_marker(offset, '.') => {
                Step::Token(TokenKind::DocumentEnd, 3, Transition::NONE)
            }
            ':' if is_blank_or_breakz(next) => {
                Step::Token(TokenKind::MappingValue, 1, Transition::NONE)
            }
            '?' if may_precede && is_blank_or_breakz(next) => {
                Step::Token(TokenKind::MappingKey, 1, Transition::NONE)
            }
            '[' if may_precede => Step::Token(
                TokenKind::SequenceStart,
                1,
                Transition::push(ContextType::Flow),
            ),
            '{' if may_precede => Step::Token(
                TokenKind::MappingStart,
                1,
                Transition::push(ContextType::Flow),
            ),
            // A closing flow indicator cannot start a plain scalar.
            ']' if prev != Some(TokenKind::String) => {
                Step::Token(TokenKind::SequenceEnd, 1, Transition::NONE)
            }
            '}' if prev != Some(TokenKind::String) => {
                Step::Token(TokenKind::MappingEnd, 1, Transition::NONE)
            }
            '%' if self.at_line_start(prev) => Step::Token(
                TokenKind::Directive,
                1,
                Transition::push(ContextType::Comment),
            ),
            '|' | '>' if may_precede => self.block_scalar_indicator(c),
            _ if may_precede => self.match_node_start(offset, c),
            _ => Step::Nothing,
        }
    }

    /// Matcher for flow context.
    fn match_flow(&mut self, offset: usize, prev: Option<TokenKind>) -> Step {
        let c = self.peek(offset);
        let next = self.peek(offset + 1);
        match c {
            '[' => Step::Token(
                TokenKind::SequenceStart,
                1,
                Transition::push(ContextType::Flow),
            ),
            '{' => Step::Token(
                TokenKind::MappingStart,
                1,
                Transition::push(ContextType::Flow),
            ),
            ']' => Step::Token(TokenKind::SequenceEnd, 1, Transition::pop(1)),
            '}' => Step::Token(TokenKind::MappingEnd, 1, Transition::pop(1)),
            ',' => Step::Token(TokenKind::CollectEntry, 1, Transition::NONE),
            ':' if is_blank_or_breakz(next)
                || is_flow(next)
                || matches!(
                    prev,
                    Some(
                        TokenKind::SingleQuote
                            | TokenKind::DoubleQuote
                            | TokenKind::SequenceEnd
                            | TokenKind::MappingEnd
                    )
                ) =>
            {
                Step::Token(TokenKind::MappingValue, 1, Transition::NONE)
            }
            '?' if TokenKind::may_precede_word_in_flow(prev) && is_blank_or_breakz(next) => {
                Step::Token(TokenKind::MappingKey, 1, Transition::NONE)
            }
            '#' if TokenKind::may_precede_word(prev) => Step::Token(
                TokenKind::Comment,
                1,
                Transition::push(ContextType::Comment),
            ),
            _ if TokenKind::may_precede_word_in_flow(prev) => self.match_node_start(offset, c),
            _ => Step::Nothing,
        }
    }

    /// Match the runes that may start a node in both block and flow contexts: comments,
    /// anchors, aliases, tags and quotes.
    ///
    /// The caller checks that the previous token allows a word to start.
    fn match_node_start(&mut self, offset: usize, c: char) -> Step {
        match c {
            '#' => Step::Token(
                TokenKind::Comment,
                1,
                Transition::push(ContextType::Comment),
            ),
            '&' | '*' => {
                let mut len = 1;
                while is_anchor_char(self.peek(offset + len)) {
                    len += 1;
                }
                if len == 1 {
                    Step::Nothing
                } else if c == '&' {
                    Step::Token(TokenKind::Anchor, len, Transition::NONE)
                } else {
                    Step::Token(TokenKind::Alias, len, Transition::NONE)
                }
            }
            '!' => Step::Token(TokenKind::Tag, 1, Transition::push(ContextType::Tag)),
            '\'' => Step::Token(
                TokenKind::SingleQuote,
                1,
                Transition::push(ContextType::SingleQuote),
            ),
            '"' => Step::Token(
                TokenKind::DoubleQuote,
                1,
                Transition::push(ContextType::DoubleQuote),
            ),
            _ => Step::Nothing,
        }
    }

    /// Matcher for the header line of a block scalar.
    fn match_block_start(&mut self, offset: usize, prev: Option<TokenKind>) -> Step {
        match self.peek(offset) {
            '-' => Step::Token(TokenKind::StripChomping, 1, Transition::NONE),
            '+' => Step::Token(TokenKind::KeepChomping, 1, Transition::NONE),
            '#' if TokenKind::may_precede_word(prev) => Step::Token(
                TokenKind::Comment,
                1,
                Transition::push(ContextType::Comment),
            ),
            '0'..='9' => Step::Content(1),
            _ => Step::Nothing,
        }
    }

    /// Matcher for comments and directive parameters: everything is content up to the end of
    /// the line.
    fn match_comment(&mut self, offset: usize) -> Step {
        let c = self.peek(offset);
        if is_break(c) || c == '\0' {
            Step::Nothing
        } else {
            Step::Content(1)
        }
    }

    /// Matcher for the inside of a single-quoted scalar.
    fn match_single_quote(&mut self, offset: usize) -> Step {
        match self.peek(offset) {
            '\'' if self.peek(offset + 1) == '\'' => Step::Content(2),
            '\'' => Step::Token(TokenKind::SingleQuote, 1, Transition::pop(1)),
            ' ' | '\t' => Step::Content(1),
            _ => Step::Nothing,
        }
    }

    /// Matcher for the inside of a double-quoted scalar.
    fn match_double_quote(&mut self, offset: usize) -> Step {
        match self.peek(offset) {
            '"' if offset == 0 && self.escaped => Step::Content(1),
            '"' => Step::Token(TokenKind::DoubleQuote, 1, Transition::pop(1)),
            '\\' if matches!(self.peek(offset + 1), '\0' | '\r' | '\n') => Step::Content(1),
            '\\' => Step::Content(2),
            ' ' | '\t' => Step::Content(1),
            _ => Step::Nothing,
        }
    }

    /// Matcher for runes that mean the same in every context: end of input, byte order mark,
    /// line breaks and whitespace.
    fn match_base(&mut self, offset: usize) -> Step {
        match self.peek(offset) {
            '\0' if self.is_end(offset) => Step::Token(TokenKind::Eof, 1, Transition::NONE),
            c if is_bom(c) => Step::Token(TokenKind::Bom, 1, Transition::NONE),
            '\r' if self.peek(offset + 1) == '\n' => {
                Step::Token(TokenKind::LineBreak, 2, self.line_break_transition())
            }
            '\r' | '\n' => Step::Token(TokenKind::LineBreak, 1, self.line_break_transition()),
            ' ' => Step::Token(TokenKind::Space, 1, Transition::NONE),
            '\t' => Step::Token(TokenKind::Tab, 1, Transition::NONE),
            c if !is_printable(c) => Step::Token(TokenKind::Unknown, 1, Transition::NONE),
            _ => Step::Nothing,
        }
    }

    /// Line breaks end every context but block, flow and quoted scalars.
    fn line_break_transition(&self) -> Transition {
        let pop = self
            .contexts
            .iter()
            .rev()
            .take_while(|c| {
                !matches!(
                    c,
                    ContextType::Block
                        | ContextType::Flow
                        | ContextType::SingleQuote
                        | ContextType::DoubleQuote
                )
            })
            .count();
        Transition::pop(pop)
    }

    fn block_scalar_indicator(&self, c: char) -> Step {
        let kind = if c == '|' {
            TokenKind::Literal
        } else {
            TokenKind::Folded
        };
        Step::Token(kind, 1, Transition::push(ContextType::MultilineBlockStart))
    }

    /// Return whether the next token starts a line.
    fn at_line_start(&self, prev: Option<TokenKind>) -> bool {
        matches!(prev, None | Some(TokenKind::LineBreak | TokenKind::Bom))
    }

    /// Return whether `---` or `...` (made of `c`), followed by a blank, starts at `offset`.
    fn is_marker(&mut self, offset: usize, c: char) -> bool {
        self.peek(offset + 1) == c
            && self.peek(offset + 2) == c
            && is_blank_or_breakz(self.peek(offset + 3))
    }

    /// Tokenize the body of a block scalar.
    ///
    /// Returns `None` if not in raw mode, or if the current line ends the block scalar.
    fn scan_raw(&mut self) -> Option<(TokenKind, usize, Transition)> {
        let mut raw = self.raw?;
        if !raw.line_decided {
            let mut indent = 0;
            while self.peek(indent) == ' ' {
                indent += 1;
            }
            let c = self.peek(indent);
            let belongs = if c == '\0' {
                false
            } else if indent == 0
                && ((c == '-' && self.is_marker(0, '-')) || (c == '.' && self.is_marker(0, '.')))
            {
                false
            } else if is_break(c) {
                true
            } else {
                match raw.threshold {
                    Some(threshold) => indent >= threshold,
                    None if isize::try_from(indent).map_or(false, |i| i > raw.parent) => {
                        raw.threshold = Some(indent);
                        true
                    }
                    None => false,
                }
            };
            if !belongs {
                debug_print!("  raw mode ends at {}", self.position);
                self.raw = None;
                return None;
            }
            raw.line_decided = true;
            self.raw = Some(raw);
        }

        let token = match self.peek(0) {
            '\0' => {
                self.raw = None;
                return None;
            }
            '\r' if self.peek(1) == '\n' => (TokenKind::LineBreak, 2, Transition::NONE),
            '\r' | '\n' => (TokenKind::LineBreak, 1, Transition::NONE),
            ' ' if !self.line_has_content => (TokenKind::Space, 1, Transition::NONE),
            _ => {
                let mut len = 1;
                while !matches!(self.peek(len), '\0' | '\r' | '\n') {
                    len += 1;
                }
                (TokenKind::String, len, Transition::NONE)
            }
        };
        Some(token)
    }

    /// Consume the `len` runes of the token and apply its side effects.
    fn emit(&mut self, kind: TokenKind, len: usize, transition: Transition) -> Token {
        // Rewind to the start of the token, then consume exactly its runes.
        let _ = self.runes.rollback();
        for _ in 1..len {
            let _ = self.runes.next();
        }

        let token = if kind == TokenKind::Eof {
            self.done = true;
            Token::new(kind, self.position, self.position, String::new())
        } else {
            let origin: String = self.scratch[..len].iter().collect();
            let mut start = None;
            let mut previous = '\0';
            for &c in &self.scratch[..len] {
                if !(c == '\n' && previous == '\r') {
                    self.position = self.position.advance(c);
                }
                previous = c;
                start.get_or_insert(self.position);
            }
            Token::new(kind, start.unwrap_or(self.position), self.position, origin)
        };

        self.apply(&token, transition);
        debug_print!("  \u{21B3} {} {:?}", token, self.contexts);
        token
    }

    /// Update the context stack and line bookkeeping after emitting `token`.
    fn apply(&mut self, token: &Token, transition: Transition) {
        let mut left_block_start = false;
        for _ in 0..transition.pop {
            if self.contexts.pop() == Some(ContextType::MultilineBlockStart) {
                left_block_start = true;
            }
        }
        if let Some(context) = transition.push {
            self.contexts.push(context);
        }

        self.escaped = token.kind == TokenKind::String
            && matches!(
                self.context(),
                ContextType::DoubleQuote | ContextType::SingleQuote
            )
            && token.origin.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1;

        match token.kind {
            TokenKind::LineBreak => {
                self.line_indent = 0;
                self.line_has_content = false;
                self.document_line = false;
                if let Some(raw) = &mut self.raw {
                    raw.line_decided = false;
                }
                if left_block_start {
                    debug_print!("  raw mode starts, parent indent {}", self.block_parent);
                    self.raw = Some(RawMode {
                        parent: self.block_parent,
                        threshold: None,
                        line_decided: false,
                    });
                }
            }
            TokenKind::Space if !self.line_has_content => self.line_indent += 1,
            TokenKind::Space | TokenKind::Tab | TokenKind::Bom => {}
            TokenKind::DirectiveEnd if !self.line_has_content => {
                self.document_line = true;
                self.line_has_content = true;
            }
            TokenKind::Literal | TokenKind::Folded => {
                self.block_parent = if self.document_line {
                    -1
                } else {
                    isize::try_from(self.line_indent).unwrap_or(isize::MAX)
                };
                self.line_has_content = true;
            }
            _ => self.line_has_content = true,
        }
        // A block scalar indicator at the very end of the input never sees its line break.
        if token.kind == TokenKind::Eof {
            self.raw = None;
        }
        self.last = Some(token.kind);
    }
}

impl<S: ResourceStream<Option<char>>> ResourceStream<Token> for Tokenizer<S> {
    fn next(&mut self) -> Token {
        self.next_token()
    }
}

impl From<&str> for Tokenizer<RuneStream> {
    fn from(input: &str) -> Self {
        Self::new(RuneStream::from(input))
    }
}

/// Tokenize `input` entirely, up to and including the [`TokenKind::Eof`] token.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::from(input);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token();
        let eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if eof {
            return tokens;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn contexts_are_popped() {
        let mut tokenizer = Tokenizer::from("[{a: 'b'}]");
        assert_eq!(tokenizer.next_token().kind, TokenKind::SequenceStart);
        assert_eq!(tokenizer.next_token().kind, TokenKind::MappingStart);
        assert_eq!(tokenizer.contexts(), [ContextType::Flow, ContextType::Flow]);
        while tokenizer.next_token().kind != TokenKind::SingleQuote {}
        assert_eq!(tokenizer.context(), ContextType::SingleQuote);
        assert_eq!(tokenizer.next_token().origin, "b");
        assert_eq!(tokenizer.next_token().kind, TokenKind::SingleQuote);
        assert_eq!(tokenizer.next_token().kind, TokenKind::MappingEnd);
        assert_eq!(tokenizer.next_token().kind, TokenKind::SequenceEnd);
        assert_eq!(tokenizer.context(), ContextType::Block);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn tags_end_on_whitespace() {
        let mut tokenizer = Tokenizer::from("!!str a");
        assert_eq!(tokenizer.next_token().kind, TokenKind::Tag);
        assert_eq!(tokenizer.context(), ContextType::Tag);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Tag);
        assert_eq!(tokenizer.context(), ContextType::Block);
        assert_eq!(tokenizer.next_token().origin, "str");
        assert_eq!(tokenizer.next_token().kind, TokenKind::Space);
        assert_eq!(tokenizer.next_token().origin, "a");

        let mut tokenizer = Tokenizer::from("!local x");
        assert_eq!(tokenizer.next_token().kind, TokenKind::Tag);
        assert_eq!(tokenizer.next_token().origin, "local");
        assert_eq!(tokenizer.context(), ContextType::Tag);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Space);
        assert_eq!(tokenizer.context(), ContextType::Block);
    }

    #[test]
    fn tags_end_on_flow_indicators() {
        assert_eq!(
            kinds("[!t]"),
            [
                TokenKind::SequenceStart,
                TokenKind::Tag,
                TokenKind::String,
                TokenKind::SequenceEnd,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn raw_mode() {
        let mut tokenizer = Tokenizer::from("a: |\n  x: #y\nb");
        let mut seen = vec![];
        loop {
            let token = tokenizer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            seen.push((token.kind, token.origin, tokenizer.is_raw()));
        }
        assert!(seen.contains(&(TokenKind::String, "x: #y".into(), true)));
        assert_eq!(seen.last(), Some(&(TokenKind::String, "b".into(), false)));
    }
}
