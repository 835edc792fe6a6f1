use yamlet_parser::{tokenize, Charset, ContextType, Position, TokenKind, Tokenizer};

/// Run the tokenizer through the string, returning `(kind, origin)` pairs, `Eof` included.
fn run_tokenizer(input: &str) -> Vec<(TokenKind, String)> {
    tokenize(input)
        .into_iter()
        .map(|token| (token.kind, token.origin))
        .collect()
}

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input).into_iter().map(|token| token.kind).collect()
}

fn pair(kind: TokenKind, origin: &str) -> (TokenKind, String) {
    (kind, origin.to_owned())
}

#[test]
fn test_key_value_positions() {
    let tokens = tokenize("key: value");
    let spans: Vec<_> = tokens
        .iter()
        .map(|t| (t.kind, t.origin.as_str(), t.start, t.end))
        .collect();
    assert_eq!(
        spans,
        [
            (TokenKind::String, "key", Position::new(1, 1), Position::new(1, 3)),
            (TokenKind::MappingValue, ":", Position::new(1, 4), Position::new(1, 4)),
            (TokenKind::Space, " ", Position::new(1, 5), Position::new(1, 5)),
            (TokenKind::String, "value", Position::new(1, 6), Position::new(1, 10)),
            (TokenKind::Eof, "", Position::new(1, 10), Position::new(1, 10)),
        ]
    );
}

#[test]
fn test_line_break_positions() {
    for input in ["a\nb", "a\r\nb", "a\rb"] {
        let tokens = tokenize(input);
        assert_eq!(tokens.len(), 4, "{input:?}");
        assert_eq!(tokens[1].kind, TokenKind::LineBreak);
        assert_eq!(tokens[1].start, Position::new(2, 0));
        assert_eq!(tokens[2].start, Position::new(2, 1));
        assert_eq!(tokens[3].start, Position::new(2, 1));
    }
    assert_eq!(tokenize("a\r\nb")[1].origin, "\r\n");
}

#[test]
fn test_dash_is_context_sensitive() {
    assert_eq!(
        run_tokenizer("- value"),
        [
            pair(TokenKind::SequenceEntry, "-"),
            pair(TokenKind::Space, " "),
            pair(TokenKind::String, "value"),
            pair(TokenKind::Eof, ""),
        ]
    );
    assert_eq!(
        run_tokenizer("a-b"),
        [pair(TokenKind::String, "a-b"), pair(TokenKind::Eof, "")]
    );
    assert_eq!(
        run_tokenizer("-1"),
        [pair(TokenKind::String, "-1"), pair(TokenKind::Eof, "")]
    );
}

#[test]
fn test_colon_is_context_sensitive() {
    assert_eq!(
        kinds("a: b"),
        [
            TokenKind::String,
            TokenKind::MappingValue,
            TokenKind::Space,
            TokenKind::String,
            TokenKind::Eof
        ]
    );
    assert_eq!(
        run_tokenizer("a:b"),
        [pair(TokenKind::String, "a:b"), pair(TokenKind::Eof, "")]
    );
    assert_eq!(
        run_tokenizer("[http://x]"),
        [
            pair(TokenKind::SequenceStart, "["),
            pair(TokenKind::String, "http://x"),
            pair(TokenKind::SequenceEnd, "]"),
            pair(TokenKind::Eof, ""),
        ]
    );
    // JSON-like keys: a `:` right after a closing quote is a value indicator.
    assert_eq!(
        kinds("{\"a\":1}"),
        [
            TokenKind::MappingStart,
            TokenKind::DoubleQuote,
            TokenKind::String,
            TokenKind::DoubleQuote,
            TokenKind::MappingValue,
            TokenKind::String,
            TokenKind::MappingEnd,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_quotes() {
    assert_eq!(
        run_tokenizer("'it''s'"),
        [
            pair(TokenKind::SingleQuote, "'"),
            pair(TokenKind::String, "it''s"),
            pair(TokenKind::SingleQuote, "'"),
            pair(TokenKind::Eof, ""),
        ]
    );
    assert_eq!(
        run_tokenizer(r#""a \"b\"""#),
        [
            pair(TokenKind::DoubleQuote, "\""),
            pair(TokenKind::String, r#"a \"b\""#),
            pair(TokenKind::DoubleQuote, "\""),
            pair(TokenKind::Eof, ""),
        ]
    );
    // A quote inside a word does not open a quoted scalar.
    assert_eq!(
        run_tokenizer("it's"),
        [pair(TokenKind::String, "it's"), pair(TokenKind::Eof, "")]
    );
}

#[test]
fn test_comments_and_indicators() {
    assert_eq!(
        run_tokenizer("a #b"),
        [
            pair(TokenKind::String, "a"),
            pair(TokenKind::Space, " "),
            pair(TokenKind::Comment, "#"),
            pair(TokenKind::String, "b"),
            pair(TokenKind::Eof, ""),
        ]
    );
    assert_eq!(
        run_tokenizer("a#b"),
        [pair(TokenKind::String, "a#b"), pair(TokenKind::Eof, "")]
    );
    assert_eq!(
        kinds("&a *b"),
        [
            TokenKind::Anchor,
            TokenKind::Space,
            TokenKind::Alias,
            TokenKind::Eof
        ]
    );
    assert_eq!(
        kinds("--- |-\n...\n"),
        [
            TokenKind::DirectiveEnd,
            TokenKind::Space,
            TokenKind::Literal,
            TokenKind::StripChomping,
            TokenKind::LineBreak,
            TokenKind::DocumentEnd,
            TokenKind::LineBreak,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_tokens_cover_input() {
    let input = "%YAML 1.2\n---\na: [b, {c: 'd'}] # e\nf: |+\n  g\n...\n";
    let text: String = tokenize(input).into_iter().map(|t| t.origin).collect();
    assert_eq!(text, input);
}

#[test]
fn test_eof_repeats() {
    let mut tokenizer = Tokenizer::from("a");
    assert_eq!(tokenizer.next_token().kind, TokenKind::String);
    for _ in 0..3 {
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
    }
    assert_eq!(tokenizer.context(), ContextType::Block);
}

#[test]
fn test_nul_is_not_the_end() {
    let kinds: Vec<_> = tokenize("a\0b").into_iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        [
            TokenKind::String,
            TokenKind::Unknown,
            TokenKind::String,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_conformance() {
    let tokens = tokenize("[42, anchor_1, 'x y']");
    assert!(tokens[1].conforms(Charset::Decimal));
    assert!(!tokens[4].conforms(Charset::Decimal));
    assert!(tokens[4].conforms(Charset::Anchor));
    assert_eq!(tokens[4].conformance_cache().get(Charset::Anchor), Some(true));
}
