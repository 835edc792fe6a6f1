use core::str;

use yamlet_parser::{EscapeError, IterRunes, Node, ParseError, ParseErrorKind, Parser};

/// Run the parser through the string.
///
/// The parser is run over both a [`yamlet_parser::RuneStream`] and an [`IterRunes`]. The
/// results must match.
///
/// # Panics
/// This function panics if there is a mismatch between the 2 parser invocations with the
/// different rune streams.
fn run_parser(input: &str) -> Result<Node, ParseError> {
    let from_str = Parser::new_from_str(input).parse();
    let from_iter = Parser::new(IterRunes::new(input.chars())).parse();
    assert_eq!(from_str, from_iter);
    from_str
}

#[test]
fn fuzz_1() {
    // Quoted scalar left open over a run of carriage returns.
    let raw_input: &[u8] = &[
        1, 39, 110, 117, 108, 108, 34, 13, 13, 13, 13, 13, 10, 13, 13, 13, 13,
    ];
    let s = str::from_utf8(raw_input).unwrap();
    assert!(run_parser(s).is_err());
}

#[test]
fn fuzz_2() {
    // Nested flow collections with explicit keys, tabs and control characters.
    let raw_input: &[u8] = &[
        91, 91, 32, 101, 58, 9, 123, 63, 32, 45, 106, 101, 58, 9, 123, 63, 32, 44, 117, 101, 58, 9,
        123, 63, 32, 44, 9, 26, 58, 32, 126, 93, 8, 58, 32, 58, 10, 29, 58, 58, 58, 32, 58, 29, 63,
        32, 44, 9, 26, 58, 32, 126, 93, 8, 58, 32, 58, 10, 78, 32,
    ];
    let s = str::from_utf8(raw_input).unwrap();
    assert!(run_parser(s).is_err());
}

#[test]
fn fuzz_3() {
    // A block scalar header followed by a lone carriage return and multi-byte runes.
    let raw_input: &[u8] = &[124, 13, 32, 210, 180, 65];
    let s = str::from_utf8(raw_input).unwrap();
    let _ = run_parser(s);
}

#[test]
fn fuzz_indicators_only() {
    for input in [
        "-", "?", ":", "- - -", "? : ?", "---\n...\n---", "!", "&", "*", "|", ">", "%", "#",
        "[", "]", "{", "}", ",", "'", "\"", "!!", "!<", "[!]", "{? }", "- |\n- >", "\u{feff}",
    ] {
        let _ = run_parser(input);
    }
}

#[test]
fn fuzz_deep_nesting() {
    for (open, close) in [("[", "]"), ("{", "}")] {
        let input = open.repeat(300) + &close.repeat(300);
        let error = run_parser(&input).unwrap_err();
        assert_eq!(error.kind(), &ParseErrorKind::NestingLimit);
    }
    let error = run_parser(&("- ".repeat(300) + "a")).unwrap_err();
    assert_eq!(error.kind(), &ParseErrorKind::NestingLimit);

    let input = "[".repeat(100) + &"]".repeat(100);
    assert!(run_parser(&input).is_ok());
}

#[test]
fn fuzz_nul_runes() {
    // A `\0` rune is not the end of the input.
    for input in ["a: 1\0\nb: 2", "\0", "a\0", "- a\0b", "[a, \0]", "# \0\na", "|\n  a\0\n"] {
        assert!(run_parser(input).is_err(), "{input:?}");
    }
    let error = run_parser("a: \"x\0y\"").unwrap_err();
    assert_eq!(
        error.kind(),
        &ParseErrorKind::Escape(EscapeError::ControlCharacter('\0'))
    );
}
