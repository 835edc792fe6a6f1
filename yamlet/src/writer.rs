//! YAML serialization of trees.

use std::fmt;

use thiserror::Error;
use yamlet_parser::{
    char_traits::{is_bom, is_printable},
    escape::{escape_single_quoted, write_double_quoted},
    EscapeError, Node, ParseError, Quoting,
};

use crate::schema::{CoreSchema, Schema, CORE_TAG_PREFIX};
use crate::value::Value;

/// A convenience alias for writer functions that may fail without returning a value.
pub type EmitResult = Result<(), EmitError>;

/// An error when writing YAML.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EmitError {
    /// A formatting error.
    #[error(transparent)]
    Fmt(#[from] fmt::Error),
    /// Incoherent calls, or a node that has no place where it was found.
    #[error("{0}")]
    Event(&'static str),
    /// A scalar could not be escaped.
    #[error(transparent)]
    Escape(#[from] EscapeError),
    /// Raw YAML given to an inserter could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An error raised by an encoder implementation.
    #[error("{0}")]
    Custom(String),
}

/// The YAML writer.
///
/// Writes block-style YAML. Each document starts with `---` and, unless disabled, ends with
/// `...`. Scalars keep the quoting they were parsed with when it can represent them.
///
/// ```
/// # use yamlet::Writer;
/// # use yamlet_parser::parse_str;
/// let root = parse_str("a: [b, 'c']").unwrap();
///
/// let mut output = String::new();
/// Writer::new(&mut output).write(&root).unwrap();
///
/// assert_eq!(output, "---\na:\n  - b\n  - 'c'\n...\n");
/// ```
pub struct Writer<'a> {
    writer: &'a mut dyn fmt::Write,
    /// Whether the first entry of a collection in a sequence goes on the line of its `-`.
    compact: bool,
    explicit_document_end: bool,
    multiline_strings: bool,
    indent_step: u32,
    /// The nesting of block collections. Top-level content is at level -1.
    level: isize,
}

impl<'a> Writer<'a> {
    /// Create a new writer serializing into `writer`.
    pub fn new(writer: &'a mut dyn fmt::Write) -> Self {
        Writer {
            writer,
            compact: true,
            explicit_document_end: true,
            multiline_strings: false,
            indent_step: 2,
            level: -1,
        }
    }

    /// Set 'compact in-line notation' on or off, as described for block
    /// [sequences](http://www.yaml.org/spec/1.2/spec.html#id2797382)
    /// and
    /// [mappings](http://www.yaml.org/spec/1.2/spec.html#id2798057).
    ///
    /// Collections with properties are never written compact.
    pub fn compact(&mut self, compact: bool) {
        self.compact = compact;
    }

    /// Determine if this writer is using 'compact in-line notation'.
    #[must_use]
    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Set whether documents end with `...`. On by default.
    pub fn explicit_document_end(&mut self, explicit: bool) {
        self.explicit_document_end = explicit;
    }

    /// Determine if documents end with `...`.
    #[must_use]
    pub fn is_explicit_document_end(&self) -> bool {
        self.explicit_document_end
    }

    /// Render plain and double-quoted strings containing multiple lines in [literal style].
    ///
    /// ```
    /// # use yamlet::Writer;
    /// # use yamlet_parser::parse_str;
    /// let root = parse_str("{foo: \"bar\\nbar\", baz: 42}").unwrap();
    ///
    /// let mut output = String::new();
    /// let mut writer = Writer::new(&mut output);
    /// writer.multiline_strings(true);
    /// writer.explicit_document_end(false);
    /// writer.write(&root).unwrap();
    /// assert_eq!(output, "---\nfoo: |-\n  bar\n  bar\nbaz: 42\n");
    /// ```
    ///
    /// [literal style]: https://yaml.org/spec/1.2/spec.html#id2795688
    pub fn multiline_strings(&mut self, multiline_strings: bool) {
        self.multiline_strings = multiline_strings;
    }

    /// Determine if this writer will write multiline strings in literal style when possible.
    #[must_use]
    pub fn is_multiline_strings(&self) -> bool {
        self.multiline_strings
    }

    /// Set how many spaces are added to a nested indentation level.
    pub fn indent_step(&mut self, indent_step: u32) {
        self.indent_step = indent_step.max(1);
    }

    /// Get how many spaces are added to a nested indentation level.
    #[must_use]
    pub fn get_indent_step(&self) -> u32 {
        self.indent_step
    }

    /// Write a stream, or a single document.
    ///
    /// # Errors
    /// Returns an error if writing fails or if the tree is malformed.
    pub fn write(&mut self, node: &Node) -> EmitResult {
        match node {
            Node::Stream { documents } => documents
                .iter()
                .try_for_each(|document| self.write_document(document)),
            document => self.write_document(document),
        }
    }

    fn write_document(&mut self, document: &Node) -> EmitResult {
        self.writer.write_str("---")?;
        self.level = -1;
        self.emit_val(false, document)?;
        writeln!(self.writer)?;
        if self.explicit_document_end {
            writeln!(self.writer, "...")?;
        }
        Ok(())
    }

    /// Write a node that follows an indicator (`---`, `-`, `?` or `:`) on the current line.
    ///
    /// `inline` is set after `-` and `?`, where a collection may start on the same line.
    fn emit_val(&mut self, inline: bool, node: &Node) -> EmitResult {
        let (properties, inner) = split(node);
        let has_properties = if let Some(properties) = properties {
            self.writer.write_char(' ')?;
            self.emit_properties(properties)?;
            true
        } else {
            false
        };
        match inner {
            Node::Sequence { entries } if entries.is_empty() => self.writer.write_str(" []")?,
            Node::Mapping { entries } if entries.is_empty() => self.writer.write_str(" {}")?,
            Node::Sequence { .. } | Node::Mapping { .. } => {
                self.level += 1;
                if inline && self.compact && !has_properties {
                    self.writer.write_char(' ')?;
                } else {
                    writeln!(self.writer)?;
                    self.emit_indent()?;
                }
                let result = self.emit_collection(inner);
                self.level -= 1;
                result?;
            }
            scalar => {
                self.writer.write_char(' ')?;
                self.emit_scalar(scalar, true)?;
            }
        }
        Ok(())
    }

    fn emit_collection(&mut self, node: &Node) -> EmitResult {
        match node {
            Node::Sequence { entries } => self.emit_sequence(entries),
            Node::Mapping { entries } => self.emit_mapping(entries),
            _ => Err(EmitError::Event("expected a collection")),
        }
    }

    fn emit_sequence(&mut self, entries: &[Node]) -> EmitResult {
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                writeln!(self.writer)?;
                self.emit_indent()?;
            }
            self.writer.write_char('-')?;
            self.emit_val(true, entry)?;
        }
        Ok(())
    }

    fn emit_mapping(&mut self, entries: &[Node]) -> EmitResult {
        for (i, entry) in entries.iter().enumerate() {
            let Node::MappingEntry { key, value } = entry else {
                return Err(EmitError::Event("mapping holds a node that is not an entry"));
            };
            if i > 0 {
                writeln!(self.writer)?;
                self.emit_indent()?;
            }
            if is_complex_key(key) {
                self.writer.write_char('?')?;
                self.emit_val(true, key)?;
                writeln!(self.writer)?;
                self.emit_indent()?;
                self.writer.write_char(':')?;
                self.emit_val(true, value)?;
            } else {
                self.emit_key(key)?;
                self.writer.write_char(':')?;
                self.emit_val(false, value)?;
            }
        }
        Ok(())
    }

    /// Write a scalar key, with its properties.
    fn emit_key(&mut self, key: &Node) -> EmitResult {
        let (properties, inner) = split(key);
        if let Some(properties) = properties {
            self.emit_properties(properties)?;
            self.writer.write_char(' ')?;
        }
        self.emit_scalar(inner, false)?;
        // `*a:` would read as an alias named `a:`.
        if matches!(inner, Node::Alias { .. }) {
            self.writer.write_char(' ')?;
        }
        Ok(())
    }

    /// Write `&anchor !tag`.
    fn emit_properties(&mut self, properties: &Node) -> EmitResult {
        let (tag, anchor) = match properties {
            Node::Properties { tag, anchor } => (
                tag.as_deref().and_then(Node::name),
                anchor.as_deref().and_then(Node::name),
            ),
            _ => return Err(EmitError::Event("expected properties")),
        };
        if let Some(anchor) = anchor {
            write!(self.writer, "&{anchor}")?;
            if tag.is_some() {
                self.writer.write_char(' ')?;
            }
        }
        if let Some(tag) = tag {
            self.emit_tag(tag)?;
        }
        Ok(())
    }

    fn emit_tag(&mut self, tag: &str) -> EmitResult {
        if let Some(suffix) = tag.strip_prefix(CORE_TAG_PREFIX) {
            write!(self.writer, "!!{suffix}")?;
        } else if tag.starts_with('!') {
            self.writer.write_str(tag)?;
        } else {
            write!(self.writer, "!<{tag}>")?;
        }
        Ok(())
    }

    /// Write a scalar. Block scalars are only written where `block` is set.
    fn emit_scalar(&mut self, node: &Node, block: bool) -> EmitResult {
        match node {
            Node::Null => self.writer.write_char('~')?,
            Node::Alias { text } => write!(self.writer, "*{text}")?,
            Node::Text { text, quoting } => self.emit_text(text, *quoting, block)?,
            _ => return Err(EmitError::Event("expected a scalar")),
        }
        Ok(())
    }

    fn emit_text(&mut self, text: &str, quoting: Quoting, block: bool) -> EmitResult {
        let literal = block
            && is_valid_literal_block_scalar(text)
            && match quoting {
                Quoting::Literal | Quoting::Folded => true,
                Quoting::None | Quoting::Double => self.multiline_strings && text.contains('\n'),
                Quoting::Single => false,
            };
        if literal {
            return self.emit_literal_block(text);
        }
        match quoting {
            Quoting::None if is_plain_safe(text) => self.writer.write_str(text)?,
            Quoting::Single => match escape_single_quoted(text) {
                Ok(quoted) => self.writer.write_str(&quoted)?,
                Err(_) => write_double_quoted(self.writer, text)?,
            },
            _ => write_double_quoted(self.writer, text)?,
        }
        Ok(())
    }

    /// Write `text` as a literal block, its header on the current line.
    fn emit_literal_block(&mut self, text: &str) -> EmitResult {
        let body = text.trim_end_matches('\n');
        let chomping = match text.len() - body.len() {
            0 => "-",
            1 => "",
            _ => "+",
        };
        write!(self.writer, "|{chomping}")?;
        let lines = text.strip_suffix('\n').unwrap_or(text);
        let indent = self.spaces(self.level.max(0) + 1);
        for line in lines.split('\n') {
            writeln!(self.writer)?;
            if !line.is_empty() {
                write!(self.writer, "{:indent$}{line}", "")?;
            }
        }
        Ok(())
    }

    fn emit_indent(&mut self) -> EmitResult {
        let indent = self.spaces(self.level);
        write!(self.writer, "{:indent$}", "")?;
        Ok(())
    }

    /// The number of spaces of `level` nested indentations.
    fn spaces(&self, level: isize) -> usize {
        usize::try_from(level).unwrap_or(0) * self.indent_step as usize
    }
}

/// Return the properties and the inner node of a wrapper, or the node itself.
fn split(node: &Node) -> (Option<&Node>, &Node) {
    match node {
        Node::Content {
            properties,
            content: inner,
        }
        | Node::Collection {
            properties,
            collection: inner,
        } => (properties.as_deref(), inner),
        node => (None, node),
    }
}

/// Collections are written as `? key` so that block keys need no special handling.
fn is_complex_key(key: &Node) -> bool {
    matches!(split(key).1, Node::Sequence { .. } | Node::Mapping { .. })
}

/// Check if the string can be expressed as a literal block scalar.
///
/// The first line must not start with a blank, since the indentation of the block is detected
/// from it.
fn is_valid_literal_block_scalar(text: &str) -> bool {
    let first = text.trim_start_matches('\n');
    !first.is_empty()
        && !first.starts_with([' ', '\t'])
        && text
            .chars()
            .all(|c| c != '\r' && !is_bom(c) && is_printable(c))
}

/// Check if `text` reads back as the same plain scalar text.
///
/// This says nothing of how it resolves: `true` is plain-safe.
pub(crate) fn is_plain_safe(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    let second = text.chars().nth(1);
    let indicator_ok = match first {
        '-' | '?' | ':' => second.is_some_and(|c| !matches!(c, ' ' | '\t')),
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => false,
        _ => true,
    };
    indicator_ok
        && !text.starts_with([' ', '\t'])
        && !text.ends_with([' ', '\t', ':'])
        && !text.starts_with("---")
        && !text.starts_with("...")
        && !text.contains(": ")
        && !text.contains(" #")
        && !text.contains(['{', '}', '[', ']', ','])
        // After a blank, these start a node of their own.
        && !text.split([' ', '\t']).skip(1).any(|word| {
            matches!(word, "-" | "?")
                || word.starts_with(['\'', '"', '&', '*', '!', '#', '|', '>', '%', '@', '`'])
        })
        && text
            .chars()
            .all(|c| c != '\n' && c != '\r' && c != '\t' && !is_bom(c) && is_printable(c))
}

/// Check if the string requires quoting to be read back as a string.
///
/// Besides what [`is_plain_safe`] rejects, texts that the core schema resolves to another type
/// are quoted, as are timestamps and the YAML 1.1 booleans.
pub(crate) fn needs_quotes(text: &str) -> bool {
    !is_plain_safe(text)
        || !matches!(CoreSchema.guess(text), Value::String(_))
        || CoreSchema.is_timestamp(text)
        || matches!(
            text,
            // http://yaml.org/type/bool.html
            "y" | "Y" | "yes" | "Yes" | "YES" | "n" | "N" | "no" | "No" | "NO"
                | "on" | "On" | "ON" | "off" | "Off" | "OFF"
        )
}

#[cfg(test)]
mod test {
    use yamlet_parser::parse_str;

    use super::*;

    fn write(input: &str) -> String {
        let root = parse_str(input).unwrap();
        let mut output = String::new();
        let mut writer = Writer::new(&mut output);
        writer.explicit_document_end(false);
        writer.write(&root).unwrap();
        output
    }

    #[test]
    fn scalars_keep_their_quoting() {
        assert_eq!(write("a"), "--- a\n");
        assert_eq!(write("'a'"), "--- 'a'\n");
        assert_eq!(write("\"a\\tb\""), "--- \"a\\tb\"\n");
        assert_eq!(write("'it''s'"), "--- 'it''s'\n");
        assert_eq!(write("~"), "--- ~\n");
    }

    #[test]
    fn nested_collections() {
        assert_eq!(
            write("a:\n  - b\n  - c: d\n    e: f\nempty: []\n"),
            "---\na:\n  - b\n  - c: d\n    e: f\nempty: []\n"
        );
        assert_eq!(write("- - a\n  - b\n- {}"), "---\n- - a\n  - b\n- {}\n");
    }

    #[test]
    fn properties_and_aliases() {
        assert_eq!(
            write("a: &x !!str 1\nb: *x\nc: &y\n  - 1\n"),
            "---\na: &x !!str 1\nb: *x\nc: &y\n  - 1\n"
        );
        assert_eq!(write("- !local x"), "---\n- !local x\n");
    }

    #[test]
    fn complex_keys() {
        assert_eq!(write("? [a, b]\n: c\n"), "---\n? - a\n  - b\n: c\n");
    }

    #[test]
    fn literal_blocks() {
        assert_eq!(write("a: |\n  x\n  y\n"), "---\na: |\n  x\n  y\n");
        assert_eq!(write("- |-\n  x\n"), "---\n- |-\n  x\n");

        // The indentation of a block is detected from its first line.
        let root = Node::sequence(vec![Node::scalar(" x\n", Quoting::Literal)]);
        let mut output = String::new();
        Writer::new(&mut output).write(&root).unwrap();
        assert_eq!(output, "---\n- \" x\\n\"\n...\n");
    }

    #[test]
    fn streams() {
        let root = parse_str("a\n---\nb").unwrap();
        let mut output = String::new();
        Writer::new(&mut output).write(&root).unwrap();
        assert_eq!(output, "--- a\n...\n--- b\n...\n");
    }

    #[test]
    fn plain_safety() {
        for text in ["a", "a b", "-a", "http://x", "a#b", "1.0"] {
            assert!(is_plain_safe(text), "{text}");
        }
        for text in ["", "- a", "a: b", "a #b", " a", "a:", "[a", "&a", "--- a", "a\nb"] {
            assert!(!is_plain_safe(text), "{text}");
        }
        for text in ["a 'b'", "a &b", "a - b", "a !b"] {
            assert!(!is_plain_safe(text), "{text}");
        }
        for text in ["1.0", "true", "~", "yes", "2001-12-14", "0x1f", ".nan"] {
            assert!(needs_quotes(text), "{text}");
        }
        assert!(!needs_quotes("abc"));
    }
}
