use yamlet_parser::{parse_str, Node, Quoting};

use crate::encode::Inserter;
use crate::schema::CORE_TAG_PREFIX;
use crate::value::Timestamp;
use crate::writer::{needs_quotes, EmitError, EmitResult};

/// A collection being built.
#[derive(Debug)]
enum Frame {
    Sequence(Vec<Node>),
    Mapping {
        entries: Vec<(Node, Node)>,
        /// The key waiting for its value.
        key: Option<Node>,
    },
}

/// An [`Inserter`] building a tree, one document per top-level value.
///
/// Strings that would read back as another type are double-quoted.
///
/// ```
/// # use yamlet::{Inserter, TreeBuilder, Writer};
/// let mut builder = TreeBuilder::new();
/// builder.start_mapping().unwrap();
/// builder.insert_string("port").unwrap();
/// builder.insert_unsigned(8080).unwrap();
/// builder.insert_string("host").unwrap();
/// builder.insert_string("true").unwrap();
/// builder.end_mapping().unwrap();
///
/// let mut output = String::new();
/// Writer::new(&mut output).write(&builder.finish().unwrap()).unwrap();
/// assert_eq!(output, "---\nport: 8080\nhost: \"true\"\n...\n");
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    frames: Vec<Frame>,
    documents: Vec<Node>,
}

impl TreeBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stream of the documents built.
    ///
    /// # Errors
    /// Returns an error if a collection was left open.
    pub fn finish(self) -> Result<Node, EmitError> {
        if self.frames.is_empty() {
            Ok(Node::Stream {
                documents: self.documents,
            })
        } else {
            Err(EmitError::Event("collection start with no matching collection end"))
        }
    }

    fn push(&mut self, node: Node) -> EmitResult {
        match self.frames.last_mut() {
            None => self.documents.push(node),
            Some(Frame::Sequence(entries)) => entries.push(node),
            Some(Frame::Mapping { entries, key }) => match key.take() {
                Some(key) => entries.push((key, node)),
                None => *key = Some(node),
            },
        }
        Ok(())
    }

    fn push_plain(&mut self, text: String) -> EmitResult {
        self.push(Node::scalar(text, Quoting::None))
    }
}

impl Inserter for TreeBuilder {
    fn insert_integer(&mut self, value: i64) -> EmitResult {
        self.push_plain(value.to_string())
    }

    fn insert_unsigned(&mut self, value: u64) -> EmitResult {
        self.push_plain(value.to_string())
    }

    fn insert_boolean(&mut self, value: bool) -> EmitResult {
        self.push_plain(value.to_string())
    }

    fn insert_float(&mut self, value: f64) -> EmitResult {
        let text = if value.is_nan() {
            ".nan".to_owned()
        } else if value == f64::INFINITY {
            ".inf".to_owned()
        } else if value == f64::NEG_INFINITY {
            "-.inf".to_owned()
        } else {
            // `Debug` keeps the `.0` of integral values.
            format!("{value:?}")
        };
        self.push_plain(text)
    }

    fn insert_string(&mut self, value: &str) -> EmitResult {
        let quoting = if needs_quotes(value) {
            Quoting::Double
        } else {
            Quoting::None
        };
        self.push(Node::scalar(value, quoting))
    }

    fn insert_timestamp(&mut self, value: &Timestamp) -> EmitResult {
        self.push(
            Node::scalar(value.as_str(), Quoting::None)
                .with_properties(Some(format!("{CORE_TAG_PREFIX}timestamp")), None),
        )
    }

    fn insert_null(&mut self) -> EmitResult {
        self.push(Node::null())
    }

    fn start_sequence(&mut self) -> EmitResult {
        self.frames.push(Frame::Sequence(Vec::new()));
        Ok(())
    }

    fn end_sequence(&mut self) -> EmitResult {
        match self.frames.pop() {
            Some(Frame::Sequence(entries)) => self.push(Node::sequence(entries)),
            Some(Frame::Mapping { .. }) => {
                Err(EmitError::Event("mismatch in collection start/end"))
            }
            None => Err(EmitError::Event("collection end with no matching collection start")),
        }
    }

    fn start_mapping(&mut self) -> EmitResult {
        self.frames.push(Frame::Mapping {
            entries: Vec::new(),
            key: None,
        });
        Ok(())
    }

    fn end_mapping(&mut self) -> EmitResult {
        match self.frames.pop() {
            Some(Frame::Mapping { key: Some(_), .. }) => {
                Err(EmitError::Event("last mapping pair is missing its value"))
            }
            Some(Frame::Mapping { entries, key: None }) => self.push(Node::mapping(entries)),
            Some(Frame::Sequence(_)) => {
                Err(EmitError::Event("mismatch in collection start/end"))
            }
            None => Err(EmitError::Event("collection end with no matching collection start")),
        }
    }

    fn insert_raw(&mut self, raw: &[u8]) -> EmitResult {
        let text = std::str::from_utf8(raw).map_err(|e| EmitError::Custom(e.to_string()))?;
        let Node::Stream { mut documents } = parse_str(text)? else {
            return Err(EmitError::Event("the parser did not return a stream"));
        };
        match documents.len() {
            0 => self.insert_null(),
            1 => self.push(documents.remove(0)),
            n => Err(EmitError::Custom(format!(
                "raw YAML must hold a single document, found {n}"
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn documents(builder: TreeBuilder) -> Vec<Node> {
        match builder.finish().unwrap() {
            Node::Stream { documents } => documents,
            node => panic!("{node:?}"),
        }
    }

    #[test]
    fn scalars() {
        let mut builder = TreeBuilder::new();
        builder.insert_float(1.0).unwrap();
        builder.insert_float(f64::NEG_INFINITY).unwrap();
        builder.insert_string("1.0").unwrap();
        builder.insert_string("plain").unwrap();
        builder.insert_nullable_integer(None).unwrap();
        assert_eq!(
            documents(builder),
            [
                Node::scalar("1.0", Quoting::None),
                Node::scalar("-.inf", Quoting::None),
                Node::scalar("1.0", Quoting::Double),
                Node::scalar("plain", Quoting::None),
                Node::null(),
            ]
        );
    }

    #[test]
    fn unbalanced_calls() {
        let mut builder = TreeBuilder::new();
        builder.start_mapping().unwrap();
        builder.insert_string("a").unwrap();
        assert_eq!(
            builder.end_mapping(),
            Err(EmitError::Event("last mapping pair is missing its value"))
        );

        let mut builder = TreeBuilder::new();
        builder.start_sequence().unwrap();
        assert!(builder.end_mapping().is_err());
        assert!(TreeBuilder::new().end_sequence().is_err());

        let mut builder = TreeBuilder::new();
        builder.start_sequence().unwrap();
        assert!(builder.finish().is_err());
    }

    #[test]
    fn raw() {
        let mut builder = TreeBuilder::new();
        builder.start_sequence().unwrap();
        builder.insert_raw(b"{a: 1}").unwrap();
        builder.insert_raw(b"").unwrap();
        assert!(matches!(builder.insert_raw(b"a\n---\nb"), Err(EmitError::Custom(_))));
        assert!(matches!(builder.insert_raw(b"[a"), Err(EmitError::Parse(_))));
        builder.end_sequence().unwrap();
        let documents = documents(builder);
        let entries = documents[0].as_sequence().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].is_null());
    }
}
