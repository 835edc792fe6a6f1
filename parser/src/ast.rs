//! The abstract syntax tree built by the [`Parser`](crate::Parser).
//!
//! The tree is a closed set of variants. Every traversal (reading, writing, printing) is a
//! `match` over [`Node`].
//!
//! Shapes produced by the parser:
//!  * Scalars are wrapped in [`Node::Content`], collections in [`Node::Collection`], whether
//!    they have properties or not.
//!  * An empty value (`key:` with nothing after it) is a [`Node::Content`] holding a
//!    [`Node::Null`].
//!  * Aliases are bare [`Node::Alias`] nodes. They are not resolved by the parser.

use std::fmt;

/// How a scalar was written in the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quoting {
    /// A plain scalar. Subject to schema resolution.
    #[default]
    None,
    /// A `'single quoted'` scalar.
    Single,
    /// A `"double quoted"` scalar.
    Double,
    /// A `|` literal block scalar.
    Literal,
    /// A `>` folded block scalar.
    Folded,
}

impl Quoting {
    /// Return whether the scalar is plain, and hence subject to schema resolution.
    #[must_use]
    pub fn is_plain(self) -> bool {
        self == Quoting::None
    }
}

/// A node of the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// The root of a parsed input: a list of documents.
    Stream {
        /// The documents, each one a content or collection node.
        documents: Vec<Node>,
    },
    /// A scalar, with its optional properties.
    Content {
        /// A [`Node::Properties`] node.
        properties: Option<Box<Node>>,
        /// A [`Node::Text`] or [`Node::Null`] node.
        content: Box<Node>,
    },
    /// A collection, with its optional properties.
    Collection {
        /// A [`Node::Properties`] node.
        properties: Option<Box<Node>>,
        /// A [`Node::Sequence`] or [`Node::Mapping`] node.
        collection: Box<Node>,
    },
    /// A sequence of nodes.
    Sequence {
        /// The entries of the sequence.
        entries: Vec<Node>,
    },
    /// A mapping. Entries are kept in document order.
    Mapping {
        /// [`Node::MappingEntry`] nodes.
        entries: Vec<Node>,
    },
    /// A key-value pair of a mapping.
    MappingEntry {
        /// The key.
        key: Box<Node>,
        /// The value.
        value: Box<Node>,
    },
    /// The text of a scalar, unescaped and folded.
    Text {
        /// The value of the scalar.
        text: String,
        /// How the scalar was written.
        quoting: Quoting,
    },
    /// A resolved tag, e.g. `tag:yaml.org,2002:str` for `!!str`.
    Tag {
        /// The tag.
        text: String,
    },
    /// An anchor name.
    Anchor {
        /// The name, without the `&`.
        text: String,
    },
    /// A reference to an anchored node.
    Alias {
        /// The name, without the `*`.
        text: String,
    },
    /// The absence of a value.
    Null,
    /// The properties of a node.
    Properties {
        /// A [`Node::Tag`] node.
        tag: Option<Box<Node>>,
        /// A [`Node::Anchor`] node.
        anchor: Option<Box<Node>>,
    },
}

/// The variant of a [`Node`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NodeType {
    Stream,
    Content,
    Collection,
    Sequence,
    Mapping,
    MappingEntry,
    Text,
    Tag,
    Anchor,
    Alias,
    Null,
    Properties,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeType::Stream => "stream",
            NodeType::Content => "content",
            NodeType::Collection => "collection",
            NodeType::Sequence => "sequence",
            NodeType::Mapping => "mapping",
            NodeType::MappingEntry => "mapping entry",
            NodeType::Text => "text",
            NodeType::Tag => "tag",
            NodeType::Anchor => "anchor",
            NodeType::Alias => "alias",
            NodeType::Null => "null",
            NodeType::Properties => "properties",
        })
    }
}

impl Node {
    /// Return the variant of the node.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Stream { .. } => NodeType::Stream,
            Node::Content { .. } => NodeType::Content,
            Node::Collection { .. } => NodeType::Collection,
            Node::Sequence { .. } => NodeType::Sequence,
            Node::Mapping { .. } => NodeType::Mapping,
            Node::MappingEntry { .. } => NodeType::MappingEntry,
            Node::Text { .. } => NodeType::Text,
            Node::Tag { .. } => NodeType::Tag,
            Node::Anchor { .. } => NodeType::Anchor,
            Node::Alias { .. } => NodeType::Alias,
            Node::Null => NodeType::Null,
            Node::Properties { .. } => NodeType::Properties,
        }
    }

    /// Create a scalar node without properties.
    #[must_use]
    pub fn scalar(text: impl Into<String>, quoting: Quoting) -> Self {
        Node::Content {
            properties: None,
            content: Box::new(Node::Text {
                text: text.into(),
                quoting,
            }),
        }
    }

    /// Create an empty value.
    #[must_use]
    pub fn null() -> Self {
        Node::Content {
            properties: None,
            content: Box::new(Node::Null),
        }
    }

    /// Create a sequence node without properties.
    #[must_use]
    pub fn sequence(entries: Vec<Node>) -> Self {
        Node::Collection {
            properties: None,
            collection: Box::new(Node::Sequence { entries }),
        }
    }

    /// Create a mapping node without properties from its key-value pairs.
    #[must_use]
    pub fn mapping(entries: Vec<(Node, Node)>) -> Self {
        Node::Collection {
            properties: None,
            collection: Box::new(Node::Mapping {
                entries: entries
                    .into_iter()
                    .map(|(key, value)| Node::MappingEntry {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                    .collect(),
            }),
        }
    }

    /// Attach properties to a content or collection node.
    ///
    /// Nothing is done if both `tag` and `anchor` are `None`. Other nodes are returned as-is.
    #[must_use]
    pub fn with_properties(self, tag: Option<String>, anchor: Option<String>) -> Self {
        if tag.is_none() && anchor.is_none() {
            return self;
        }
        let properties = Some(Box::new(Node::Properties {
            tag: tag.map(|text| Box::new(Node::Tag { text })),
            anchor: anchor.map(|text| Box::new(Node::Anchor { text })),
        }));
        match self {
            Node::Content { content, .. } => Node::Content {
                properties,
                content,
            },
            Node::Collection { collection, .. } => Node::Collection {
                properties,
                collection,
            },
            node => node,
        }
    }

    /// Return the properties of a content or collection node, as `(tag, anchor)`.
    #[must_use]
    pub fn properties(&self) -> (Option<&str>, Option<&str>) {
        match self {
            Node::Content {
                properties: Some(properties),
                ..
            }
            | Node::Collection {
                properties: Some(properties),
                ..
            } => match &**properties {
                Node::Properties { tag, anchor } => (
                    tag.as_deref().and_then(Node::name),
                    anchor.as_deref().and_then(Node::name),
                ),
                _ => (None, None),
            },
            _ => (None, None),
        }
    }

    /// Return the text of a text, tag, anchor or alias node.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Text { text, .. }
            | Node::Tag { text }
            | Node::Anchor { text }
            | Node::Alias { text } => Some(text),
            _ => None,
        }
    }

    /// Return the text of a scalar, looking through its content wrapper.
    #[must_use]
    pub fn as_text(&self) -> Option<(&str, Quoting)> {
        match self {
            Node::Text { text, quoting } => Some((text, *quoting)),
            Node::Content { content, .. } => content.as_text(),
            _ => None,
        }
    }

    /// Return whether the node is, or wraps, a [`Node::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Node::Null => true,
            Node::Content { content, .. } => content.is_null(),
            _ => false,
        }
    }

    /// Return the entries of a sequence, looking through its collection wrapper.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence { entries } => Some(entries),
            Node::Collection { collection, .. } => collection.as_sequence(),
            _ => None,
        }
    }

    /// Return the entries of a mapping as `(key, value)` pairs, looking through its collection
    /// wrapper.
    pub fn mapping_entries(&self) -> Option<impl Iterator<Item = (&Node, &Node)>> {
        let entries = match self {
            Node::Mapping { entries } => entries,
            Node::Collection { collection, .. } => match &**collection {
                Node::Mapping { entries } => entries,
                _ => return None,
            },
            _ => return None,
        };
        Some(entries.iter().filter_map(|entry| match entry {
            Node::MappingEntry { key, value } => Some((&**key, &**value)),
            _ => None,
        }))
    }

    /// Return the direct children of the node, in document order.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Stream { documents: entries }
            | Node::Sequence { entries }
            | Node::Mapping { entries } => entries.iter().collect(),
            Node::Content {
                properties,
                content: inner,
            }
            | Node::Collection {
                properties,
                collection: inner,
            } => properties.iter().map(|p| &**p).chain([&**inner]).collect(),
            Node::MappingEntry { key, value } => vec![&**key, &**value],
            Node::Properties { tag, anchor } => {
                tag.iter().chain(anchor.iter()).map(|n| &**n).collect()
            }
            Node::Text { .. }
            | Node::Tag { .. }
            | Node::Anchor { .. }
            | Node::Alias { .. }
            | Node::Null => vec![],
        }
    }

    /// Write an indented, one node per line dump of the tree.
    ///
    /// # Errors
    /// Returns an error if writing to `f` fails.
    pub fn dump(&self, f: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
        write!(f, "{:width$}{}", "", self.node_type(), width = depth * 2)?;
        match self {
            Node::Text { text, quoting } => write!(f, " {text:?} ({quoting:?})")?,
            Node::Tag { text } => write!(f, " !<{text}>")?,
            Node::Anchor { text } => write!(f, " &{text}")?,
            Node::Alias { text } => write!(f, " *{text}")?,
            _ => {}
        }
        writeln!(f)?;
        for child in self.children() {
            child.dump(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}
