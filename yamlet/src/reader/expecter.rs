//! Typed demands on the next node of a [`Reader`](crate::Reader).
//!
//! The reader shows nodes one at a time to an [`Expecter`] until it gives a verdict other than
//! [`Verdict::Continue`]. Wrapper nodes (a stream of one document, the content and collection
//! nodes that hold properties) are looked through with [`look_through`].

use yamlet_parser::{Node, Quoting};

use crate::schema::{Schema, CORE_TAG_PREFIX};
use crate::value::{Timestamp, Value};

/// What an expecter knows of the node it is shown, besides the node itself.
pub struct Scope<'s> {
    /// The schema resolving plain scalars.
    pub schema: &'s dyn Schema,
    /// The tag of the innermost wrapper that had one.
    pub tag: Option<&'s str>,
}

/// The judgement of an [`Expecter`] on a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict<T> {
    /// The node holds the value.
    Match(T),
    /// The node is a collection whose items are to be read next.
    Enter(T),
    /// The node is a wrapper. The reader shows its children next.
    Continue,
    /// The node cannot hold the value.
    Deny,
}

impl<T> Verdict<T> {
    /// Transform the payload of the verdict.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Verdict<U> {
        match self {
            Verdict::Match(v) => Verdict::Match(f(v)),
            Verdict::Enter(v) => Verdict::Enter(f(v)),
            Verdict::Continue => Verdict::Continue,
            Verdict::Deny => Verdict::Deny,
        }
    }
}

/// A typed demand on the next node.
///
/// Implement this to read types the reader has no `expect_*` method for, and pass it to
/// [`Reader::expect_with`](crate::Reader::expect_with).
///
/// ```
/// use yamlet::{Expecter, Reader, Scope, Verdict};
/// use yamlet_parser::{parse_str, Node};
///
/// /// Reads a `major.minor` version.
/// struct Version;
///
/// impl<'a> Expecter<'a> for Version {
///     type Output = (u32, u32);
///
///     fn name(&self) -> &'static str {
///         "version"
///     }
///
///     fn process(&mut self, node: &'a Node, _: &Scope<'_>) -> Verdict<(u32, u32)> {
///         let Node::Text { text, .. } = node else {
///             return yamlet::look_through(node);
///         };
///         let Some((major, minor)) = text.split_once('.') else {
///             return Verdict::Deny;
///         };
///         match (major.parse(), minor.parse()) {
///             (Ok(major), Ok(minor)) => Verdict::Match((major, minor)),
///             _ => Verdict::Deny,
///         }
///     }
/// }
///
/// let root = parse_str("'1.12'").unwrap();
/// assert_eq!(Reader::new(&root).expect_with(Version), Ok((1, 12)));
/// ```
pub trait Expecter<'a> {
    /// The value extracted from a matching node.
    type Output;

    /// The name of the expecter, reported in [`DenyError`](crate::DenyError)s.
    fn name(&self) -> &'static str;

    /// Judge `node`.
    fn process(&mut self, node: &'a Node, scope: &Scope<'_>) -> Verdict<Self::Output>;
}

/// Continue through wrapper nodes, deny anything else.
pub fn look_through<T>(node: &Node) -> Verdict<T> {
    match node {
        Node::Content { .. } | Node::Collection { .. } => Verdict::Continue,
        Node::Stream { documents } if documents.len() == 1 => Verdict::Continue,
        _ => Verdict::Deny,
    }
}

/// Return the text of a plain scalar whose tag allows one of the `core` types.
///
/// Tags outside the core schema do not restrict the type.
fn plain_text<'n>(node: &'n Node, scope: &Scope<'_>, core: &[&str]) -> Option<&'n str> {
    let Node::Text {
        text,
        quoting: Quoting::None,
    } = node
    else {
        return None;
    };
    match scope.tag.and_then(|tag| tag.strip_prefix(CORE_TAG_PREFIX)) {
        Some(name) if !core.contains(&name) => None,
        _ => Some(text.as_str()),
    }
}

/// Return whether `node` stands for the absence of a value.
fn is_null(node: &Node, scope: &Scope<'_>) -> bool {
    match node {
        Node::Null => true,
        Node::Stream { documents } => documents.is_empty(),
        Node::Text { .. } => {
            plain_text(node, scope, &["null"]).is_some_and(|text| scope.schema.is_null(text))
        }
        _ => false,
    }
}

macro_rules! scalar_expecter {
    ($(#[$attr:meta])* $name:ident, $display:literal, $output:ty, [$($core:literal),*], |$text:ident, $schema:ident| $parse:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<'a> Expecter<'a> for $name {
            type Output = $output;

            fn name(&self) -> &'static str {
                $display
            }

            fn process(&mut self, node: &'a Node, scope: &Scope<'_>) -> Verdict<$output> {
                if !matches!(node, Node::Text { .. }) {
                    return look_through(node);
                }
                let $schema = scope.schema;
                match plain_text(node, scope, &[$($core),*]).and_then(|$text| $parse) {
                    Some(value) => Verdict::Match(value),
                    None => Verdict::Deny,
                }
            }
        }
    };
}

scalar_expecter!(
    /// Expects a signed integer.
    IntegerExpecter, "integer", i64, ["int"], |text, schema| schema.parse_integer(text)
);
scalar_expecter!(
    /// Expects an unsigned integer.
    UnsignedExpecter, "unsigned", u64, ["int"], |text, schema| schema.parse_unsigned(text)
);
scalar_expecter!(
    /// Expects a boolean.
    BooleanExpecter, "boolean", bool, ["bool"], |text, schema| schema.parse_boolean(text)
);
scalar_expecter!(
    /// Expects a floating point number. Integers are accepted.
    FloatExpecter, "float", f64, ["float", "int"], |text, schema| schema.parse_float(text)
);
scalar_expecter!(
    /// Expects a timestamp.
    TimestampExpecter, "timestamp", Timestamp, ["timestamp"],
    |text, schema| schema.is_timestamp(text).then(|| Timestamp::new_unchecked(text))
);

/// Expects a scalar of any quoting, taken as a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringExpecter;

impl<'a> Expecter<'a> for StringExpecter {
    type Output = String;

    fn name(&self) -> &'static str {
        "string"
    }

    fn process(&mut self, node: &'a Node, _: &Scope<'_>) -> Verdict<String> {
        match node {
            Node::Text { text, .. } => Verdict::Match(text.clone()),
            _ => look_through(node),
        }
    }
}

/// Expects the absence of a value: an empty node, a null scalar or an empty stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullExpecter;

impl<'a> Expecter<'a> for NullExpecter {
    type Output = ();

    fn name(&self) -> &'static str {
        "null"
    }

    fn process(&mut self, node: &'a Node, scope: &Scope<'_>) -> Verdict<()> {
        if is_null(node, scope) {
            Verdict::Match(())
        } else if matches!(node, Node::Text { .. }) {
            Verdict::Deny
        } else {
            look_through(node)
        }
    }
}

/// Expects a sequence, whose items are read next.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceExpecter;

impl<'a> Expecter<'a> for SequenceExpecter {
    type Output = ();

    fn name(&self) -> &'static str {
        "sequence"
    }

    fn process(&mut self, node: &'a Node, _: &Scope<'_>) -> Verdict<()> {
        match node {
            Node::Sequence { .. } => Verdict::Enter(()),
            _ => look_through(node),
        }
    }
}

/// Expects a mapping, whose keys and values are read next.
#[derive(Clone, Copy, Debug, Default)]
pub struct MappingExpecter;

impl<'a> Expecter<'a> for MappingExpecter {
    type Output = ();

    fn name(&self) -> &'static str {
        "mapping"
    }

    fn process(&mut self, node: &'a Node, _: &Scope<'_>) -> Verdict<()> {
        match node {
            Node::Mapping { .. } => Verdict::Enter(()),
            _ => look_through(node),
        }
    }
}

/// Expects a stream, whose documents are read next.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamExpecter;

impl<'a> Expecter<'a> for StreamExpecter {
    type Output = ();

    fn name(&self) -> &'static str {
        "stream"
    }

    fn process(&mut self, node: &'a Node, _: &Scope<'_>) -> Verdict<()> {
        match node {
            Node::Stream { .. } => Verdict::Enter(()),
            _ => Verdict::Deny,
        }
    }
}

/// What [`AnyExpecter`] found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyNode {
    /// A resolved scalar, or null.
    Scalar(Value),
    /// A sequence, whose items are read next.
    Sequence,
    /// A mapping, whose keys and values are read next.
    Mapping,
}

/// Expects any node.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyExpecter;

impl<'a> Expecter<'a> for AnyExpecter {
    type Output = AnyNode;

    fn name(&self) -> &'static str {
        "any"
    }

    fn process(&mut self, node: &'a Node, scope: &Scope<'_>) -> Verdict<AnyNode> {
        match node {
            Node::Text { text, quoting } => scope
                .schema
                .resolve(text, *quoting, scope.tag)
                .map_or(Verdict::Deny, |value| Verdict::Match(AnyNode::Scalar(value))),
            Node::Null => Verdict::Match(AnyNode::Scalar(Value::Null)),
            Node::Stream { documents } if documents.is_empty() => {
                Verdict::Match(AnyNode::Scalar(Value::Null))
            }
            Node::Sequence { .. } => Verdict::Enter(AnyNode::Sequence),
            Node::Mapping { .. } => Verdict::Enter(AnyNode::Mapping),
            _ => look_through(node),
        }
    }
}

/// Matches null nodes with `None`, and delegates anything else to the inner expecter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Nullable<E>(pub E);

impl<'a, E: Expecter<'a>> Expecter<'a> for Nullable<E> {
    type Output = Option<E::Output>;

    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn process(&mut self, node: &'a Node, scope: &Scope<'_>) -> Verdict<Self::Output> {
        if is_null(node, scope) {
            Verdict::Match(None)
        } else {
            self.0.process(node, scope).map(Some)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::schema::CoreSchema;

    use super::*;

    fn scope(tag: Option<&str>) -> Scope<'_> {
        Scope {
            schema: &CoreSchema,
            tag,
        }
    }

    fn text(text: &str, quoting: Quoting) -> Node {
        Node::Text {
            text: text.into(),
            quoting,
        }
    }

    #[test]
    fn integers() {
        let plain = text("0x10", Quoting::None);
        assert_eq!(IntegerExpecter.process(&plain, &scope(None)), Verdict::Match(16));
        assert_eq!(
            IntegerExpecter.process(&text("10", Quoting::Single), &scope(None)),
            Verdict::Deny
        );
        assert_eq!(
            IntegerExpecter.process(&plain, &scope(Some("tag:yaml.org,2002:str"))),
            Verdict::Deny
        );
        assert_eq!(
            IntegerExpecter.process(&plain, &scope(Some("!hex"))),
            Verdict::Match(16)
        );
        assert_eq!(IntegerExpecter.process(&Node::Null, &scope(None)), Verdict::Deny);
    }

    #[test]
    fn wrappers_are_looked_through() {
        let node = Node::scalar("1", Quoting::None);
        assert_eq!(IntegerExpecter.process(&node, &scope(None)), Verdict::Continue);
        let stream = Node::Stream {
            documents: vec![node.clone()],
        };
        assert_eq!(BooleanExpecter.process(&stream, &scope(None)), Verdict::Continue);
        let stream = Node::Stream {
            documents: vec![node.clone(), node],
        };
        assert_eq!(BooleanExpecter.process(&stream, &scope(None)), Verdict::Deny);
    }

    #[test]
    fn nullable() {
        let mut expecter = Nullable(IntegerExpecter);
        let tilde = text("~", Quoting::None);
        assert_eq!(expecter.process(&tilde, &scope(None)), Verdict::Match(None));
        assert_eq!(expecter.process(&Node::Null, &scope(None)), Verdict::Match(None));
        assert_eq!(
            expecter.process(&text("~", Quoting::Double), &scope(None)),
            Verdict::Deny
        );
        assert_eq!(
            expecter.process(&text("3", Quoting::None), &scope(None)),
            Verdict::Match(Some(3))
        );
        let mapping = Node::Mapping { entries: vec![] };
        assert_eq!(expecter.process(&mapping, &scope(None)), Verdict::Deny);
        assert_eq!(expecter.name(), "integer");
    }

    #[test]
    fn floats_accept_integers() {
        let node = text("3", Quoting::None);
        assert_eq!(FloatExpecter.process(&node, &scope(None)), Verdict::Match(3.0));
        assert_eq!(
            FloatExpecter.process(&node, &scope(Some("tag:yaml.org,2002:int"))),
            Verdict::Match(3.0)
        );
        assert_eq!(
            FloatExpecter.process(&node, &scope(Some("tag:yaml.org,2002:bool"))),
            Verdict::Deny
        );
    }

    #[test]
    fn any() {
        let sequence = Node::Sequence { entries: vec![] };
        assert_eq!(
            AnyExpecter.process(&sequence, &scope(None)),
            Verdict::Enter(AnyNode::Sequence)
        );
        assert_eq!(
            AnyExpecter.process(&text("yes", Quoting::None), &scope(None)),
            Verdict::Match(AnyNode::Scalar(Value::String("yes".into())))
        );
        assert_eq!(
            AnyExpecter.process(&text("x", Quoting::None), &scope(Some("tag:yaml.org,2002:int"))),
            Verdict::Deny
        );
    }
}
