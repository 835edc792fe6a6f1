use std::{borrow::Cow, fmt};

use thiserror::Error;
use yamlet_parser::{NodeType, ParseError, MAX_NESTING};

/// An expecter found a node it cannot extract its value from.
///
/// The route of the reader is left where it was before the expectation: the node may be probed
/// again with another expectation.
///
/// ```
/// # use yamlet::{DenyError, ReadError, Reader};
/// # use yamlet_parser::{parse_str, NodeType};
/// let root = parse_str("true").unwrap();
/// let mut reader = Reader::new(&root);
/// let Err(ReadError::Deny(error)) = reader.expect_integer() else { panic!() };
/// assert_eq!(error, DenyError { expecter_name: "integer", node_type: NodeType::Text });
/// assert_eq!(reader.expect_boolean(), Ok(true));
/// ```
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{expecter_name} expecter denied {node_type} node")]
pub struct DenyError {
    /// The name of the expecter.
    pub expecter_name: &'static str,
    /// The type of the offending node.
    pub node_type: NodeType,
}

/// An alias could not be replaced by the node it refers to.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AliasDereferenceError {
    /// No anchor of that name was visited before the alias.
    #[error("alias `*{0}` refers to an undefined anchor")]
    Undefined(String),
    /// The anchored node contains the alias.
    #[error("alias `*{0}` refers to a node that contains it")]
    Recursive(String),
}

impl AliasDereferenceError {
    /// Return the name of the alias, without the `*`.
    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            AliasDereferenceError::Undefined(alias) | AliasDereferenceError::Recursive(alias) => {
                alias
            }
        }
    }
}

/// An error raised while reading values out of a tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    /// The node had the wrong type.
    #[error(transparent)]
    Deny(#[from] DenyError),
    /// An alias could not be dereferenced.
    #[error(transparent)]
    AliasDereference(#[from] AliasDereferenceError),
    /// A value was expected after the last node of the tree.
    #[error("{expecter} expecter found no node to read")]
    Exhausted {
        /// The name of the expecter.
        expecter: &'static str,
    },
    /// A number does not fit in the requested type.
    #[error("`{text}` is out of range for the {expecter} expecter")]
    OutOfRange {
        /// The name of the expecter.
        expecter: &'static str,
        /// The number, as written.
        text: String,
    },
    /// A fixed-size sequence had the wrong number of items.
    #[error("expected {expected} items, found {found}")]
    Length {
        /// The number of items of the target type.
        expected: usize,
        /// The number of items in the sequence.
        found: usize,
    },
    /// A value is nested deeper than [`MAX_NESTING`] levels.
    #[error("values nested deeper than {} levels", MAX_NESTING)]
    NestingLimit,
    /// An error raised by a decoder implementation.
    #[error("{0}")]
    Custom(String),
    /// The input could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The input bytes could not be decoded to text.
    #[error("{0}")]
    Encoding(Cow<'static, str>),
    /// Several errors, in the order they were raised.
    #[error(transparent)]
    Joined(#[from] JoinedErrors),
}

impl ReadError {
    /// Create a [`ReadError::Custom`] from any message.
    pub fn custom(message: impl fmt::Display) -> Self {
        ReadError::Custom(message.to_string())
    }

    /// Join `errors` into one.
    ///
    /// A single error is returned as-is. Nested joined errors are flattened.
    #[must_use]
    pub fn joined(errors: Vec<ReadError>) -> Self {
        let mut flat = Vec::with_capacity(errors.len());
        for error in errors {
            match error {
                ReadError::Joined(JoinedErrors(inner)) => flat.extend(inner),
                error => flat.push(error),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            ReadError::Joined(JoinedErrors(flat))
        }
    }

    /// Return whether this is a [`ReadError::Deny`].
    #[must_use]
    pub fn is_deny(&self) -> bool {
        matches!(self, ReadError::Deny(_))
    }

    /// Return whether reading may continue with the next node after this error.
    ///
    /// Type mismatches are recoverable. A corrupt document (undefined alias, parse error) or an
    /// exhausted tree is not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReadError::Deny(_)
            | ReadError::OutOfRange { .. }
            | ReadError::Length { .. }
            | ReadError::Custom(_) => true,
            ReadError::Joined(JoinedErrors(errors)) => errors.iter().all(Self::is_recoverable),
            ReadError::AliasDereference(_)
            | ReadError::Exhausted { .. }
            | ReadError::NestingLimit
            | ReadError::Parse(_)
            | ReadError::Encoding(_) => false,
        }
    }
}

/// A list of errors, displayed one per line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinedErrors(pub Vec<ReadError>);

impl fmt::Display for JoinedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for JoinedErrors {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn joined_flattens() {
        let deny = ReadError::Deny(DenyError {
            expecter_name: "string",
            node_type: NodeType::Mapping,
        });
        let inner = ReadError::joined(vec![deny.clone(), ReadError::custom("missing field `a`")]);
        let outer = ReadError::joined(vec![inner, ReadError::Length { expected: 2, found: 3 }]);
        let ReadError::Joined(JoinedErrors(errors)) = &outer else {
            panic!("{outer:?}")
        };
        assert_eq!(errors.len(), 3);
        assert!(outer.is_recoverable());
        assert_eq!(
            outer.to_string(),
            "string expecter denied mapping node\nmissing field `a`\nexpected 2 items, found 3"
        );
        assert_eq!(ReadError::joined(vec![deny.clone()]), deny);
    }

    #[test]
    fn fatal_errors() {
        let alias = ReadError::from(AliasDereferenceError::Undefined("x".into()));
        assert!(!alias.is_recoverable());
        assert!(!alias.is_deny());
        assert_eq!(alias.to_string(), "alias `*x` refers to an undefined anchor");
        assert!(!ReadError::joined(vec![alias, ReadError::custom("c")]).is_recoverable());
    }
}
