// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! Typed YAML reading and writing over the syntax tree of `yamlet-parser`.
//!
//! # Usage
//!
//! Rust values are read out of a document through [`Decode`], and written through [`Encode`].
//! Both are implemented for the primitive types, strings, collections and the dynamic [`Value`].
//! Structs get theirs from [`yaml_record!`]:
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! let ports: BTreeMap<String, Vec<u16>> = yamlet::from_str("http: [80, 8080]\nssh: [22]").unwrap();
//! assert_eq!(ports["http"], [80, 8080]);
//! assert_eq!(yamlet::to_string(&ports["ssh"]).unwrap(), "---\n- 22\n...\n");
//! ```
//!
//! Decoding does not go through an intermediate value: the [`Reader`] pulls typed values off
//! the tree, resolving plain scalars with a [`Schema`] (the YAML 1.2 [`CoreSchema`] by default).
//! A value of the wrong type is denied with a [`DenyError`] and the reader stays in place, so that
//! another type may be tried:
//!
//! ```
//! use yamlet::{Reader, ReadError};
//! use yamlet_parser::parse_str;
//!
//! let root = parse_str("[0x1f, yes]").unwrap();
//! let mut reader = Reader::new(&root);
//! let sequence = reader.expect_sequence().unwrap();
//! assert_eq!(sequence.size(), 2);
//! assert_eq!(reader.expect_integer(), Ok(31));
//! assert!(matches!(reader.expect_boolean(), Err(ReadError::Deny(_))));
//! assert_eq!(reader.expect_string().as_deref(), Ok("yes"));
//! assert!(!reader.has_unprocessed_items(&sequence));
//! ```
//!
//! Writing goes the other way: an [`Inserter`] ([`TreeBuilder`]) builds a tree that the
//! [`Writer`] turns into text.
//!
//! # Features
//! **Note:** With all features disabled, this crate's MSRV is `1.70.0`.
//!
//! #### `encoding` (_enabled by default_)
//! Enables decoding of byte input in UTF-8 and UTF-16, told apart by their byte order mark. See
//! [`from_slice`] and [`ByteDecoder`].
//!
//! #### `debug_prints`
//! Enables the debug traces of the reader and the parser. They are written to stderr only if the
//! `YAMLET_DEBUG` environment variable is set.

#![warn(missing_docs, clippy::pedantic)]

#[macro_use]
mod debug;

mod builder;
mod decode;
mod encode;
mod macros;
mod reader;
mod schema;
mod value;
mod writer;

pub use crate::builder::TreeBuilder;
pub use crate::decode::{from_node, Decode, Decoder, Unmarshaler};
pub use crate::encode::{Encode, Inserter, Marshaler};
pub use crate::reader::{
    look_through, AliasDereferenceError, AnyExpecter, AnyNode, BooleanExpecter, CollectionState,
    DenyError, Expecter, FloatExpecter, IntegerExpecter, JoinedErrors, MappingExpecter,
    NullExpecter, Nullable, ReadError, Reader, Scope, SequenceExpecter, StreamExpecter,
    StringExpecter, TimestampExpecter, UnsignedExpecter, Verdict,
};
pub use crate::schema::{parse_core_schema_fp, CoreSchema, Schema, CORE_TAG_PREFIX};
pub use crate::value::{Mapping, Timestamp, Value};
pub use crate::writer::{EmitError, EmitResult, Writer};

#[cfg(feature = "encoding")]
mod encoding;
#[cfg(feature = "encoding")]
pub use crate::encoding::{from_slice, ByteDecoder, DecodingTrap, DecodingTrapFn};

// Re-export the tree types, which are part of the reader and writer APIs.
pub use yamlet_parser::{Node, NodeType, ParseError, Quoting};

/// Helpers for the expansion of [`yaml_record!`]. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use crate::decode::{decode_field, fill_default, fill_missing, FieldSlot};
}

/// Parse `source` and decode a `T` from it.
///
/// # Errors
/// Returns [`ReadError::Parse`] if `source` is not valid YAML, or the errors raised while
/// reading the `T`, joined.
pub fn from_str<T: Decode>(source: &str) -> Result<T, ReadError> {
    let root = yamlet_parser::parse_str(source)?;
    from_node(&root)
}

/// Build the tree of `value`, as a stream of one document.
///
/// # Errors
/// Returns an error if the [`Encode`] implementation of `T` fails or is unbalanced.
pub fn to_node<T: Encode + ?Sized>(value: &T) -> Result<Node, EmitError> {
    let mut builder = TreeBuilder::new();
    value.encode(&mut builder)?;
    builder.finish()
}

/// Write `value` as a YAML document.
///
/// # Errors
/// Returns an error if the [`Encode`] implementation of `T` fails or is unbalanced.
pub fn to_string<T: Encode + ?Sized>(value: &T) -> Result<String, EmitError> {
    let node = to_node(value)?;
    let mut output = String::new();
    Writer::new(&mut output).write(&node)?;
    Ok(output)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn top_level_functions() {
        let value: Value = from_str("a: [1, ~]").unwrap();
        assert_eq!(value["a"][0], Value::Integer(1));
        assert!(value["a"][1].is_null());
        assert_eq!(to_string(&value).unwrap(), "---\na:\n  - 1\n  - ~\n...\n");

        assert!(matches!(from_str::<Value>("[a"), Err(ReadError::Parse(_))));
        assert_eq!(
            from_str::<i64>("[1]"),
            Err(ReadError::Deny(DenyError {
                expecter_name: "integer",
                node_type: NodeType::Sequence,
            }))
        );
    }
}
