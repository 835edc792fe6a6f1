// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! YAML tokenizer and parser in pure Rust.
//!
//! **If you want to read typed values out of a YAML document or write one, use `yamlet` instead
//! of `yamlet-parser`. This crate contains only the tokenizer and the parser.**
//!
//! Text goes through the following stages:
//!  1. A [`RuneStream`] (or any [`ResourceStream<Option<char>>`]) provides the runes.
//!  2. The [`Tokenizer`] turns runes into [`Token`]s. Its meaning of a rune depends on a stack of
//!     contexts (block, flow, quoted scalar, ...).
//!  3. The [`Parser`] turns tokens into a tree of [`Node`]s.
//!
//! Both the tokenizer and the parser look ahead through an [`Accessor`], a buffer with nested
//! checkpoints. The parser validates flow indicators and quotes with a [`BalanceChecker`].
//!
//! # Usage
//!
//! ```
//! use yamlet_parser::{parse_str, Node, Quoting};
//!
//! let Node::Stream { documents } = parse_str("a: [1, 2]").unwrap() else { unreachable!() };
//! let (key, _) = documents[0].mapping_entries().unwrap().next().unwrap();
//! assert_eq!(key.as_text(), Some(("a", Quoting::None)));
//! ```
//!
//! # Features
//!
//! #### `debug_prints`
//! Enables debug prints in the tokenizer and the parser. Prints are written to stderr only if the
//! `YAMLET_DEBUG` environment variable is set. Do not enable if you are consuming the crate
//! rather than working on it as this can significantly decrease performance.

#![warn(missing_docs, clippy::pedantic)]

pub mod char_traits;
#[macro_use]
mod debug;
mod accessor;
mod ast;
mod balance;
pub mod escape;
pub mod input;
mod parser;
mod token;
mod tokenizer;

pub use crate::accessor::{Accessor, ResourceStream};
pub use crate::ast::{Node, NodeType, Quoting};
pub use crate::balance::{BalanceChecker, Memento};
pub use crate::char_traits::Charset;
pub use crate::escape::EscapeError;
pub use crate::input::{IterRunes, RunePool, RuneStream};
pub use crate::parser::{parse_str, ParseError, ParseErrorKind, Parser, MAX_NESTING};
pub use crate::token::{ConformanceCache, Position, Token, TokenKind};
pub use crate::tokenizer::{tokenize, ContextType, Tokenizer};
