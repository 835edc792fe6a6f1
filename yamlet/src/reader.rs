//! Pull-based extraction of typed values from a tree.
//!
//! A [`Reader`] walks a tree built by the parser. Each `expect_*` call reads the next value,
//! looking through wrappers, binding anchors and replacing aliases with the nodes they refer to.
//! Sequences and mappings are read item by item:
//!
//! ```
//! use yamlet::Reader;
//! use yamlet_parser::parse_str;
//!
//! let root = parse_str("ports: [80, 443]").unwrap();
//! let mut reader = Reader::new(&root);
//! let mapping = reader.expect_mapping().unwrap();
//! assert_eq!(mapping.size(), 1);
//! let mut ports = vec![];
//! while reader.has_unprocessed_items(&mapping) {
//!     assert_eq!(reader.expect_string().unwrap(), "ports");
//!     let sequence = reader.expect_sequence().unwrap();
//!     while reader.has_unprocessed_items(&sequence) {
//!         ports.push(reader.expect_integer().unwrap());
//!     }
//! }
//! assert_eq!(ports, [80, 443]);
//! ```
//!
//! The position of the reader is an explicit stack of frames (the route) rather than the call
//! stack, so that the iteration of a collection can span any number of public calls.

mod anchors;
mod error;
mod expecter;
mod route;

use yamlet_parser::{Node, MAX_NESTING};

use crate::schema::{CoreSchema, Schema};
use crate::value::{Mapping, Timestamp, Value};

use anchors::{AnchorKeeper, AnchorMemento};
pub use error::{AliasDereferenceError, DenyError, JoinedErrors, ReadError};
pub use expecter::{
    look_through, AnyExpecter, AnyNode, BooleanExpecter, Expecter, FloatExpecter,
    IntegerExpecter, MappingExpecter, NullExpecter, Nullable, Scope, SequenceExpecter,
    StreamExpecter, StringExpecter, TimestampExpecter, UnsignedExpecter, Verdict,
};
use route::RoutePoint;

/// The iteration of a sequence, a mapping or a stream.
///
/// Returned when the reader enters a collection. Pass it to [`Reader::has_unprocessed_items`]
/// before reading each item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionState {
    id: usize,
    size: usize,
}

impl CollectionState {
    /// Return the number of items of the collection. Mapping items are key-value pairs.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Return whether the collection has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// A saved position of a [`Reader`].
struct Checkpoint<'a> {
    route: Vec<RoutePoint<'a>>,
    anchors: AnchorMemento<'a>,
}

/// Reads typed values out of a tree.
///
/// A reader is a session over one tree: it owns the route and the anchor table and both start
/// empty. Create a new reader for each top-level read.
pub struct Reader<'a, S = CoreSchema> {
    schema: S,
    route: Vec<RoutePoint<'a>>,
    anchors: AnchorKeeper<'a>,
    checkpoints: Vec<Checkpoint<'a>>,
    /// Errors recorded with [`Reader::error`].
    errors: Vec<ReadError>,
    next_id: usize,
    /// Nesting of the values being read by [`Reader::any`].
    depth: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over `root` using the [`CoreSchema`].
    #[must_use]
    pub fn new(root: &'a Node) -> Self {
        Self::with_schema(root, CoreSchema)
    }
}

impl<'a, S: Schema> Reader<'a, S> {
    /// Create a reader over `root` resolving scalars with `schema`.
    pub fn with_schema(root: &'a Node, schema: S) -> Self {
        Self {
            schema,
            route: vec![RoutePoint::root(root)],
            anchors: AnchorKeeper::default(),
            checkpoints: Vec::new(),
            errors: Vec::new(),
            next_id: 1,
            depth: 0,
        }
    }

    /// Read the next value with a custom expecter.
    ///
    /// # Errors
    /// Returns the error of the expectation. The route of the reader is then left as it was
    /// before the call.
    pub fn expect_with<E: Expecter<'a>>(&mut self, mut expecter: E) -> Result<E::Output, ReadError> {
        let route = self.route.clone();
        let anchors = self.anchors.memento();
        let result = self.run(&mut expecter);
        if result.is_err() {
            debug_print!("{} failed, route restored to depth {}", expecter.name(), route.len());
            self.route = route;
            self.anchors.set_memento(anchors);
        }
        result
    }

    /// Show nodes to `expecter` until it matches or denies one.
    fn run<E: Expecter<'a>>(&mut self, expecter: &mut E) -> Result<E::Output, ReadError> {
        let name = expecter.name();
        let base = self.unwind(name)?;
        let mut tag = None;
        let mut node = self.next_node(name)?;
        loop {
            match node {
                Node::Properties {
                    tag: node_tag,
                    anchor,
                } => {
                    if let Some(anchor) = anchor.as_deref().and_then(Node::name) {
                        self.anchors.mark_pending(anchor);
                    }
                    if let Some(node_tag) = node_tag.as_deref().and_then(Node::name) {
                        tag = Some(node_tag);
                    }
                    node = self.next_node(name)?;
                    continue;
                }
                Node::Alias { text } => {
                    node = self.dereference(text)?;
                    continue;
                }
                _ => {}
            }
            if self.anchors.has_pending() {
                if let Some(holder) = self.route.last() {
                    self.anchors.bind(holder.node);
                }
            }

            let scope = Scope {
                schema: &self.schema,
                tag,
            };
            match expecter.process(node, &scope) {
                Verdict::Match(value) => {
                    debug_print!("{name} matched {}", node.node_type());
                    self.route.truncate(base);
                    return Ok(value);
                }
                Verdict::Enter(value) => {
                    let origin = if self.route.len() > base {
                        self.route[self.route.len() - 1].node
                    } else {
                        node
                    };
                    self.route.truncate(base);
                    if let Some(point) = RoutePoint::collection(origin, node, self.next_id) {
                        debug_print!("{name} entered {} of {} items", node.node_type(), point.size);
                        self.next_id += 1;
                        self.route.push(point);
                    }
                    return Ok(value);
                }
                Verdict::Continue => match RoutePoint::transient(node) {
                    Some(point) => {
                        self.route.push(point);
                        node = self.next_node(name)?;
                    }
                    None => return Err(self.deny(name, node)),
                },
                Verdict::Deny => return Err(self.deny(name, node)),
            }
        }
    }

    fn deny(&self, name: &'static str, node: &Node) -> ReadError {
        debug_print!("{name} denied {}", node.node_type());
        ReadError::Deny(DenyError {
            expecter_name: name,
            node_type: node.node_type(),
        })
    }

    /// Pop the exhausted collections on top of the route.
    ///
    /// Returns the length of the route, which is restored once the expectation is met.
    fn unwind(&mut self, name: &'static str) -> Result<usize, ReadError> {
        loop {
            match self.route.last() {
                Some(point) if point.remaining > 0 => return Ok(self.route.len()),
                Some(_) if self.route.len() > 1 => {
                    self.route.pop();
                }
                _ => return Err(ReadError::Exhausted { expecter: name }),
            }
        }
    }

    fn next_node(&mut self, name: &'static str) -> Result<&'a Node, ReadError> {
        self.route
            .last_mut()
            .and_then(RoutePoint::next_node)
            .ok_or(ReadError::Exhausted { expecter: name })
    }

    /// Return the node `alias` refers to.
    fn dereference(&self, alias: &str) -> Result<&'a Node, ReadError> {
        let Some(target) = self.anchors.resolve(alias) else {
            return Err(AliasDereferenceError::Undefined(alias.to_owned()).into());
        };
        if self
            .route
            .iter()
            .any(|point| std::ptr::eq(point.node, target))
        {
            return Err(AliasDereferenceError::Recursive(alias.to_owned()).into());
        }
        debug_print!("alias *{alias} dereferenced");
        Ok(target)
    }

    /// Return the state of the collection the last expectation entered.
    fn entered(&self) -> CollectionState {
        self.route
            .last()
            .map_or(CollectionState { id: 0, size: 0 }, |point| CollectionState {
                id: point.id,
                size: point.size,
            })
    }

    /// Return whether the collection of `state` has items left to read.
    ///
    /// Unfinished reads of collections nested in that one are abandoned. Once this returns
    /// `false`, the collection is done with and the next read resumes in the enclosing one.
    pub fn has_unprocessed_items(&mut self, state: &CollectionState) -> bool {
        if state.id == 0 {
            return false;
        }
        let Some(index) = self.route.iter().rposition(|point| point.id == state.id) else {
            return false;
        };
        self.route.truncate(index + 1);
        if self.route[index].remaining > 0 {
            true
        } else {
            self.route.pop();
            false
        }
    }

    /// Read a signed integer.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not an integer.
    pub fn expect_integer(&mut self) -> Result<i64, ReadError> {
        self.expect_with(IntegerExpecter)
    }

    /// Read an unsigned integer.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not an unsigned integer.
    pub fn expect_unsigned(&mut self) -> Result<u64, ReadError> {
        self.expect_with(UnsignedExpecter)
    }

    /// Read a boolean.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a boolean.
    pub fn expect_boolean(&mut self) -> Result<bool, ReadError> {
        self.expect_with(BooleanExpecter)
    }

    /// Read a floating point number. Integers are accepted.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a number.
    pub fn expect_float(&mut self) -> Result<f64, ReadError> {
        self.expect_with(FloatExpecter)
    }

    /// Read the text of a scalar, whatever its type.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a scalar.
    pub fn expect_string(&mut self) -> Result<String, ReadError> {
        self.expect_with(StringExpecter)
    }

    /// Read a timestamp.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a timestamp.
    pub fn expect_timestamp(&mut self) -> Result<Timestamp, ReadError> {
        self.expect_with(TimestampExpecter)
    }

    /// Enter a sequence.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a sequence.
    pub fn expect_sequence(&mut self) -> Result<CollectionState, ReadError> {
        self.expect_with(SequenceExpecter)?;
        Ok(self.entered())
    }

    /// Enter a mapping. Its keys and values are then read alternately.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a mapping.
    pub fn expect_mapping(&mut self) -> Result<CollectionState, ReadError> {
        self.expect_with(MappingExpecter)?;
        Ok(self.entered())
    }

    /// Enter the stream of documents. This must be the first read of the session.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the reader is not at the root of a parsed stream.
    pub fn expect_stream(&mut self) -> Result<CollectionState, ReadError> {
        self.expect_with(StreamExpecter)?;
        Ok(self.entered())
    }

    /// Read a signed integer, or `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor an integer.
    pub fn expect_nullable_integer(&mut self) -> Result<Option<i64>, ReadError> {
        self.expect_with(Nullable(IntegerExpecter))
    }

    /// Read an unsigned integer, or `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor an unsigned integer.
    pub fn expect_nullable_unsigned(&mut self) -> Result<Option<u64>, ReadError> {
        self.expect_with(Nullable(UnsignedExpecter))
    }

    /// Read a boolean, or `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor a boolean.
    pub fn expect_nullable_boolean(&mut self) -> Result<Option<bool>, ReadError> {
        self.expect_with(Nullable(BooleanExpecter))
    }

    /// Read a number, or `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor a number.
    pub fn expect_nullable_float(&mut self) -> Result<Option<f64>, ReadError> {
        self.expect_with(Nullable(FloatExpecter))
    }

    /// Read a string, or `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is not a scalar.
    pub fn expect_nullable_string(&mut self) -> Result<Option<String>, ReadError> {
        self.expect_with(Nullable(StringExpecter))
    }

    /// Read a timestamp, or `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor a timestamp.
    pub fn expect_nullable_timestamp(&mut self) -> Result<Option<Timestamp>, ReadError> {
        self.expect_with(Nullable(TimestampExpecter))
    }

    /// Enter a sequence, or return `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor a sequence.
    pub fn expect_nullable_sequence(&mut self) -> Result<Option<CollectionState>, ReadError> {
        Ok(self
            .expect_with(Nullable(SequenceExpecter))?
            .map(|()| self.entered()))
    }

    /// Enter a mapping, or return `None` if the next node is null.
    ///
    /// # Errors
    /// Returns a [`DenyError`] if the next node is neither null nor a mapping.
    pub fn expect_nullable_mapping(&mut self) -> Result<Option<CollectionState>, ReadError> {
        Ok(self
            .expect_with(Nullable(MappingExpecter))?
            .map(|()| self.entered()))
    }

    /// Consume the next node if it is null.
    ///
    /// # Errors
    /// Only fails on a corrupt document or if there is no node left.
    pub fn skip_null(&mut self) -> Result<bool, ReadError> {
        match self.expect_with(NullExpecter) {
            Ok(()) => Ok(true),
            Err(error) if error.is_deny() => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Read the next node, whatever it is, as a [`Value`].
    ///
    /// # Errors
    /// Returns an error if an alias cannot be dereferenced, if a tagged scalar does not match
    /// its tag or if values nest deeper than [`MAX_NESTING`] levels.
    pub fn any(&mut self) -> Result<Value, ReadError> {
        // Aliases may nest values deeper than the parser allows.
        if self.depth >= MAX_NESTING {
            return Err(ReadError::NestingLimit);
        }
        self.depth += 1;
        let value = self.any_value();
        self.depth -= 1;
        value
    }

    fn any_value(&mut self) -> Result<Value, ReadError> {
        match self.expect_with(AnyExpecter)? {
            AnyNode::Scalar(value) => Ok(value),
            AnyNode::Sequence => {
                let state = self.entered();
                let mut sequence = Vec::with_capacity(state.size());
                while self.has_unprocessed_items(&state) {
                    sequence.push(self.any()?);
                }
                Ok(Value::Sequence(sequence))
            }
            AnyNode::Mapping => {
                let state = self.entered();
                let mut mapping = Mapping::with_capacity(state.size());
                while self.has_unprocessed_items(&state) {
                    let key = self.any()?;
                    let value = self.any()?;
                    mapping.insert(key, value);
                }
                Ok(Value::Mapping(mapping))
            }
        }
    }

    /// Consume the next node, whatever it is.
    ///
    /// Anchors defined in the node are registered.
    ///
    /// # Errors
    /// Returns an error if an alias cannot be dereferenced or if there is no node left.
    pub fn skip(&mut self) -> Result<(), ReadError> {
        self.any().map(drop)
    }

    /// Read the next node and return it written as YAML.
    ///
    /// Aliases in the node are replaced with the nodes they refer to.
    ///
    /// # Errors
    /// Returns an error if the node cannot be read or written.
    pub fn raw(&mut self) -> Result<Vec<u8>, ReadError> {
        let value = self.any()?;
        crate::to_string(&value)
            .map(String::into_bytes)
            .map_err(ReadError::custom)
    }

    /// Save the position of the reader.
    ///
    /// Checkpoints nest. Each must be closed by a [`rollback`](Self::rollback) or a
    /// [`commit`](Self::commit).
    pub fn set_checkpoint(&mut self) {
        self.checkpoints.push(Checkpoint {
            route: self.route.clone(),
            anchors: self.anchors.memento(),
        });
    }

    /// Go back to the last checkpoint, and close it.
    pub fn rollback(&mut self) {
        if let Some(checkpoint) = self.checkpoints.pop() {
            self.route = checkpoint.route;
            self.anchors.set_memento(checkpoint.anchors);
        }
    }

    /// Close the last checkpoint, keeping the current position.
    pub fn commit(&mut self) {
        self.checkpoints.pop();
    }

    /// Record an error to be reported by [`finish`](Self::finish), and keep reading.
    pub fn error(&mut self, error: ReadError) {
        self.errors.push(error);
    }

    /// End the session.
    ///
    /// # Errors
    /// Returns the errors recorded with [`error`](Self::error), joined.
    pub fn finish(self) -> Result<(), ReadError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ReadError::joined(self.errors))
        }
    }
}

#[cfg(test)]
mod test {
    use yamlet_parser::{parse_str, NodeType};

    use super::*;

    fn deny(expecter_name: &'static str, node_type: NodeType) -> ReadError {
        ReadError::Deny(DenyError {
            expecter_name,
            node_type,
        })
    }

    #[test]
    fn denial_restores_the_route() {
        let root = parse_str("[true, 2]").unwrap();
        let mut reader = Reader::new(&root);
        assert_eq!(reader.expect_mapping(), Err(deny("mapping", NodeType::Sequence)));
        let state = reader.expect_sequence().unwrap();
        assert!(reader.has_unprocessed_items(&state));
        assert_eq!(reader.expect_integer(), Err(deny("integer", NodeType::Text)));
        assert_eq!(reader.expect_boolean(), Ok(true));
        assert_eq!(reader.expect_integer(), Ok(2));
        assert!(!reader.has_unprocessed_items(&state));
        assert_eq!(
            reader.expect_integer(),
            Err(ReadError::Exhausted { expecter: "integer" })
        );
    }

    #[test]
    fn anchors_are_bound_to_wrappers() {
        let root = parse_str("- &a !!str 12\n- *a").unwrap();
        let mut reader = Reader::new(&root);
        let state = reader.expect_sequence().unwrap();
        assert!(reader.has_unprocessed_items(&state));
        assert_eq!(reader.any(), Ok(Value::String("12".into())));
        // The alias carries the tag of the anchored node.
        assert_eq!(reader.any(), Ok(Value::String("12".into())));
    }

    #[test]
    fn recursive_alias() {
        let root = parse_str("&a [*a]").unwrap();
        assert_eq!(
            Reader::new(&root).any(),
            Err(AliasDereferenceError::Recursive("a".into()).into())
        );
    }

    #[test]
    fn checkpoints() {
        let root = parse_str("[1, 2, 3]").unwrap();
        let mut reader = Reader::new(&root);
        let state = reader.expect_sequence().unwrap();
        reader.set_checkpoint();
        assert_eq!(reader.expect_integer(), Ok(1));
        assert_eq!(reader.expect_integer(), Ok(2));
        reader.rollback();
        assert_eq!(reader.expect_integer(), Ok(1));
        reader.set_checkpoint();
        assert_eq!(reader.expect_integer(), Ok(2));
        reader.commit();
        assert_eq!(reader.expect_integer(), Ok(3));
        assert!(!reader.has_unprocessed_items(&state));
    }

    #[test]
    fn streams() {
        let root = parse_str("a\n---\nb").unwrap();
        let mut reader = Reader::new(&root);
        assert_eq!(reader.expect_string(), Err(deny("string", NodeType::Stream)));
        let state = reader.expect_stream().unwrap();
        assert_eq!(state.size(), 2);
        let mut documents = vec![];
        while reader.has_unprocessed_items(&state) {
            documents.push(reader.expect_string().unwrap());
        }
        assert_eq!(documents, ["a", "b"]);

        let root = parse_str("").unwrap();
        assert_eq!(Reader::new(&root).expect_nullable_integer(), Ok(None));
        assert_eq!(Reader::new(&root).any(), Ok(Value::Null));
    }

    #[test]
    fn finish_joins_recorded_errors() {
        let root = parse_str("~").unwrap();
        let mut reader = Reader::new(&root);
        assert_eq!(reader.skip_null(), Ok(true));
        reader.error(ReadError::custom("first"));
        reader.error(ReadError::custom("second"));
        assert_eq!(reader.finish().unwrap_err().to_string(), "first\nsecond");
    }
}
