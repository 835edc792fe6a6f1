//! Conversion of trees to Rust values.
//!
//! [`Decode`] is implemented for primitive types, strings, standard collections, tuples and
//! [`Value`]. Records implement it through [`yaml_record!`](crate::yaml_record), and types with
//! their own YAML form through [`Unmarshaler`] and
//! [`yaml_via_marshaler!`](crate::yaml_via_marshaler).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use hashlink::LinkedHashMap;
use yamlet_parser::Node;

use crate::reader::{CollectionState, ReadError, Reader};
use crate::schema::Schema;
use crate::value::{Timestamp, Value};

/// The read operations decoders are written against.
///
/// [`Reader`] is the implementation over a parsed tree. See its documentation for the
/// semantics of each method.
#[allow(missing_docs, clippy::missing_errors_doc)]
pub trait Decoder {
    fn expect_integer(&mut self) -> Result<i64, ReadError>;
    fn expect_unsigned(&mut self) -> Result<u64, ReadError>;
    fn expect_boolean(&mut self) -> Result<bool, ReadError>;
    fn expect_float(&mut self) -> Result<f64, ReadError>;
    fn expect_string(&mut self) -> Result<String, ReadError>;
    fn expect_timestamp(&mut self) -> Result<Timestamp, ReadError>;
    fn expect_sequence(&mut self) -> Result<CollectionState, ReadError>;
    fn expect_mapping(&mut self) -> Result<CollectionState, ReadError>;
    fn expect_nullable_sequence(&mut self) -> Result<Option<CollectionState>, ReadError>;
    fn expect_nullable_mapping(&mut self) -> Result<Option<CollectionState>, ReadError>;
    fn has_unprocessed_items(&mut self, state: &CollectionState) -> bool;
    /// Consume the next node if it is null, and return whether it was.
    fn skip_null(&mut self) -> Result<bool, ReadError>;
    fn any(&mut self) -> Result<Value, ReadError>;
    fn skip(&mut self) -> Result<(), ReadError>;
    fn raw(&mut self) -> Result<Vec<u8>, ReadError>;
    fn error(&mut self, error: ReadError);
    fn set_checkpoint(&mut self);
    fn rollback(&mut self);
    fn commit(&mut self);

    fn expect_nullable_integer(&mut self) -> Result<Option<i64>, ReadError> {
        nullable(self, Self::expect_integer)
    }

    fn expect_nullable_unsigned(&mut self) -> Result<Option<u64>, ReadError> {
        nullable(self, Self::expect_unsigned)
    }

    fn expect_nullable_boolean(&mut self) -> Result<Option<bool>, ReadError> {
        nullable(self, Self::expect_boolean)
    }

    fn expect_nullable_float(&mut self) -> Result<Option<f64>, ReadError> {
        nullable(self, Self::expect_float)
    }

    fn expect_nullable_string(&mut self) -> Result<Option<String>, ReadError> {
        nullable(self, Self::expect_string)
    }

    fn expect_nullable_timestamp(&mut self) -> Result<Option<Timestamp>, ReadError> {
        nullable(self, Self::expect_timestamp)
    }
}

fn nullable<D: Decoder + ?Sized, T>(
    decoder: &mut D,
    expect: impl FnOnce(&mut D) -> Result<T, ReadError>,
) -> Result<Option<T>, ReadError> {
    if decoder.skip_null()? {
        Ok(None)
    } else {
        expect(decoder).map(Some)
    }
}

impl<'a, S: Schema> Decoder for Reader<'a, S> {
    fn expect_integer(&mut self) -> Result<i64, ReadError> {
        Reader::expect_integer(self)
    }

    fn expect_unsigned(&mut self) -> Result<u64, ReadError> {
        Reader::expect_unsigned(self)
    }

    fn expect_boolean(&mut self) -> Result<bool, ReadError> {
        Reader::expect_boolean(self)
    }

    fn expect_float(&mut self) -> Result<f64, ReadError> {
        Reader::expect_float(self)
    }

    fn expect_string(&mut self) -> Result<String, ReadError> {
        Reader::expect_string(self)
    }

    fn expect_timestamp(&mut self) -> Result<Timestamp, ReadError> {
        Reader::expect_timestamp(self)
    }

    fn expect_sequence(&mut self) -> Result<CollectionState, ReadError> {
        Reader::expect_sequence(self)
    }

    fn expect_mapping(&mut self) -> Result<CollectionState, ReadError> {
        Reader::expect_mapping(self)
    }

    fn expect_nullable_sequence(&mut self) -> Result<Option<CollectionState>, ReadError> {
        Reader::expect_nullable_sequence(self)
    }

    fn expect_nullable_mapping(&mut self) -> Result<Option<CollectionState>, ReadError> {
        Reader::expect_nullable_mapping(self)
    }

    fn has_unprocessed_items(&mut self, state: &CollectionState) -> bool {
        Reader::has_unprocessed_items(self, state)
    }

    fn skip_null(&mut self) -> Result<bool, ReadError> {
        Reader::skip_null(self)
    }

    fn any(&mut self) -> Result<Value, ReadError> {
        Reader::any(self)
    }

    fn skip(&mut self) -> Result<(), ReadError> {
        Reader::skip(self)
    }

    fn raw(&mut self) -> Result<Vec<u8>, ReadError> {
        Reader::raw(self)
    }

    fn error(&mut self, error: ReadError) {
        Reader::error(self, error);
    }

    fn set_checkpoint(&mut self) {
        Reader::set_checkpoint(self);
    }

    fn rollback(&mut self) {
        Reader::rollback(self);
    }

    fn commit(&mut self) {
        Reader::commit(self);
    }

    fn expect_nullable_integer(&mut self) -> Result<Option<i64>, ReadError> {
        Reader::expect_nullable_integer(self)
    }

    fn expect_nullable_unsigned(&mut self) -> Result<Option<u64>, ReadError> {
        Reader::expect_nullable_unsigned(self)
    }

    fn expect_nullable_boolean(&mut self) -> Result<Option<bool>, ReadError> {
        Reader::expect_nullable_boolean(self)
    }

    fn expect_nullable_float(&mut self) -> Result<Option<f64>, ReadError> {
        Reader::expect_nullable_float(self)
    }

    fn expect_nullable_string(&mut self) -> Result<Option<String>, ReadError> {
        Reader::expect_nullable_string(self)
    }

    fn expect_nullable_timestamp(&mut self) -> Result<Option<Timestamp>, ReadError> {
        Reader::expect_nullable_timestamp(self)
    }
}

/// A type that can be read from a [`Decoder`].
pub trait Decode: Sized {
    /// Read a value.
    ///
    /// # Errors
    /// Returns an error if the next node does not hold a value of this type.
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError>;

    /// The value of a record field that is absent from its mapping, if the type has one.
    #[must_use]
    fn missing() -> Option<Self> {
        None
    }
}

/// A type that reads itself from YAML text.
pub trait Unmarshaler: Sized {
    /// Build a value from `raw`, the YAML text of one node.
    ///
    /// # Errors
    /// Returns an error if `raw` does not describe a value of this type.
    fn unmarshal_yaml(raw: &[u8]) -> Result<Self, ReadError>;
}

impl Decode for bool {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        decoder.expect_boolean()
    }
}

macro_rules! decode_integer {
    ($expect:ident, $expecter:literal, $($ty:ty),*) => {
        $(
            impl Decode for $ty {
                fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
                    let n = decoder.$expect()?;
                    <$ty>::try_from(n).map_err(|_| ReadError::OutOfRange {
                        expecter: $expecter,
                        text: n.to_string(),
                    })
                }
            }
        )*
    };
}

decode_integer!(expect_integer, "integer", i8, i16, i32, i64, isize);
decode_integer!(expect_unsigned, "unsigned", u8, u16, u32, u64, usize);

impl Decode for f64 {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        decoder.expect_float()
    }
}

impl Decode for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        decoder.expect_float().map(|f| f as f32)
    }
}

impl Decode for String {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        decoder.expect_string()
    }
}

impl Decode for char {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        let text = decoder.expect_string()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ReadError::Custom(format!(
                "expected a single character, found `{text}`"
            ))),
        }
    }
}

impl Decode for Timestamp {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        decoder.expect_timestamp()
    }
}

impl Decode for Value {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        decoder.any()
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        if decoder.skip_null()? {
            Ok(None)
        } else {
            T::decode(decoder).map(Some)
        }
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        T::decode(decoder).map(Box::new)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        let state = decoder.expect_sequence()?;
        let mut items = Vec::with_capacity(state.size());
        while decoder.has_unprocessed_items(&state) {
            items.push(T::decode(decoder)?);
        }
        Ok(items)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        Vec::decode(decoder).map(VecDeque::from)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        let items: Vec<T> = Vec::decode(decoder)?;
        items.try_into().map_err(|items: Vec<T>| ReadError::Length {
            expected: N,
            found: items.len(),
        })
    }
}

/// Read the entries of a mapping into `insert`.
fn decode_entries<D, K, V>(decoder: &mut D, mut insert: impl FnMut(K, V)) -> Result<(), ReadError>
where
    D: Decoder + ?Sized,
    K: Decode,
    V: Decode,
{
    let state = decoder.expect_mapping()?;
    while decoder.has_unprocessed_items(&state) {
        let key = K::decode(decoder)?;
        let value = V::decode(decoder)?;
        insert(key, value);
    }
    Ok(())
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        let mut map = BTreeMap::new();
        decode_entries(decoder, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        let mut map = HashMap::default();
        decode_entries(decoder, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

impl<K, V, S> Decode for LinkedHashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
        let mut map = LinkedHashMap::default();
        decode_entries(decoder, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

macro_rules! decode_tuple {
    ($len:literal: $($name:ident),+) => {
        impl<$($name: Decode),+> Decode for ($($name,)+) {
            fn decode<D: Decoder + ?Sized>(decoder: &mut D) -> Result<Self, ReadError> {
                let state = decoder.expect_sequence()?;
                if state.size() != $len {
                    return Err(ReadError::Length {
                        expected: $len,
                        found: state.size(),
                    });
                }
                let tuple = ($($name::decode(decoder)?,)+);
                decoder.has_unprocessed_items(&state);
                Ok(tuple)
            }
        }
    };
}

decode_tuple!(1: A);
decode_tuple!(2: A, B);
decode_tuple!(3: A, B, C);
decode_tuple!(4: A, B, C, E);

/// The state of a record field while its mapping is read.
#[doc(hidden)]
#[derive(Debug, PartialEq, Eq)]
pub enum FieldSlot<T> {
    /// The key was not found.
    Absent,
    /// The value could not be decoded. Its error was recorded.
    Invalid,
    /// The value was decoded.
    Present(T),
}

/// Decode the value of a record field into `slot`.
///
/// A value that cannot be decoded is skipped and its error pushed to `errors`, so that the
/// other fields are still read. Errors that leave the document unreadable are returned.
///
/// # Errors
/// Returns the error if it is not recoverable.
#[doc(hidden)]
pub fn decode_field<D, T>(
    decoder: &mut D,
    slot: &mut FieldSlot<T>,
    errors: &mut Vec<ReadError>,
) -> Result<(), ReadError>
where
    D: Decoder + ?Sized,
    T: Decode,
{
    decoder.set_checkpoint();
    match T::decode(decoder) {
        Ok(value) => {
            decoder.commit();
            *slot = FieldSlot::Present(value);
            Ok(())
        }
        Err(error) if error.is_recoverable() => {
            decoder.rollback();
            decoder.skip()?;
            errors.push(error);
            *slot = FieldSlot::Invalid;
            Ok(())
        }
        Err(error) => {
            decoder.rollback();
            Err(error)
        }
    }
}

/// Fill the slot of a field that was absent from its mapping.
#[doc(hidden)]
pub fn fill_missing<T: Decode>(
    slot: &mut FieldSlot<T>,
    name: &str,
    errors: &mut Vec<ReadError>,
) {
    if matches!(slot, FieldSlot::Absent) {
        match T::missing() {
            Some(value) => *slot = FieldSlot::Present(value),
            None => errors.push(ReadError::Custom(format!("missing field `{name}`"))),
        }
    }
}

/// Fill the slot of an `omit_empty` field that was absent from its mapping.
#[doc(hidden)]
pub fn fill_default<T: Default>(slot: &mut FieldSlot<T>) {
    if matches!(slot, FieldSlot::Absent) {
        *slot = FieldSlot::Present(T::default());
    }
}

/// Decode a `T` from a parsed tree.
///
/// Errors recorded with [`Decoder::error`] are joined to the result.
///
/// # Errors
/// Returns an error if the tree does not describe a `T`.
pub fn from_node<T: Decode>(root: &Node) -> Result<T, ReadError> {
    let mut reader = Reader::new(root);
    let value = T::decode(&mut reader);
    match (value, reader.finish()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) | (Err(error), Ok(())) => Err(error),
        (Err(error), Err(recorded)) => Err(ReadError::joined(vec![recorded, error])),
    }
}

#[cfg(test)]
mod test {
    use yamlet_parser::{parse_str, NodeType};

    use super::*;
    use crate::reader::DenyError;

    fn decode<T: Decode>(input: &str) -> Result<T, ReadError> {
        from_node(&parse_str(input).unwrap())
    }

    #[test]
    fn narrow_integers() {
        assert_eq!(decode::<u8>("255"), Ok(255));
        assert_eq!(
            decode::<u8>("256"),
            Err(ReadError::OutOfRange {
                expecter: "unsigned",
                text: "256".into()
            })
        );
        assert_eq!(decode::<i8>("-128"), Ok(-128));
        assert!(decode::<u32>("-1").unwrap_err().is_deny());
    }

    #[test]
    fn collections() {
        assert_eq!(decode::<Vec<i32>>("[1, 2, 3]"), Ok(vec![1, 2, 3]));
        assert_eq!(decode::<[u8; 2]>("[1, 2]"), Ok([1, 2]));
        assert_eq!(
            decode::<[u8; 2]>("[1, 2, 3]"),
            Err(ReadError::Length {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            decode::<(String, bool)>("- a\n- yes\n"),
            Err(ReadError::Deny(DenyError {
                expecter_name: "boolean",
                node_type: NodeType::Text
            }))
        );
        assert_eq!(decode::<(String, bool)>("[a, true]"), Ok(("a".into(), true)));

        let map: BTreeMap<String, Option<i64>> = decode("{b: 2, a: ~}").unwrap();
        assert_eq!(
            map.into_iter().collect::<Vec<_>>(),
            [("a".to_owned(), None), ("b".to_owned(), Some(2))]
        );

        let map: LinkedHashMap<String, Vec<char>> = decode("z: [x]\ny: []").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["z", "y"]);
    }

    #[test]
    fn nested_tuples_keep_position() {
        let pairs: Vec<(u8, (char, char))> = decode("[[1, [a, b]], [2, [c, d]]]").unwrap();
        assert_eq!(pairs, [(1, ('a', 'b')), (2, ('c', 'd'))]);
    }

    #[test]
    fn recorded_errors_fail_decoding() {
        let root = parse_str("1").unwrap();
        let mut reader = Reader::new(&root);
        assert_eq!(i64::decode(&mut reader), Ok(1));
        Decoder::error(&mut reader, ReadError::custom("late"));
        assert_eq!(reader.finish(), Err(ReadError::custom("late")));
    }

    #[test]
    fn field_errors_are_skipped() {
        let root = parse_str("[x, 2]").unwrap();
        let mut reader = Reader::new(&root);
        let state = reader.expect_sequence().unwrap();
        let mut errors = vec![];
        let mut first = FieldSlot::<i64>::Absent;
        let mut second = FieldSlot::<i64>::Absent;
        assert!(reader.has_unprocessed_items(&state));
        decode_field(&mut reader, &mut first, &mut errors).unwrap();
        decode_field(&mut reader, &mut second, &mut errors).unwrap();
        assert_eq!((first, second), (FieldSlot::Invalid, FieldSlot::Present(2)));
        assert_eq!(errors.len(), 1);

        let mut absent = FieldSlot::<Option<u8>>::Absent;
        fill_missing(&mut absent, "absent", &mut errors);
        assert_eq!(absent, FieldSlot::Present(None));
        let mut invalid = FieldSlot::<u8>::Invalid;
        fill_missing(&mut invalid, "invalid", &mut errors);
        assert_eq!(errors.len(), 1);
        let mut required = FieldSlot::<u8>::Absent;
        fill_missing(&mut required, "required", &mut errors);
        assert_eq!(errors[1], ReadError::custom("missing field `required`"));
    }
}
