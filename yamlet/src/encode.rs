//! Conversion of Rust values to trees.

use std::collections::{BTreeMap, HashMap, VecDeque};

use hashlink::LinkedHashMap;

use crate::value::{Timestamp, Value};
use crate::writer::{EmitError, EmitResult};

/// The write operations encoders are written against.
///
/// Calls must be coherent: every `start_*` is closed by the matching `end_*`, and mapping keys
/// alternate with values. [`TreeBuilder`](crate::TreeBuilder) is the implementation building a
/// tree for the [`Writer`](crate::Writer).
#[allow(missing_docs, clippy::missing_errors_doc)]
pub trait Inserter {
    fn insert_integer(&mut self, value: i64) -> EmitResult;
    fn insert_unsigned(&mut self, value: u64) -> EmitResult;
    fn insert_boolean(&mut self, value: bool) -> EmitResult;
    fn insert_float(&mut self, value: f64) -> EmitResult;
    fn insert_string(&mut self, value: &str) -> EmitResult;
    fn insert_timestamp(&mut self, value: &Timestamp) -> EmitResult;
    fn insert_null(&mut self) -> EmitResult;
    fn start_sequence(&mut self) -> EmitResult;
    fn end_sequence(&mut self) -> EmitResult;
    fn start_mapping(&mut self) -> EmitResult;
    fn end_mapping(&mut self) -> EmitResult;
    /// Insert a node given as YAML text.
    fn insert_raw(&mut self, raw: &[u8]) -> EmitResult;

    fn insert_nullable_integer(&mut self, value: Option<i64>) -> EmitResult {
        match value {
            Some(v) => self.insert_integer(v),
            None => self.insert_null(),
        }
    }

    fn insert_nullable_unsigned(&mut self, value: Option<u64>) -> EmitResult {
        match value {
            Some(v) => self.insert_unsigned(v),
            None => self.insert_null(),
        }
    }

    fn insert_nullable_boolean(&mut self, value: Option<bool>) -> EmitResult {
        match value {
            Some(v) => self.insert_boolean(v),
            None => self.insert_null(),
        }
    }

    fn insert_nullable_float(&mut self, value: Option<f64>) -> EmitResult {
        match value {
            Some(v) => self.insert_float(v),
            None => self.insert_null(),
        }
    }

    fn insert_nullable_string(&mut self, value: Option<&str>) -> EmitResult {
        match value {
            Some(v) => self.insert_string(v),
            None => self.insert_null(),
        }
    }

    fn insert_nullable_timestamp(&mut self, value: Option<&Timestamp>) -> EmitResult {
        match value {
            Some(v) => self.insert_timestamp(v),
            None => self.insert_null(),
        }
    }
}

/// A type that can be written to an [`Inserter`].
pub trait Encode {
    /// Write the value.
    ///
    /// # Errors
    /// Returns an error if the inserter fails.
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult;

    /// Return whether an `omit_empty` record field holding this value is left out.
    fn is_empty_value(&self) -> bool {
        false
    }
}

/// A type that writes itself as YAML text.
pub trait Marshaler {
    /// Return the YAML text of the value, a single node.
    ///
    /// # Errors
    /// Returns an error if the value cannot be represented.
    fn marshal_yaml(&self) -> Result<Vec<u8>, EmitError>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        (**self).encode(inserter)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl Encode for bool {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_boolean(*self)
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }
}

macro_rules! encode_integer {
    ($insert:ident, $wide:ty, $($ty:ty),*) => {
        $(
            impl Encode for $ty {
                #[allow(
                    clippy::cast_lossless,
                    clippy::cast_possible_wrap,
                    clippy::unnecessary_cast
                )]
                fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
                    inserter.$insert(*self as $wide)
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

encode_integer!(insert_integer, i64, i8, i16, i32, i64, isize);
encode_integer!(insert_unsigned, u64, u8, u16, u32, u64, usize);

impl Encode for f64 {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_float(*self)
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl Encode for f32 {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_float(f64::from(*self))
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl Encode for str {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_string(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Encode for String {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_string(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Encode for char {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_string(self.encode_utf8(&mut [0; 4]))
    }
}

impl Encode for Timestamp {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        inserter.insert_timestamp(self)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        match self {
            Some(value) => value.encode(inserter),
            None => inserter.insert_null(),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        (**self).encode(inserter)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

/// Write `items` as a sequence.
fn encode_sequence<'i, I, T>(
    inserter: &mut I,
    items: impl IntoIterator<Item = &'i T>,
) -> EmitResult
where
    I: Inserter + ?Sized,
    T: Encode + 'i,
{
    inserter.start_sequence()?;
    for item in items {
        item.encode(inserter)?;
    }
    inserter.end_sequence()
}

/// Write `entries` as a mapping.
fn encode_mapping<'i, I, K, V>(
    inserter: &mut I,
    entries: impl IntoIterator<Item = (&'i K, &'i V)>,
) -> EmitResult
where
    I: Inserter + ?Sized,
    K: Encode + 'i,
    V: Encode + 'i,
{
    inserter.start_mapping()?;
    for (key, value) in entries {
        key.encode(inserter)?;
        value.encode(inserter)?;
    }
    inserter.end_mapping()
}

impl<T: Encode> Encode for [T] {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_sequence(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_sequence(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_sequence(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_sequence(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        N == 0
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_mapping(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_mapping(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K: Encode, V: Encode, S> Encode for LinkedHashMap<K, V, S> {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        encode_mapping(inserter, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! encode_tuple {
    ($($name:ident $index:tt),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
                inserter.start_sequence()?;
                $(self.$index.encode(inserter)?;)+
                inserter.end_sequence()
            }
        }
    };
}

encode_tuple!(A 0);
encode_tuple!(A 0, B 1);
encode_tuple!(A 0, B 1, C 2);
encode_tuple!(A 0, B 1, C 2, D 3);

impl Encode for Value {
    fn encode<I: Inserter + ?Sized>(&self, inserter: &mut I) -> EmitResult {
        match self {
            Value::Null => inserter.insert_null(),
            Value::Boolean(b) => inserter.insert_boolean(*b),
            Value::Integer(i) => inserter.insert_integer(*i),
            Value::FloatingPoint(f) => inserter.insert_float(f.into_inner()),
            Value::String(s) => inserter.insert_string(s),
            Value::Timestamp(t) => inserter.insert_timestamp(t),
            Value::Sequence(items) => encode_sequence(inserter, items),
            Value::Mapping(entries) => encode_mapping(inserter, entries),
        }
    }

    fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(b) => !b,
            Value::Integer(i) => *i == 0,
            Value::FloatingPoint(f) => f.into_inner() == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Timestamp(_) => false,
            Value::Sequence(items) => items.is_empty(),
            Value::Mapping(entries) => entries.is_empty(),
        }
    }
}
