//! Declarative implementations of [`Encode`](crate::Encode) and [`Decode`](crate::Decode).

/// Implement [`Encode`](crate::Encode) and [`Decode`](crate::Decode) for a struct, as a mapping
/// with one entry per field.
///
/// Each field is given the name of its mapping key. Fields marked `(omit_empty)` are not written
/// when [`Encode::is_empty_value`](crate::Encode::is_empty_value) holds, and take their
/// `Default` value when absent. Other absent fields are an error unless their type has a
/// [`missing`](crate::Decode::missing) value, as `Option` does. Unknown keys are skipped.
///
/// Decoding reads every field before failing: the error joins one error per bad or missing
/// field.
///
/// ```
/// use yamlet::yaml_record;
///
/// #[derive(Debug, PartialEq)]
/// struct Server {
///     host: String,
///     port: u16,
///     tags: Vec<String>,
///     backup: Option<String>,
/// }
///
/// yaml_record!(Server {
///     host => "host",
///     port => "port",
///     tags => "tags" (omit_empty),
///     backup => "backup",
/// });
///
/// let server: Server = yamlet::from_str("host: example.org\nport: 8080\nextra: 1").unwrap();
/// assert_eq!(
///     server,
///     Server { host: "example.org".into(), port: 8080, tags: vec![], backup: None }
/// );
/// assert_eq!(
///     yamlet::to_string(&server).unwrap(),
///     "---\nhost: example.org\nport: 8080\nbackup: ~\n...\n"
/// );
///
/// let error = yamlet::from_str::<Server>("host: [a]\nport: -1").unwrap_err();
/// assert_eq!(
///     error.to_string(),
///     "string expecter denied sequence node\nunsigned expecter denied text node"
/// );
/// ```
#[macro_export]
macro_rules! yaml_record {
    ($ty:ident { $($field:ident => $name:literal $(($omit:ident))?),* $(,)? }) => {
        impl $crate::Encode for $ty {
            fn encode<I: $crate::Inserter + ?Sized>(&self, inserter: &mut I) -> $crate::EmitResult {
                inserter.start_mapping()?;
                $(
                    if !$crate::__yaml_record_omit!(self.$field $(, $omit)?) {
                        inserter.insert_string($name)?;
                        $crate::Encode::encode(&self.$field, inserter)?;
                    }
                )*
                inserter.end_mapping()
            }
        }

        impl $crate::Decode for $ty {
            fn decode<D: $crate::Decoder + ?Sized>(
                decoder: &mut D,
            ) -> ::std::result::Result<Self, $crate::ReadError> {
                let state = decoder.expect_mapping()?;
                let mut errors = ::std::vec::Vec::new();
                $(let mut $field = $crate::__private::FieldSlot::Absent;)*
                while decoder.has_unprocessed_items(&state) {
                    let key = decoder.expect_string()?;
                    match key.as_str() {
                        $($name => $crate::__private::decode_field(decoder, &mut $field, &mut errors)?,)*
                        _ => decoder.skip()?,
                    }
                }
                $($crate::__yaml_record_missing!($field, $name, errors $(, $omit)?);)*
                match ($($field,)*) {
                    ($($crate::__private::FieldSlot::Present($field),)*) if errors.is_empty() => {
                        ::std::result::Result::Ok(Self { $($field),* })
                    }
                    _ => ::std::result::Result::Err($crate::ReadError::joined(errors)),
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __yaml_record_omit {
    ($value:expr) => {
        false
    };
    ($value:expr, omit_empty) => {
        $crate::Encode::is_empty_value(&$value)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __yaml_record_missing {
    ($slot:ident, $name:literal, $errors:ident) => {
        $crate::__private::fill_missing(&mut $slot, $name, &mut $errors)
    };
    ($slot:ident, $name:literal, $errors:ident, omit_empty) => {
        $crate::__private::fill_default(&mut $slot)
    };
}

/// Implement [`Encode`](crate::Encode) and [`Decode`](crate::Decode) for a type through its
/// [`Marshaler`](crate::Marshaler) and [`Unmarshaler`](crate::Unmarshaler) implementations.
///
/// The value is written as the node its YAML text describes, and read back from the YAML text
/// of the next node.
///
/// ```
/// use yamlet::{yaml_via_marshaler, EmitError, Marshaler, ReadError, Unmarshaler};
///
/// #[derive(Debug, PartialEq)]
/// struct Point(i64, i64);
///
/// impl Marshaler for Point {
///     fn marshal_yaml(&self) -> Result<Vec<u8>, EmitError> {
///         Ok(format!("{}x{}", self.0, self.1).into_bytes())
///     }
/// }
///
/// impl Unmarshaler for Point {
///     fn unmarshal_yaml(raw: &[u8]) -> Result<Self, ReadError> {
///         let text: String = yamlet::from_slice(raw)?;
///         let (x, y) = text.split_once('x').ok_or_else(|| ReadError::custom("not a point"))?;
///         match (x.parse(), y.parse()) {
///             (Ok(x), Ok(y)) => Ok(Point(x, y)),
///             _ => Err(ReadError::custom("not a point")),
///         }
///     }
/// }
///
/// yaml_via_marshaler!(Point);
///
/// let points: Vec<Point> = yamlet::from_str("[1x2, 3x4]").unwrap();
/// assert_eq!(points, [Point(1, 2), Point(3, 4)]);
/// assert_eq!(yamlet::to_string(&points[0]).unwrap(), "--- 1x2\n...\n");
/// ```
#[macro_export]
macro_rules! yaml_via_marshaler {
    ($ty:ty) => {
        impl $crate::Encode for $ty {
            fn encode<I: $crate::Inserter + ?Sized>(&self, inserter: &mut I) -> $crate::EmitResult {
                let raw = $crate::Marshaler::marshal_yaml(self)?;
                inserter.insert_raw(&raw)
            }
        }

        impl $crate::Decode for $ty {
            fn decode<D: $crate::Decoder + ?Sized>(
                decoder: &mut D,
            ) -> ::std::result::Result<Self, $crate::ReadError> {
                let raw = decoder.raw()?;
                <$ty as $crate::Unmarshaler>::unmarshal_yaml(&raw)
            }
        }
    };
}
