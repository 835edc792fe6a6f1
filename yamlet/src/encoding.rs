//! Decoding of YAML from bytes. Available only with the `encoding` feature.

use std::{borrow::Cow, io, ops::ControlFlow};

use encoding_rs::{Decoder as TextDecoder, DecoderResult, Encoding};

use crate::decode::{from_node, Decode};
use crate::reader::ReadError;

/// The signature of the function to call when using [`DecodingTrap::Call`].
///
/// It is given the length of the malformed sequence, the number of bytes the decoder read past
/// it, the input starting at the malformation and the output so far. Returning
/// [`ControlFlow::Break`] aborts decoding, with the given message if it is not empty.
pub type DecodingTrapFn = fn(
    malformation_length: u8,
    bytes_read_after_malformation: u8,
    input_at_malformation: &[u8],
    output: &mut String,
) -> ControlFlow<Cow<'static, str>>;

/// What [`ByteDecoder`] does with byte sequences that are invalid in the input encoding.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum DecodingTrap {
    /// Remove them from the output.
    Ignore,
    /// Fail.
    Strict,
    /// Replace them with the Unicode REPLACEMENT CHARACTER.
    Replace,
    /// Call the given function.
    Call(DecodingTrapFn),
}

/// Reads a value from a byte source in UTF-8, UTF-16LE or UTF-16BE.
///
/// The encoding is told by the byte order mark, or by the pattern of nul bytes around the first
/// character, which YAML requires to be ASCII.
///
/// ```
/// use yamlet::{ByteDecoder, DecodingTrap, Value};
///
/// let bytes = b"a\xa9: 1\nb: [1, 2]\n";
/// let value: Value = ByteDecoder::read(&bytes[..])
///     .encoding_trap(DecodingTrap::Ignore)
///     .decode()
///     .unwrap();
/// assert_eq!(value["a"], Value::Integer(1));
/// assert!(ByteDecoder::read(&bytes[..]).decode::<Value>().is_err());
/// ```
pub struct ByteDecoder<R: io::Read> {
    source: R,
    trap: DecodingTrap,
}

impl<R: io::Read> ByteDecoder<R> {
    /// Create a decoder over `source`, failing on malformed input.
    pub fn read(source: R) -> Self {
        ByteDecoder {
            source,
            trap: DecodingTrap::Strict,
        }
    }

    /// Set the behavior of the decoder when the input is malformed.
    pub fn encoding_trap(&mut self, trap: DecodingTrap) -> &mut Self {
        self.trap = trap;
        self
    }

    /// Read the whole source as text.
    ///
    /// # Errors
    /// Returns [`ReadError::Encoding`] if reading fails or if the input is malformed.
    pub fn decode_to_string(&mut self) -> Result<String, ReadError> {
        let mut buffer = Vec::new();
        self.source
            .read_to_end(&mut buffer)
            .map_err(|e| ReadError::Encoding(Cow::Owned(e.to_string())))?;

        let encoding = Encoding::for_bom(&buffer)
            .map_or_else(|| detect_utf16_endianness(&buffer), |(encoding, _)| encoding);
        // The decoder skips the byte order mark.
        let mut decoder = encoding.new_decoder();
        let mut output = String::new();
        decode_loop(&buffer, &mut output, &mut decoder, self.trap)?;
        Ok(output)
    }

    /// Read the whole source, parse it and decode a `T` from it.
    ///
    /// # Errors
    /// Returns an error if the input cannot be decoded, parsed, or read as a `T`.
    pub fn decode<T: Decode>(&mut self) -> Result<T, ReadError> {
        let text = self.decode_to_string()?;
        crate::from_str(&text)
    }
}

/// Decode a `T` from bytes in UTF-8, UTF-16LE or UTF-16BE.
///
/// # Errors
/// Returns an error if the input cannot be decoded, parsed, or read as a `T`.
pub fn from_slice<T: Decode>(bytes: &[u8]) -> Result<T, ReadError> {
    let text = ByteDecoder::read(bytes).decode_to_string()?;
    let root = yamlet_parser::parse_str(&text)?;
    from_node(&root)
}

/// Run [`TextDecoder::decode_to_string_without_replacement`] until the input is consumed,
/// growing `output` as needed.
fn decode_loop(
    input: &[u8],
    output: &mut String,
    decoder: &mut TextDecoder,
    trap: DecodingTrap,
) -> Result<(), ReadError> {
    output.reserve(input.len());
    let mut total_bytes_read = 0;

    loop {
        match decoder.decode_to_string_without_replacement(&input[total_bytes_read..], output, true)
        {
            (DecoderResult::InputEmpty, _) => break Ok(()),
            (DecoderResult::OutputFull, bytes_read) => {
                total_bytes_read += bytes_read;
                output.reserve(input.len() / 10 + 4);
            }
            (DecoderResult::Malformed(malformed_len, bytes_after_malformed), bytes_read) => {
                total_bytes_read += bytes_read;
                let byte_idx = total_bytes_read
                    - (usize::from(malformed_len) + usize::from(bytes_after_malformed));
                let malformed = &input[byte_idx..byte_idx + usize::from(malformed_len)];
                let invalid = || {
                    ReadError::Encoding(Cow::Owned(format!(
                        "invalid character sequence at {byte_idx}: {malformed:?}"
                    )))
                };
                match trap {
                    DecodingTrap::Ignore => {}
                    DecodingTrap::Replace => output.push('\u{FFFD}'),
                    DecodingTrap::Strict => break Err(invalid()),
                    DecodingTrap::Call(callback) => {
                        if let ControlFlow::Break(error) = callback(
                            malformed_len,
                            bytes_after_malformed,
                            &input[byte_idx..],
                            output,
                        ) {
                            break Err(if error.is_empty() {
                                invalid()
                            } else {
                                ReadError::Encoding(error)
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Tell UTF-16LE and UTF-16BE apart by the nul byte of the first, ASCII, character.
///
/// Without a nul byte in the first two, the input is taken as UTF-8.
fn detect_utf16_endianness(b: &[u8]) -> &'static Encoding {
    match b {
        [0, c, ..] if *c != 0 => encoding_rs::UTF_16BE,
        [c, 0, ..] if *c != 0 => encoding_rs::UTF_16LE,
        _ => encoding_rs::UTF_8,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    fn check(value: &Value) {
        assert_eq!(value["a"], Value::Integer(1));
        assert_eq!(value["b"].as_floating_point(), Some(2.2));
        assert_eq!(value["c"][1], Value::Integer(2));
        assert!(value["d"][0].is_null());
    }

    #[test]
    fn utf8_with_bom() {
        let s = b"\xef\xbb\xbf---\na: 1\nb: 2.2\nc: [1, 2]\n";
        check(&from_slice(s).unwrap());
    }

    #[test]
    fn utf16le() {
        let s = b"\xff\xfe-\x00-\x00-\x00\n\x00a\x00:\x00 \x001\x00\n\x00b\x00:\x00 \x002\x00.\x002\x00\n\x00c\x00:\x00 \x00[\x001\x00,\x00 \x002\x00]\x00\n\x00";
        check(&from_slice(s).unwrap());
    }

    #[test]
    fn utf16be() {
        let s = b"\xfe\xff\x00-\x00-\x00-\x00\n\x00a\x00:\x00 \x001\x00\n\x00b\x00:\x00 \x002\x00.\x002\x00\n\x00c\x00:\x00 \x00[\x001\x00,\x00 \x002\x00]\x00\n";
        check(&from_slice(s).unwrap());
    }

    #[test]
    fn utf16le_without_bom() {
        let s = b"-\x00-\x00-\x00\n\x00a\x00:\x00 \x001\x00\n\x00b\x00:\x00 \x002\x00.\x002\x00\n\x00c\x00:\x00 \x00[\x001\x00,\x00 \x002\x00]\x00\n\x00";
        check(&from_slice(s).unwrap());
    }

    #[test]
    fn traps() {
        let s = b"---\na\xa9: 1\nb: 2.2\nc: [1, 2]\n";
        assert!(matches!(
            from_slice::<Value>(s),
            Err(ReadError::Encoding(message)) if message.starts_with("invalid character sequence")
        ));
        let value: Value = ByteDecoder::read(&s[..])
            .encoding_trap(DecodingTrap::Ignore)
            .decode()
            .unwrap();
        check(&value);

        let text = ByteDecoder::read(&s[..])
            .encoding_trap(DecodingTrap::Replace)
            .decode_to_string()
            .unwrap();
        assert!(text.starts_with("---\na\u{FFFD}: 1"));

        let error = ByteDecoder::read(&s[..])
            .encoding_trap(DecodingTrap::Call(|_, _, _, _| {
                ControlFlow::Break(Cow::Borrowed("no"))
            }))
            .decode::<Value>()
            .unwrap_err();
        assert_eq!(error, ReadError::Encoding(Cow::Borrowed("no")));
    }
}
