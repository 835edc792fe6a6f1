//! Sources of runes for the tokenizer.
//!
//! Any [`ResourceStream<Option<char>>`] can feed the tokenizer. Two are provided:
//!  * [`RuneStream`], backed by a vector of runes that can be recycled through a [`RunePool`].
//!  * [`IterRunes`], wrapping any [`Iterator`] of [`char`]s.
//!
//! Both return `None` once exhausted. A `\0` rune is part of the input like any other.

use crate::accessor::ResourceStream;

pub mod pool;

pub use pool::RunePool;

/// A rune stream over an owned buffer of runes.
///
/// The buffer may come from a [`RunePool`], in which case it should be given back with
/// [`RunePool::release`] once the stream is no longer needed.
#[derive(Debug, Default)]
pub struct RuneStream {
    /// The runes of the input.
    runes: Vec<char>,
    /// Index of the next rune to return.
    position: usize,
}

impl RuneStream {
    /// Create a stream over the runes of `input`, reusing the storage of `buffer`.
    #[must_use]
    pub fn with_buffer(mut buffer: Vec<char>, input: &str) -> Self {
        buffer.clear();
        buffer.extend(input.chars());
        Self {
            runes: buffer,
            position: 0,
        }
    }

    /// Return the number of runes that were not pulled yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.runes.len() - self.position
    }

    /// Return whether every rune has been pulled.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume the stream, returning its backing storage.
    pub(crate) fn into_buffer(self) -> Vec<char> {
        self.runes
    }
}

impl From<&str> for RuneStream {
    fn from(input: &str) -> Self {
        Self::with_buffer(Vec::new(), input)
    }
}

impl ResourceStream<Option<char>> for RuneStream {
    #[inline]
    fn next(&mut self) -> Option<char> {
        let c = self.runes.get(self.position).copied()?;
        self.position += 1;
        Some(c)
    }
}

/// A rune stream wrapping an [`Iterator`] of [`char`]s.
///
/// This allows tokenizing input that is not fully available in memory.
pub struct IterRunes<T: Iterator<Item = char>> {
    /// The iterator source.
    input: T,
}

impl<T: Iterator<Item = char>> IterRunes<T> {
    /// Create a new [`IterRunes`] with the given input.
    pub fn new(input: T) -> Self {
        Self { input }
    }
}

impl<T: Iterator<Item = char>> ResourceStream<Option<char>> for IterRunes<T> {
    #[inline]
    fn next(&mut self) -> Option<char> {
        self.input.next()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn streams_end_with_none() {
        let mut runes = RuneStream::from("a\0");
        assert_eq!(runes.remaining(), 2);
        assert_eq!(runes.next(), Some('a'));
        assert_eq!(runes.next(), Some('\0'));
        assert!(runes.is_exhausted());
        assert_eq!(runes.next(), None);
        assert_eq!(runes.next(), None);

        let mut runes = IterRunes::new("é\0".chars());
        assert_eq!(runes.next(), Some('é'));
        assert_eq!(runes.next(), Some('\0'));
        assert_eq!(runes.next(), None);
    }
}
