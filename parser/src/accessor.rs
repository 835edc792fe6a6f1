//! A pull-based buffer with nested checkpoints over any [`ResourceStream`].
//!
//! The [`Accessor`] is the backtracking primitive of the tokenizer (over runes) and of the parser
//! (over tokens). Values pulled while a checkpoint is active are buffered so that a
//! [`rollback`](Accessor::rollback) can replay them without pulling them from the underlying
//! stream again.

/// A pull-only source of values.
///
/// Streams never end: once exhausted, they must keep returning a terminal value (`None` for rune
/// streams, an `EOF` token for token streams).
pub trait ResourceStream<T> {
    /// Pull the next value from the stream.
    fn next(&mut self) -> T;
}

impl<T, S: ResourceStream<T> + ?Sized> ResourceStream<T> for Box<S> {
    fn next(&mut self) -> T {
        (**self).next()
    }
}

/// A checkpointing accessor over a [`ResourceStream`].
///
/// ```
/// # use yamlet_parser::{Accessor, RuneStream};
/// let mut runes = Accessor::new(RuneStream::from("abc"));
/// runes.set_checkpoint();
/// assert_eq!(runes.next(), Some('a'));
/// assert_eq!(runes.next(), Some('b'));
/// assert_eq!(runes.rollback(), Some('a'));
/// assert_eq!(runes.next(), Some('b'));
/// runes.commit();
/// assert_eq!(runes.next(), Some('c'));
/// ```
#[derive(Debug)]
pub struct Accessor<T, S> {
    /// The underlying stream.
    stream: S,
    /// Values pulled while a checkpoint was active and that may be replayed.
    buffer: Vec<T>,
    /// Index in `buffer` of the next value to return.
    cursor: usize,
    /// Stack of buffer positions to rewind to.
    checkpoints: Vec<usize>,
    /// The value most recently returned, replayed by a rollback without checkpoints.
    saved: Option<T>,
}

impl<T: Clone, S: ResourceStream<T>> Accessor<T, S> {
    /// Create a new accessor pulling from `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            cursor: 0,
            checkpoints: Vec::new(),
            saved: None,
        }
    }

    /// Return the next logical value.
    ///
    /// Buffered values are replayed first. Values pulled from the stream are buffered only if a
    /// checkpoint is active.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> T {
        let value = if self.cursor < self.buffer.len() {
            let value = self.buffer[self.cursor].clone();
            self.cursor += 1;
            value
        } else {
            let value = self.stream.next();
            if self.checkpoints.is_empty() {
                self.buffer.clear();
                self.cursor = 0;
            } else {
                self.buffer.push(value.clone());
                self.cursor += 1;
            }
            value
        };
        self.saved = Some(value.clone());
        value
    }

    /// Mark the current position as one to rewind to.
    pub fn set_checkpoint(&mut self) {
        self.checkpoints.push(self.cursor);
    }

    /// Rewind to the most recent checkpoint and return the value found there.
    ///
    /// The returned value is consumed, exactly as if [`Self::next`] had been called right after
    /// rewinding. Without any checkpoint, the value most recently returned is returned again and
    /// the position is left untouched.
    pub fn rollback(&mut self) -> T {
        match self.checkpoints.pop() {
            Some(position) => {
                self.cursor = position;
                self.next()
            }
            None => match self.saved.clone() {
                Some(value) => value,
                None => self.next(),
            },
        }
    }

    /// Rewind to the most recent checkpoint without consuming anything.
    ///
    /// The next call to [`Self::next`] returns the value found at the checkpoint. Without any
    /// checkpoint, this is a no-op.
    pub fn rewind(&mut self) {
        if let Some(position) = self.checkpoints.pop() {
            self.cursor = position;
        }
    }

    /// Discard the most recent checkpoint without rewinding.
    ///
    /// Once the last checkpoint is committed, values that can no longer be replayed are dropped
    /// from the buffer. Without any checkpoint, this is a no-op.
    pub fn commit(&mut self) {
        if self.checkpoints.pop().is_some() && self.checkpoints.is_empty() {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
    }

    /// Return the number of active checkpoints.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Return a reference to the underlying stream.
    #[must_use]
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Consume the accessor, returning the underlying stream.
    ///
    /// Buffered values that were not replayed are lost.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A stream yielding the given letters, then `'.'` forever.
    struct Letters(std::vec::IntoIter<char>, usize);

    impl ResourceStream<char> for Letters {
        fn next(&mut self) -> char {
            self.1 += 1;
            self.0.next().unwrap_or('.')
        }
    }

    fn letters(s: &str) -> Accessor<char, Letters> {
        Accessor::new(Letters(s.chars().collect::<Vec<_>>().into_iter(), 0))
    }

    #[test]
    fn golden_trace() {
        let mut acc = letters("ABC");
        acc.set_checkpoint();
        assert_eq!(acc.next(), 'A');
        assert_eq!(acc.next(), 'B');
        assert_eq!(acc.rollback(), 'A');
        assert_eq!(acc.next(), 'B');
        acc.commit();
        assert_eq!(acc.next(), 'C');
        assert_eq!(acc.next(), '.');
        // Every value was pulled exactly once from the stream.
        assert_eq!(acc.stream().1, 4);
    }

    #[test]
    fn rollback_without_checkpoint() {
        let mut acc = letters("AB");
        assert_eq!(acc.rollback(), 'A');
        assert_eq!(acc.rollback(), 'A');
        assert_eq!(acc.next(), 'B');
        assert_eq!(acc.rollback(), 'B');
        acc.commit();
        assert_eq!(acc.next(), '.');
    }

    #[test]
    fn nested_rollbacks_keep_buffer() {
        let mut acc = letters("ABCDE");
        acc.set_checkpoint();
        assert_eq!(acc.next(), 'A');
        acc.set_checkpoint();
        assert_eq!(acc.next(), 'B');
        assert_eq!(acc.next(), 'C');
        assert_eq!(acc.rollback(), 'B');
        assert_eq!(acc.next(), 'C');
        assert_eq!(acc.next(), 'D');
        assert_eq!(acc.rollback(), 'A');
        assert_eq!(acc.next(), 'B');
        acc.set_checkpoint();
        assert_eq!(acc.next(), 'C');
        acc.commit();
        assert_eq!(acc.next(), 'D');
        assert_eq!(acc.next(), 'E');
        assert_eq!(acc.stream().1, 5);
    }

    #[test]
    fn commit_compacts() {
        let mut acc = letters("ABC");
        acc.set_checkpoint();
        acc.next();
        acc.next();
        acc.commit();
        assert!(acc.buffer.is_empty());
        assert_eq!(acc.rollback(), 'B');
        assert_eq!(acc.next(), 'C');
    }

    #[test]
    fn rewind_does_not_consume() {
        let mut acc = letters("ABC");
        assert_eq!(acc.next(), 'A');
        acc.set_checkpoint();
        assert_eq!(acc.next(), 'B');
        assert_eq!(acc.next(), 'C');
        acc.rewind();
        assert_eq!(acc.depth(), 0);
        assert_eq!(acc.next(), 'B');
        assert_eq!(acc.next(), 'C');
        assert_eq!(acc.next(), '.');
        assert_eq!(acc.stream().1, 4);
    }
}
