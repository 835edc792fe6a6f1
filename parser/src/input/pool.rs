//! A free-list of rune buffers.

use super::RuneStream;

/// The number of buffers a pool keeps at most.
///
/// Buffers released to a full pool are dropped.
const MAX_POOLED: usize = 8;

/// A pool of reusable rune buffers.
///
/// Tokenizing a document requires decoding it into runes. Reusing the backing storage across
/// documents avoids reallocating it each time. Buffers are handed out with [`RunePool::acquire`]
/// and must be given back with [`RunePool::release`]; a stream that is never released simply
/// leaks its buffer out of the pool.
///
/// ```
/// # use yamlet_parser::{RunePool, ResourceStream};
/// let mut pool = RunePool::new();
/// let mut stream = pool.acquire("ab");
/// assert_eq!(stream.next(), Some('a'));
/// pool.release(stream);
/// assert_eq!(pool.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RunePool {
    /// Buffers ready to be reused.
    free: Vec<Vec<char>>,
}

impl RunePool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a stream over `input`, backed by a recycled buffer if one is available.
    pub fn acquire(&mut self, input: &str) -> RuneStream {
        let buffer = self.free.pop().unwrap_or_default();
        RuneStream::with_buffer(buffer, input)
    }

    /// Give the storage of `stream` back to the pool.
    ///
    /// The stream is consumed, so a buffer cannot be released twice.
    pub fn release(&mut self, stream: RuneStream) {
        if self.free.len() < MAX_POOLED {
            let mut buffer = stream.into_buffer();
            buffer.clear();
            self.free.push(buffer);
        }
    }

    /// Return the number of buffers waiting to be reused.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Return whether no buffer is waiting to be reused.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ResourceStream;

    #[test]
    fn buffers_are_recycled() {
        let mut pool = RunePool::new();
        let stream = pool.acquire("a long enough document");
        pool.release(stream);
        assert_eq!(pool.len(), 1);

        let mut stream = pool.acquire("xy");
        assert!(pool.is_empty());
        assert_eq!(stream.next(), Some('x'));
        assert_eq!(stream.next(), Some('y'));
        assert_eq!(stream.next(), None);
        pool.release(stream);
    }

    #[test]
    fn pool_is_bounded() {
        let mut pool = RunePool::new();
        let streams: Vec<_> = (0..MAX_POOLED + 2).map(|_| pool.acquire("a")).collect();
        for stream in streams {
            pool.release(stream);
        }
        assert_eq!(pool.len(), MAX_POOLED);
    }
}
