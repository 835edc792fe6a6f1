//! Bracket and quote balance tracking.

/// A change made to the stack of a [`BalanceChecker`], recorded so it can be undone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Change<K> {
    Pushed,
    Popped(K),
}

/// A snapshot of a [`BalanceChecker`], see [`BalanceChecker::memento`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Memento {
    /// Length of the change journal when the snapshot was taken.
    journal: usize,
    /// Whether the checker was already latched as unbalanced.
    unbalanced: bool,
}

/// Tracks whether a sequence of opening and closing delimiters is balanced.
///
/// The checker is given pairs of `(opener, closer)`. A pair whose opener and closer are equal
/// (e.g. quotes) is self-paired: such a delimiter closes the innermost open delimiter if it
/// matches it, and opens a new one otherwise.
///
/// ```
/// # use yamlet_parser::BalanceChecker;
/// let mut checker = BalanceChecker::new(&[('[', ']'), ('"', '"')]);
/// for c in "[\"\"]".chars() {
///     checker.add(c);
/// }
/// assert!(checker.is_balanced());
/// ```
#[derive(Clone, Debug)]
pub struct BalanceChecker<K> {
    /// The known `(opener, closer)` pairs.
    pairs: Vec<(K, K)>,
    /// Openers waiting for their closer, innermost last.
    stack: Vec<K>,
    /// Changes made to `stack` since the first memento was taken.
    journal: Vec<Change<K>>,
    /// Whether mementos were taken and the journal must be kept.
    recording: bool,
    /// Set once a closer did not match its opener. Never reset, except through a memento.
    unbalanced: bool,
}

impl<K: Copy + Eq> BalanceChecker<K> {
    /// Create a checker for the given `(opener, closer)` pairs.
    #[must_use]
    pub fn new(pairs: &[(K, K)]) -> Self {
        Self {
            pairs: pairs.to_vec(),
            stack: Vec::new(),
            journal: Vec::new(),
            recording: false,
            unbalanced: false,
        }
    }

    /// Feed one delimiter kind to the checker.
    ///
    /// Kinds that are neither openers nor closers are ignored. Returns `false` if the checker is,
    /// or just became, unbalanced.
    pub fn add(&mut self, kind: K) -> bool {
        if self.unbalanced {
            return false;
        }
        let top_closes = self
            .stack
            .last()
            .is_some_and(|&top| self.pairs.iter().any(|&(o, c)| o == top && c == kind));
        if top_closes {
            if let Some(top) = self.stack.pop() {
                self.record(Change::Popped(top));
            }
        } else if self.is_opener(kind) {
            self.stack.push(kind);
            self.record(Change::Pushed);
        } else if self.is_closer(kind) {
            self.unbalanced = true;
        }
        !self.unbalanced
    }

    /// Return whether every opener was closed and no mismatched closer was seen.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        !self.unbalanced && self.stack.is_empty()
    }

    /// Return whether a mismatched closer was seen.
    #[must_use]
    pub fn cannot_be_balanced(&self) -> bool {
        self.unbalanced
    }

    /// Return the innermost opener that is still waiting for its closer.
    #[must_use]
    pub fn peek_last_unbalanced(&self) -> Option<K> {
        self.stack.last().copied()
    }

    /// Return the number of openers waiting for their closer.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Return a snapshot of the checker that [`Self::set_memento`] can restore.
    pub fn memento(&mut self) -> Memento {
        self.recording = true;
        Memento {
            journal: self.journal.len(),
            unbalanced: self.unbalanced,
        }
    }

    /// Restore the checker to the state it had when `memento` was taken.
    pub fn set_memento(&mut self, memento: Memento) {
        while self.journal.len() > memento.journal {
            match self.journal.pop() {
                Some(Change::Pushed) => {
                    self.stack.pop();
                }
                Some(Change::Popped(kind)) => self.stack.push(kind),
                None => break,
            }
        }
        self.unbalanced = memento.unbalanced;
    }

    /// Forget every change recorded so far. Previously taken mementos become invalid.
    pub fn forget_mementos(&mut self) {
        self.journal.clear();
        self.recording = false;
    }

    fn record(&mut self, change: Change<K>) {
        if self.recording {
            self.journal.push(change);
        }
    }

    fn is_opener(&self, kind: K) -> bool {
        self.pairs.iter().any(|&(o, _)| o == kind)
    }

    fn is_closer(&self, kind: K) -> bool {
        self.pairs.iter().any(|&(_, c)| c == kind)
    }
}
