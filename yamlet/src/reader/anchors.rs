use std::collections::HashMap;

use yamlet_parser::Node;

/// The anchors visited so far by a reader.
///
/// A properties node carrying an anchor marks its name as pending. The next node visited binds
/// the name to the node that holds those properties. Bindings are journaled so that a memento
/// restores the table exactly.
#[derive(Debug, Default)]
pub(crate) struct AnchorKeeper<'a> {
    anchors: HashMap<&'a str, &'a Node>,
    /// `(name, previous binding)` of each binding, oldest first.
    journal: Vec<(&'a str, Option<&'a Node>)>,
    pending: Option<&'a str>,
}

/// A snapshot of an [`AnchorKeeper`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct AnchorMemento<'a> {
    journal_len: usize,
    pending: Option<&'a str>,
}

impl<'a> AnchorKeeper<'a> {
    pub(crate) fn mark_pending(&mut self, name: &'a str) {
        self.pending = Some(name);
    }

    /// Bind the pending name, if any, to `node`.
    pub(crate) fn bind(&mut self, node: &'a Node) {
        if let Some(name) = self.pending.take() {
            debug_print!("anchor &{name} bound to {}", node.node_type());
            let previous = self.anchors.insert(name, node);
            self.journal.push((name, previous));
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&'a Node> {
        self.anchors.get(name).copied()
    }

    pub(crate) fn memento(&self) -> AnchorMemento<'a> {
        AnchorMemento {
            journal_len: self.journal.len(),
            pending: self.pending,
        }
    }

    pub(crate) fn set_memento(&mut self, memento: AnchorMemento<'a>) {
        while self.journal.len() > memento.journal_len {
            let Some((name, previous)) = self.journal.pop() else {
                break;
            };
            match previous {
                Some(node) => self.anchors.insert(name, node),
                None => self.anchors.remove(name),
            };
        }
        self.pending = memento.pending;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn memento_undoes_rebinding() {
        let first = Node::Null;
        let second = Node::Null;
        let mut keeper = AnchorKeeper::default();
        keeper.mark_pending("a");
        keeper.bind(&first);
        let memento = keeper.memento();

        keeper.mark_pending("a");
        keeper.bind(&second);
        keeper.mark_pending("b");
        keeper.bind(&second);
        keeper.mark_pending("c");
        assert!(std::ptr::eq(keeper.resolve("a").unwrap(), &second));

        keeper.set_memento(memento);
        assert!(std::ptr::eq(keeper.resolve("a").unwrap(), &first));
        assert!(keeper.resolve("b").is_none());
        assert!(!keeper.has_pending());
    }

    #[test]
    fn bind_without_pending_is_a_no_op() {
        let node = Node::Null;
        let mut keeper = AnchorKeeper::default();
        keeper.bind(&node);
        assert!(keeper.resolve("").is_none());
        assert_eq!(keeper.memento().journal_len, 0);
    }
}
