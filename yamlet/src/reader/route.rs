//! The explicit traversal stack of the [`Reader`](crate::Reader).

use std::slice;

use yamlet_parser::Node;

/// Iterates the children of a node, in document order.
#[derive(Clone, Debug)]
pub(crate) enum NodeIter<'a> {
    /// Yields the node once.
    Single(Option<&'a Node>),
    /// Documents of a stream or entries of a sequence.
    Nodes(slice::Iter<'a, Node>),
    /// Key, then value, of each entry of a mapping.
    Mapping {
        entries: slice::Iter<'a, Node>,
        value: Option<&'a Node>,
    },
    /// The properties (if any), then the content of a wrapper node.
    Wrapper(Option<&'a Node>, Option<&'a Node>),
}

impl<'a> NodeIter<'a> {
    /// Iterate the items of a sequence, mapping or stream.
    ///
    /// Returns the iterator, the number of items and the number of nodes it yields.
    pub(crate) fn items(node: &'a Node) -> Option<(Self, usize, usize)> {
        match node {
            Node::Stream { documents: entries } | Node::Sequence { entries } => {
                Some((NodeIter::Nodes(entries.iter()), entries.len(), entries.len()))
            }
            Node::Mapping { entries } => Some((
                NodeIter::Mapping {
                    entries: entries.iter(),
                    value: None,
                },
                entries.len(),
                entries.len() * 2,
            )),
            _ => None,
        }
    }

    /// Iterate the nodes a reader looks through to reach the value held by `node`.
    ///
    /// Returns the iterator and the number of nodes it yields.
    pub(crate) fn children(node: &'a Node) -> Option<(Self, usize)> {
        match node {
            Node::Content {
                properties,
                content: inner,
            }
            | Node::Collection {
                properties,
                collection: inner,
            } => Some((
                NodeIter::Wrapper(properties.as_deref(), Some(&**inner)),
                1 + usize::from(properties.is_some()),
            )),
            Node::Stream { documents } if documents.len() == 1 => {
                Some((NodeIter::Single(documents.first()), 1))
            }
            _ => None,
        }
    }
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        match self {
            NodeIter::Single(node) => node.take(),
            NodeIter::Nodes(nodes) => nodes.next(),
            NodeIter::Mapping { entries, value } => {
                if let Some(value) = value.take() {
                    return Some(value);
                }
                match entries.next()? {
                    Node::MappingEntry { key, value: v } => {
                        *value = Some(&**v);
                        Some(&**key)
                    }
                    // The parser builds mappings of entries only.
                    node => Some(node),
                }
            }
            NodeIter::Wrapper(properties, content) => properties.take().or_else(|| content.take()),
        }
    }
}

/// One frame of the route.
#[derive(Clone, Debug)]
pub(crate) struct RoutePoint<'a> {
    /// The outermost node of the frame. For collections, this is the node holding their
    /// properties, which is what anchors are bound to.
    pub(crate) node: &'a Node,
    pub(crate) iter: NodeIter<'a>,
    /// Identifies collection frames across public calls. Transient frames have id 0.
    pub(crate) id: usize,
    /// The number of items of a collection frame.
    pub(crate) size: usize,
    /// The number of nodes `iter` has yet to yield.
    pub(crate) remaining: usize,
}

impl<'a> RoutePoint<'a> {
    pub(crate) fn root(root: &'a Node) -> Self {
        RoutePoint {
            node: root,
            iter: NodeIter::Single(Some(root)),
            id: 0,
            size: 1,
            remaining: 1,
        }
    }

    /// A frame looking through a wrapper, discarded once the expectation is met.
    pub(crate) fn transient(node: &'a Node) -> Option<Self> {
        let (iter, remaining) = NodeIter::children(node)?;
        Some(RoutePoint {
            node,
            iter,
            id: 0,
            size: 0,
            remaining,
        })
    }

    /// A frame iterating the items of `collection`, which was reached through `origin`.
    pub(crate) fn collection(origin: &'a Node, collection: &'a Node, id: usize) -> Option<Self> {
        let (iter, size, remaining) = NodeIter::items(collection)?;
        Some(RoutePoint {
            node: origin,
            iter,
            id,
            size,
            remaining,
        })
    }

    pub(crate) fn next_node(&mut self) -> Option<&'a Node> {
        let node = self.iter.next()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(node)
    }
}

#[cfg(test)]
mod test {
    use yamlet_parser::Quoting;

    use super::*;

    fn text(node: &Node) -> &str {
        node.as_text().map_or("", |(text, _)| text)
    }

    #[test]
    fn mapping_yields_keys_and_values() {
        let mapping = Node::mapping(vec![
            (Node::scalar("a", Quoting::None), Node::scalar("1", Quoting::None)),
            (Node::scalar("b", Quoting::None), Node::scalar("2", Quoting::None)),
        ]);
        let Node::Collection { collection, .. } = &mapping else {
            unreachable!()
        };
        let mut point = RoutePoint::collection(&mapping, collection, 1).unwrap();
        assert_eq!((point.size, point.remaining), (2, 4));
        let texts: Vec<_> = std::iter::from_fn(|| point.next_node()).map(text).collect();
        assert_eq!(texts, ["a", "1", "b", "2"]);
        assert_eq!(point.remaining, 0);
    }

    #[test]
    fn wrappers_yield_properties_first() {
        let node = Node::scalar("x", Quoting::None).with_properties(None, Some("a".into()));
        let mut point = RoutePoint::transient(&node).unwrap();
        assert_eq!(point.remaining, 2);
        assert!(matches!(point.next_node(), Some(Node::Properties { .. })));
        assert_eq!(point.next_node().map(text), Some("x"));
        assert!(point.next_node().is_none());

        let empty = Node::Stream { documents: vec![] };
        assert!(RoutePoint::transient(&empty).is_none());
        assert!(RoutePoint::transient(&Node::Null).is_none());
    }
}
