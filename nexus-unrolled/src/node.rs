//! Fixed-capacity element block with chain links.

use heapless::Vec as InlineVec;

use crate::Index;

/// A node in an unrolled list: up to `N` contiguous elements plus links.
///
/// Elements live inline in a [`heapless::Vec`], so a node never reallocates
/// and slots past `len()` are never initialized. Users reach elements through
/// the list; the node itself is only public because it names the storage
/// type (`Arena<Node<T, N, K>>`).
#[derive(Debug)]
pub struct Node<T, const N: usize, K> {
    items: InlineVec<T, N>,
    pub(crate) prev: K,
    pub(crate) next: K,
}

impl<T, const N: usize, K: Index> Node<T, N, K> {
    /// Creates an empty node linked between `prev` and `next`.
    #[inline]
    pub(crate) fn new(prev: K, next: K) -> Self {
        Self {
            items: InlineVec::new(),
            prev,
            next,
        }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the node holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` if the node holds `N` elements.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    /// Live elements in order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Appends at slot `len()`.
    ///
    /// # Panics
    ///
    /// Panics if the node is full.
    #[inline]
    pub(crate) fn append(&mut self, value: T) {
        if self.items.push(value).is_err() {
            panic!("append into full node");
        }
    }

    /// Shifts `[offset, len)` up one slot and places `value` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the node is full or `offset > len()`.
    #[inline]
    pub(crate) fn insert_at(&mut self, offset: usize, value: T) {
        if self.items.insert(offset, value).is_err() {
            panic!("insert into full node");
        }
    }

    /// Removes the element at `offset`, shifting the tail down.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= len()`.
    #[inline]
    pub(crate) fn erase_at(&mut self, offset: usize) -> T {
        self.items.remove(offset)
    }

    #[inline]
    pub(crate) fn pop_back(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Moves elements `[at, len)` out, in order, leaving `[0, at)`.
    pub(crate) fn split_off(&mut self, at: usize) -> InlineVec<T, N> {
        let mut upper: InlineVec<T, N> = InlineVec::new();
        while self.items.len() > at {
            let Some(value) = self.items.pop() else { break };
            if upper.push(value).is_err() {
                unreachable!("split half exceeds node capacity");
            }
        }
        upper.reverse();
        upper
    }

    /// Replaces the contents of an empty node.
    #[inline]
    pub(crate) fn fill(&mut self, items: InlineVec<T, N>) {
        debug_assert!(self.items.is_empty(), "fill into non-empty node");
        self.items = items;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestNode = Node<u32, 4, u32>;

    fn node_with(values: &[u32]) -> TestNode {
        let mut node = TestNode::new(u32::NONE, u32::NONE);
        for &v in values {
            node.append(v);
        }
        node
    }

    #[test]
    fn append_until_full() {
        let node = node_with(&[1, 2, 3, 4]);
        assert!(node.is_full());
        assert_eq!(node.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "append into full node")]
    fn append_full_panics() {
        let mut node = node_with(&[1, 2, 3, 4]);
        node.append(5);
    }

    #[test]
    fn insert_at_shifts_right() {
        let mut node = node_with(&[1, 3]);
        node.insert_at(1, 2);
        node.insert_at(0, 0);
        assert_eq!(node.as_slice(), &[0, 1, 2, 3]);
        assert!(node.is_full());
    }

    #[test]
    fn erase_at_shifts_left() {
        let mut node = node_with(&[1, 2, 3, 4]);
        assert_eq!(node.erase_at(1), 2);
        assert_eq!(node.as_slice(), &[1, 3, 4]);
        assert_eq!(node.erase_at(2), 4);
        assert_eq!(node.as_slice(), &[1, 3]);
    }

    #[test]
    fn pop_both_ends() {
        let mut node = node_with(&[1, 2, 3]);
        assert_eq!(node.pop_front(), Some(1));
        assert_eq!(node.pop_back(), Some(3));
        assert_eq!(node.pop_front(), Some(2));
        assert_eq!(node.pop_front(), None);
        assert_eq!(node.pop_back(), None);
        assert!(node.is_empty());
    }

    #[test]
    fn split_off_keeps_order() {
        let mut node = node_with(&[1, 2, 3, 4]);
        let upper = node.split_off(2);
        assert_eq!(node.as_slice(), &[1, 2]);
        assert_eq!(&upper[..], &[3, 4]);

        let mut other = TestNode::new(u32::NONE, u32::NONE);
        other.fill(upper);
        assert_eq!(other.as_slice(), &[3, 4]);
    }

    #[test]
    fn split_off_at_len_moves_nothing() {
        let mut node = node_with(&[1, 2, 3]);
        let upper = node.split_off(3);
        assert!(upper.is_empty());
        assert_eq!(node.as_slice(), &[1, 2, 3]);

        let upper = node.split_off(0);
        assert!(node.is_empty());
        assert_eq!(&upper[..], &[1, 2, 3]);
    }

    #[test]
    fn drop_releases_every_element_once() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        {
            let mut node: Node<Rc<()>, 4, u32> = Node::new(u32::NONE, u32::NONE);
            for _ in 0..4 {
                node.append(Rc::clone(&tracker));
            }
            drop(node.erase_at(0));
            let upper = node.split_off(1);
            assert_eq!(Rc::strong_count(&tracker), 4);
            drop(upper);
            assert_eq!(Rc::strong_count(&tracker), 2);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
