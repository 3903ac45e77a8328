//! Detached element positions.

use crate::Index;

/// A `(node, offset)` handle to an element of an [`UnrolledList`].
///
/// Positions own nothing and borrow nothing; they are checked against the
/// list whenever they are used. The past-the-end position is
/// `(K::NONE, 0)`.
///
/// A position is only meaningful for the list that produced it. Any
/// insertion or erasure in the same node may shift the element it names;
/// operations that mutate the list return fresh positions.
///
/// [`UnrolledList`]: crate::UnrolledList
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position<K> {
    node: K,
    offset: usize,
}

impl<K: Index> Position<K> {
    /// Creates a position from its parts.
    ///
    /// Nothing is validated here; see [`UnrolledList::check`](crate::UnrolledList::check).
    #[inline]
    pub const fn new(node: K, offset: usize) -> Self {
        Self { node, offset }
    }

    /// The past-the-end position.
    #[inline]
    pub const fn end() -> Self {
        Self {
            node: K::NONE,
            offset: 0,
        }
    }

    /// Handle of the node holding the element.
    #[inline]
    pub const fn node(&self) -> K {
        self.node
    }

    /// Offset of the element within its node.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` for any position whose node is the sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }
}

impl<K: Index> Default for Position<K> {
    fn default() -> Self {
        Self::end()
    }
}
