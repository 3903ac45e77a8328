//! Unrolled linked list over node storage.
//!
//! Elements live in fixed-capacity nodes of `N` contiguous slots; nodes are
//! linked into a doubly-linked chain and allocated from a [`Storage`]. An
//! insertion shifts at most `N` elements, and a full node is split in half
//! to make room, so no node ever exceeds `N` elements. A node emptied by an
//! erase or pop is unlinked and returned to the storage immediately: the
//! chain never holds an empty node, and an empty list holds no nodes at all.
//!
//! # Positions
//!
//! Elements are addressed by [`Position`]s, detached `(node, offset)` pairs.
//! Every operation that takes a position validates it first; with the
//! default generational [`Arena`] a position into a destroyed node is
//! reported as [`PositionError::StaleNode`] even after the slot is reused.
//!
//! ```
//! use nexus_unrolled::UnrolledList;
//!
//! let mut list: UnrolledList<u32> = UnrolledList::new();
//! list.push_back(1);
//! list.push_back(2);
//! list.push_back(3);
//! list.push_front(0);
//!
//! let second = list.next_position(list.begin()).unwrap();
//! list.insert(second, 10);
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 10, 1, 2, 3]);
//!
//! let third = list.position_at(2).unwrap();
//! list.erase(third).unwrap();
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 10, 2, 3]);
//! ```
//!
//! # Bounded vs Unbounded Storage
//!
//! Every allocating operation has a `try_*` form that works with any
//! storage and reports exhaustion. The infallible forms exist only when the
//! storage implements [`UnboundedStorage`]:
//!
//! ```
//! use nexus_unrolled::{BoundedArena, BoundedList, Full};
//!
//! let mut list: BoundedList<u32, 4> = BoundedList::with_storage(BoundedArena::with_max_nodes(1));
//! for i in 0..4 {
//!     list.try_push_back(i).unwrap();
//! }
//! assert_eq!(list.try_push_back(4), Err(Full(4)));
//! assert_eq!(list.len(), 4);
//! ```

use core::convert::Infallible;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter;
use core::marker::PhantomData;
use core::ops;

use tracing::{debug, trace};

use crate::storage::{Allocate, Fallible, Growing};
use crate::{
    Arena, BoundedArena, Chunks, ChunksMut, Cursor, CursorMut, Drain, Full, Index, InsertError,
    IntoIter, Iter, IterMut, Node, NodeKey, Position, PositionError, RangeError, Storage,
    UnboundedStorage,
};

/// Node capacity used when `N` is not given.
pub const DEFAULT_NODE_CAPACITY: usize = 10;

/// List over a [`BoundedArena`]: a fixed node budget, `try_*` insertion only.
pub type BoundedList<T, const N: usize = { DEFAULT_NODE_CAPACITY }> =
    UnrolledList<T, N, NodeKey, BoundedArena<Node<T, N, NodeKey>>>;

/// List over `slab::Slab`. Slab keys carry no generation, so stale
/// positions are only caught when the slot is vacant or the offset is out
/// of range.
#[cfg(feature = "slab")]
pub type SlabList<T, const N: usize = { DEFAULT_NODE_CAPACITY }> =
    UnrolledList<T, N, usize, slab::Slab<Node<T, N, usize>>>;

/// An ordered sequence stored as a chain of fixed-capacity nodes.
///
/// # Type Parameters
///
/// - `T`: Element type
/// - `N`: Node capacity (default 10, must be at least 2)
/// - `K`: Node handle type (default [`NodeKey`])
/// - `S`: Node storage (default [`Arena`])
///
/// # Example
///
/// ```
/// use nexus_unrolled::UnrolledList;
///
/// let mut list: UnrolledList<&str, 4> = ["a", "b", "c"].into();
/// list.push_front("z");
///
/// assert_eq!(list.front(), Some(&"z"));
/// assert_eq!(list.back(), Some(&"c"));
/// assert_eq!(list[1], "a");
/// assert_eq!(list.node_count(), 1);
/// ```
pub struct UnrolledList<
    T,
    const N: usize = { DEFAULT_NODE_CAPACITY },
    K: Index = NodeKey,
    S = Arena<Node<T, N, K>>,
> where
    S: Storage<Node<T, N, K>, Index = K>,
{
    storage: S,
    head: K,
    tail: K,
    len: usize,
    node_count: usize,
    _marker: PhantomData<T>,
}

impl<T, const N: usize, K: Index, S> Default for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, K: Index, S> UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K> + Default,
{
    /// Creates an empty list over a default-constructed storage.
    #[inline]
    pub fn new() -> Self {
        Self::with_storage(S::default())
    }
}

// =============================================================================
// Base impl - works with any Storage
// =============================================================================

impl<T, const N: usize, K: Index, S> UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    /// Elements per node.
    pub const NODE_CAPACITY: usize = N;

    /// Elements kept in the original node when a full node splits.
    const HALF: usize = N / 2;

    /// Creates an empty list that allocates its nodes from `storage`.
    #[inline]
    pub fn with_storage(storage: S) -> Self {
        const { assert!(N >= 2, "node capacity must be at least 2") };
        Self {
            storage,
            head: K::NONE,
            tail: K::NONE,
            len: 0,
            node_count: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of nodes in the chain.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Upper bound on the number of elements: the storage's slot limit
    /// times the node capacity.
    #[inline]
    pub fn max_len(&self) -> usize {
        self.storage.max_len().saturating_mul(N)
    }

    /// Returns the node storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[inline]
    pub(crate) fn node(&self, key: K) -> &Node<T, N, K> {
        self.storage.get(key).expect("linked node missing from storage")
    }

    #[inline]
    fn node_mut(&mut self, key: K) -> &mut Node<T, N, K> {
        self.storage.get_mut(key).expect("linked node missing from storage")
    }

    /// Slots in the storage not used by anything, counting this list's own
    /// nodes as free when `reclaim` is set.
    #[inline]
    fn free_nodes(&self, reclaim: bool) -> usize {
        let used = if reclaim {
            self.storage.len() - self.node_count
        } else {
            self.storage.len()
        };
        self.storage.max_len().saturating_sub(used)
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Allocates an empty node and splices it between `prev` and `next`.
    ///
    /// On allocation failure nothing is modified.
    fn create_node<A>(&mut self, prev: K, next: K) -> Result<K, A::Error>
    where
        A: Allocate<Node<T, N, K>, S>,
    {
        let key = match A::allocate(&mut self.storage, Node::new(prev, next)) {
            Ok(key) => key,
            Err(error) => {
                debug!(
                    nodes = self.node_count,
                    max_nodes = self.storage.max_len(),
                    "node storage refused allocation"
                );
                return Err(error);
            }
        };

        if prev.is_some() {
            self.node_mut(prev).next = key;
        } else {
            self.head = key;
        }

        if next.is_some() {
            self.node_mut(next).prev = key;
        } else {
            self.tail = key;
        }

        self.node_count += 1;
        trace!(node = ?key, prev = ?prev, next = ?next, "node created");
        Ok(key)
    }

    /// Unsplices `key` and returns its slot to the storage, dropping any
    /// elements it still holds.
    fn destroy_node(&mut self, key: K) {
        let node = self
            .storage
            .remove(key)
            .expect("linked node missing from storage");

        if node.prev.is_some() {
            self.node_mut(node.prev).next = node.next;
        } else {
            self.head = node.next;
        }

        if node.next.is_some() {
            self.node_mut(node.next).prev = node.prev;
        } else {
            self.tail = node.prev;
        }

        self.node_count -= 1;
        trace!(node = ?key, dropped = node.len(), "node destroyed");
    }

    // ========================================================================
    // Positions
    // ========================================================================

    /// Position of the first element, or [`end`](Self::end) if empty.
    #[inline]
    pub fn begin(&self) -> Position<K> {
        Position::new(self.head, 0)
    }

    /// The past-the-end position.
    #[inline]
    pub fn end(&self) -> Position<K> {
        Position::end()
    }

    /// Position of the last element.
    #[inline]
    pub fn last_position(&self) -> Option<Position<K>> {
        let tail = self.tail.into_option()?;
        Some(Position::new(tail, self.node(tail).len() - 1))
    }

    /// Position of the element at `index`, found by walking from the nearer
    /// end. `index == len()` yields [`end`](Self::end).
    pub fn position_at(&self, index: usize) -> Option<Position<K>> {
        if index > self.len {
            return None;
        }
        if index == self.len {
            return Some(Position::end());
        }

        if index < self.len / 2 {
            let mut key = self.head;
            let mut remaining = index;
            loop {
                let node = self.node(key);
                if remaining < node.len() {
                    return Some(Position::new(key, remaining));
                }
                remaining -= node.len();
                key = node.next;
            }
        } else {
            let mut key = self.tail;
            let mut from_back = self.len - 1 - index;
            loop {
                let node = self.node(key);
                if from_back < node.len() {
                    return Some(Position::new(key, node.len() - 1 - from_back));
                }
                from_back -= node.len();
                key = node.prev;
            }
        }
    }

    /// Validates `pos` against this list.
    ///
    /// A position is valid if it is past-the-end, or names a live node and
    /// an offset below that node's element count.
    pub fn check(&self, pos: Position<K>) -> Result<(), PositionError> {
        if pos.is_end() {
            return if pos.offset() == 0 {
                Ok(())
            } else {
                Err(PositionError::OffsetOutOfRange {
                    offset: pos.offset(),
                    len: 0,
                })
            };
        }

        let node = self
            .storage
            .get(pos.node())
            .ok_or(PositionError::StaleNode)?;
        if pos.offset() < node.len() {
            Ok(())
        } else {
            Err(PositionError::OffsetOutOfRange {
                offset: pos.offset(),
                len: node.len(),
            })
        }
    }

    /// Position following `pos`, crossing into the next node as needed.
    ///
    /// # Errors
    ///
    /// [`PositionError::PastTheEnd`] if `pos` is past-the-end, or the
    /// validation error if `pos` is invalid.
    pub fn next_position(&self, pos: Position<K>) -> Result<Position<K>, PositionError> {
        self.check(pos)?;
        if pos.is_end() {
            return Err(PositionError::PastTheEnd);
        }
        Ok(self.advance(pos))
    }

    /// Position preceding `pos`. Retreating from past-the-end yields the
    /// last element.
    ///
    /// # Errors
    ///
    /// [`PositionError::BeforeBegin`] if `pos` is the first element (or the
    /// list is empty), or the validation error if `pos` is invalid.
    pub fn prev_position(&self, pos: Position<K>) -> Result<Position<K>, PositionError> {
        self.check(pos)?;
        self.retreat(pos).ok_or(PositionError::BeforeBegin)
    }

    /// Steps a valid, non-end position forward.
    #[inline]
    pub(crate) fn advance(&self, pos: Position<K>) -> Position<K> {
        let node = self.node(pos.node());
        if pos.offset() + 1 < node.len() {
            Position::new(pos.node(), pos.offset() + 1)
        } else {
            Position::new(node.next, 0)
        }
    }

    /// Steps a valid position back; `None` from the first element.
    #[inline]
    pub(crate) fn retreat(&self, pos: Position<K>) -> Option<Position<K>> {
        if pos.is_end() {
            return self.last_position();
        }
        if pos.offset() > 0 {
            return Some(Position::new(pos.node(), pos.offset() - 1));
        }
        let prev = self.node(pos.node()).prev.into_option()?;
        Some(Position::new(prev, self.node(prev).len() - 1))
    }

    // ========================================================================
    // Element access
    // ========================================================================

    /// Returns the element at `pos`; `None` if past-the-end or invalid.
    #[inline]
    pub fn at(&self, pos: Position<K>) -> Option<&T> {
        if pos.is_end() {
            return None;
        }
        self.storage.get(pos.node())?.as_slice().get(pos.offset())
    }

    /// Returns the element at `pos` mutably; `None` if past-the-end or
    /// invalid.
    #[inline]
    pub fn at_mut(&mut self, pos: Position<K>) -> Option<&mut T> {
        if pos.is_end() {
            return None;
        }
        self.storage
            .get_mut(pos.node())?
            .as_mut_slice()
            .get_mut(pos.offset())
    }

    /// Returns the first element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.at(self.begin())
    }

    /// Returns the first element mutably.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.at_mut(self.begin())
    }

    /// Returns the last element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.at(self.last_position()?)
    }

    /// Returns the last element mutably.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.last_position()?;
        self.at_mut(last)
    }

    /// Returns the element at `index`. O(n / N).
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.at(self.position_at(index)?)
    }

    /// Returns the element at `index` mutably. O(n / N).
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let pos = self.position_at(index)?;
        self.at_mut(pos)
    }

    // ========================================================================
    // Insertion internals
    // ========================================================================

    /// Inserts before a validated position, splitting a full node.
    ///
    /// The only failure is node allocation, which leaves the list as it was
    /// and hands the value back.
    pub(crate) fn insert_validated<A>(
        &mut self,
        pos: Position<K>,
        value: T,
    ) -> Result<Position<K>, (T, A::Error)>
    where
        A: Allocate<Node<T, N, K>, S>,
    {
        if pos.is_end() {
            return self.push_back_in::<A>(value);
        }

        let (key, offset) = (pos.node(), pos.offset());
        if !self.node(key).is_full() {
            self.node_mut(key).insert_at(offset, value);
            self.len += 1;
            return Ok(pos);
        }

        // Allocate before touching the full node
        let next = self.node(key).next;
        let split = match self.create_node::<A>(key, next) {
            Ok(split) => split,
            Err(error) => return Err((value, error)),
        };

        let upper = self.node_mut(key).split_off(Self::HALF);
        let moved = upper.len();
        self.node_mut(split).fill(upper);
        trace!(node = ?key, split = ?split, moved, "node split");

        self.len += 1;
        if offset < Self::HALF {
            self.node_mut(key).insert_at(offset, value);
            Ok(Position::new(key, offset))
        } else {
            let offset = offset - Self::HALF;
            self.node_mut(split).insert_at(offset, value);
            Ok(Position::new(split, offset))
        }
    }

    fn push_back_in<A>(&mut self, value: T) -> Result<Position<K>, (T, A::Error)>
    where
        A: Allocate<Node<T, N, K>, S>,
    {
        let mut tail = self.tail;
        if tail.is_none() || self.node(tail).is_full() {
            tail = match self.create_node::<A>(tail, K::NONE) {
                Ok(key) => key,
                Err(error) => return Err((value, error)),
            };
        }

        let node = self.node_mut(tail);
        node.append(value);
        let offset = node.len() - 1;
        self.len += 1;
        Ok(Position::new(tail, offset))
    }

    fn push_front_in<A>(&mut self, value: T) -> Result<Position<K>, (T, A::Error)>
    where
        A: Allocate<Node<T, N, K>, S>,
    {
        let mut head = self.head;
        if head.is_none() || self.node(head).is_full() {
            head = match self.create_node::<A>(K::NONE, head) {
                Ok(key) => key,
                Err(error) => return Err((value, error)),
            };
        }

        self.node_mut(head).insert_at(0, value);
        self.len += 1;
        Ok(Position::new(head, 0))
    }

    /// Inserts every value before a validated position, in order, and
    /// returns the position of the first one (or `pos` if none).
    ///
    /// On allocation failure the values inserted so far are erased again.
    fn insert_iter<A, I>(
        &mut self,
        pos: Position<K>,
        values: I,
    ) -> Result<Position<K>, (T, A::Error)>
    where
        A: Allocate<Node<T, N, K>, S>,
        I: IntoIterator<Item = T>,
    {
        // `at` always names the element the range is inserted before
        let mut at = pos;
        let mut count = 0usize;

        for value in values {
            match self.insert_validated::<A>(at, value) {
                Ok(inserted) => {
                    at = self.advance(inserted);
                    count += 1;
                }
                Err((value, error)) => {
                    for _ in 0..count {
                        if let Some(prev) = self.retreat(at) {
                            at = self.erase_validated(prev).1;
                        }
                    }
                    return Err((value, error));
                }
            }
        }

        // Splits may have moved earlier insertions; walk back to the first
        let mut first = at;
        for _ in 0..count {
            if let Some(prev) = self.retreat(first) {
                first = prev;
            }
        }
        Ok(first)
    }

    /// Appends values into storage known to have room for them.
    fn append_reserved<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            if self.push_back_in::<Fallible>(value).is_err() {
                panic!("node storage refused an allocation within its free capacity");
            }
        }
    }

    // ========================================================================
    // Fallible insertion - any storage
    // ========================================================================

    /// Appends a value, returning its position.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if a new tail node was needed and the
    /// storage is full. The list is unchanged.
    #[inline]
    pub fn try_push_back(&mut self, value: T) -> Result<Position<K>, Full<T>> {
        self.push_back_in::<Fallible>(value)
            .map_err(|(value, _)| Full(value))
    }

    /// Prepends a value, returning its position.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if a new head node was needed and the
    /// storage is full. The list is unchanged.
    #[inline]
    pub fn try_push_front(&mut self, value: T) -> Result<Position<K>, Full<T>> {
        self.push_front_in::<Fallible>(value)
            .map_err(|(value, _)| Full(value))
    }

    /// Inserts `value` before `pos`, returning the inserted element's
    /// position.
    ///
    /// # Errors
    ///
    /// [`InsertError::InvalidPosition`] if `pos` fails [`check`](Self::check),
    /// [`InsertError::Full`] if a split needed a node and the storage is
    /// full. Either way the list is unchanged and the value is handed back.
    pub fn try_insert(
        &mut self,
        pos: Position<K>,
        value: T,
    ) -> Result<Position<K>, InsertError<T>> {
        if let Err(error) = self.check(pos) {
            return Err(InsertError::InvalidPosition { value, error });
        }
        self.insert_validated::<Fallible>(pos, value)
            .map_err(|(value, _)| InsertError::Full(value))
    }

    /// Builds a value with `make` and inserts it before `pos`.
    ///
    /// `make` runs before the list is touched, so a panic inside it leaves
    /// the list unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`try_insert`](Self::try_insert).
    pub fn try_emplace<F>(
        &mut self,
        pos: Position<K>,
        make: F,
    ) -> Result<Position<K>, InsertError<T>>
    where
        F: FnOnce() -> T,
    {
        let value = make();
        self.try_insert(pos, value)
    }

    /// Inserts `count` clones of `value` before `pos`, returning the
    /// position of the first (or `pos` if `count` is 0).
    ///
    /// # Errors
    ///
    /// Same as [`try_insert`](Self::try_insert); on `Full` the clones
    /// inserted so far are removed again.
    pub fn try_insert_n(
        &mut self,
        pos: Position<K>,
        count: usize,
        value: T,
    ) -> Result<Position<K>, InsertError<T>>
    where
        T: Clone,
    {
        if let Err(error) = self.check(pos) {
            return Err(InsertError::InvalidPosition { value, error });
        }
        self.insert_iter::<Fallible, _>(pos, iter::repeat_n(value, count))
            .map_err(|(value, _)| InsertError::Full(value))
    }

    /// Inserts `values` before `pos` in order, returning the position of
    /// the first inserted element (or `pos` if `values` is empty).
    ///
    /// # Errors
    ///
    /// [`RangeError::InvalidPosition`] before anything is consumed, or
    /// [`RangeError::Full`] with the rejected element after the elements
    /// inserted so far have been removed again.
    pub fn try_insert_range<I>(
        &mut self,
        pos: Position<K>,
        values: I,
    ) -> Result<Position<K>, RangeError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        self.check(pos)?;
        self.insert_iter::<Fallible, _>(pos, values)
            .map_err(|(value, _)| RangeError::Full(value))
    }

    /// Appends `values` in order.
    ///
    /// # Errors
    ///
    /// Returns the rejected element; the elements appended so far are
    /// removed again.
    pub fn try_append_range<I>(&mut self, values: I) -> Result<(), Full<T>>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_iter::<Fallible, _>(Position::end(), values)
            .map(|_| ())
            .map_err(|(value, _)| Full(value))
    }

    /// Resizes to `new_len`, appending clones of `value` or truncating.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` with the list unchanged if the storage
    /// cannot hold the new elements.
    pub fn try_resize(&mut self, new_len: usize, value: T) -> Result<(), Full<T>>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        let extra = new_len - self.len;
        self.try_append_range(iter::repeat_n(value, extra))
    }

    // ========================================================================
    // Erase
    // ========================================================================

    /// Removes the element at a validated, non-end position and returns it
    /// with the position of the element that followed it.
    pub(crate) fn erase_validated(&mut self, pos: Position<K>) -> (T, Position<K>) {
        let (key, offset) = (pos.node(), pos.offset());
        let node = self.node_mut(key);
        let value = node.erase_at(offset);
        let used = node.len();
        let next = node.next;
        self.len -= 1;

        if used == 0 {
            self.destroy_node(key);
            (value, Position::new(next, 0))
        } else if offset < used {
            (value, pos)
        } else {
            (value, Position::new(next, 0))
        }
    }

    /// Removes the element at `pos`, returning the position of the element
    /// that followed it.
    ///
    /// # Errors
    ///
    /// [`PositionError::PastTheEnd`] for the end position, or the validation
    /// error if `pos` is invalid. The list is unchanged on error.
    pub fn erase(&mut self, pos: Position<K>) -> Result<Position<K>, PositionError> {
        self.check(pos)?;
        if pos.is_end() {
            return Err(PositionError::PastTheEnd);
        }
        Ok(self.erase_validated(pos).1)
    }

    /// Removes the elements in `[first, last)`, returning the position of
    /// the element `last` designated.
    ///
    /// # Errors
    ///
    /// [`PositionError::InvalidRange`] if `last` does not follow `first`,
    /// or the validation error of either bound. The list is unchanged on
    /// error.
    pub fn erase_range(
        &mut self,
        first: Position<K>,
        last: Position<K>,
    ) -> Result<Position<K>, PositionError> {
        self.check(first)?;
        self.check(last)?;

        // Count whole nodes at a time; erasing shifts `last` within its node
        let mut count = 0usize;
        let mut at = first;
        while at != last {
            if at.is_end() {
                return Err(PositionError::InvalidRange);
            }
            let node = self.node(at.node());
            if at.node() == last.node() && at.offset() <= last.offset() {
                count += last.offset() - at.offset();
                break;
            }
            count += node.len() - at.offset();
            at = Position::new(node.next, 0);
        }

        let mut at = first;
        for _ in 0..count {
            at = self.erase_validated(at).1;
        }
        Ok(at)
    }

    /// Removes and returns the element at `index`. O(n / N).
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let pos = self.position_at(index)?;
        if pos.is_end() {
            return None;
        }
        Some(self.erase_validated(pos).0)
    }

    /// Removes the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail.into_option()?;
        let node = self.node_mut(tail);
        let value = node.pop_back()?;
        let emptied = node.is_empty();
        self.len -= 1;
        if emptied {
            self.destroy_node(tail);
        }
        Some(value)
    }

    /// Removes the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head.into_option()?;
        let node = self.node_mut(head);
        let value = node.pop_front()?;
        let emptied = node.is_empty();
        self.len -= 1;
        if emptied {
            self.destroy_node(head);
        }
        Some(value)
    }

    /// Shortens the list to `len` elements, dropping whole tail nodes where
    /// possible. No effect if already shorter.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            let tail = self.tail;
            let used = self.node(tail).len();
            if self.len - used >= len {
                self.len -= used;
                self.destroy_node(tail);
            } else {
                self.pop_back();
            }
        }
    }

    /// Removes every element and returns every node to the storage.
    pub fn clear(&mut self) {
        while self.head.is_some() {
            self.destroy_node(self.head);
        }
        self.len = 0;
    }

    // ========================================================================
    // Whole-list operations
    // ========================================================================

    /// Exchanges the contents and storages of two lists. O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Move assignment: replaces the contents with `other`'s.
    ///
    /// If the storage's [`PROPAGATION`](Storage::PROPAGATION) policy allows
    /// it on move, `other` is adopted wholesale (O(1)). Otherwise the
    /// elements are moved one by one into this list's own storage.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(other))`, with both lists untouched, if this list's
    /// storage cannot hold `other`'s elements.
    pub fn assign_from(&mut self, other: Self) -> Result<(), Full<Self>> {
        if S::PROPAGATION.on_move() {
            *self = other;
            return Ok(());
        }

        if other.len.div_ceil(N) > self.free_nodes(true) {
            return Err(Full(other));
        }
        self.clear();
        self.append_reserved(other);
        Ok(())
    }

    /// Copy assignment that reports exhaustion instead of panicking.
    ///
    /// The storage is replaced by `source.storage().clone_empty()` when the
    /// policy propagates on clone; otherwise the existing storage is reused.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(()))`, with this list untouched, if the kept
    /// storage cannot hold `source`'s elements.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), Full<()>>
    where
        T: Clone,
    {
        if S::PROPAGATION.on_clone() {
            self.clear();
            self.storage = source.storage.clone_empty();
        } else {
            if source.len.div_ceil(N) > self.free_nodes(true) {
                return Err(Full(()));
            }
            self.clear();
        }
        self.append_reserved(source.iter().cloned());
        Ok(())
    }

    /// Moves every element into a list over `storage`. O(n).
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(self))` untouched if `storage` cannot hold the
    /// elements.
    pub fn relocate<K2, S2>(self, storage: S2) -> Result<UnrolledList<T, N, K2, S2>, Full<Self>>
    where
        K2: Index,
        S2: Storage<Node<T, N, K2>, Index = K2>,
    {
        let mut target = UnrolledList::with_storage(storage);
        if self.len.div_ceil(N) > target.free_nodes(false) {
            return Err(Full(self));
        }
        target.append_reserved(self);
        Ok(target)
    }

    // ========================================================================
    // Iteration and cursors
    // ========================================================================

    /// Iterates over the elements front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, N, K, S> {
        Iter::new(self.chunks(), self.len)
    }

    /// Iterates over mutable references, front to back.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, N, K, S> {
        let len = self.len;
        IterMut::new(self.chunks_mut(), len)
    }

    /// Iterates over each node's elements as a slice.
    #[inline]
    pub fn chunks(&self) -> Chunks<'_, T, N, K, S> {
        Chunks::new(&self.storage, self.head, self.tail, self.node_count)
    }

    /// Iterates over each node's elements as a mutable slice.
    #[inline]
    pub fn chunks_mut(&mut self) -> ChunksMut<'_, T, N, K, S> {
        let (head, tail, nodes) = (self.head, self.tail, self.node_count);
        ChunksMut::new(&mut self.storage, head, tail, nodes)
    }

    /// Removes every element, yielding them front to back. Elements not
    /// consumed are dropped with the iterator.
    #[inline]
    pub fn drain(&mut self) -> Drain<'_, T, N, K, S> {
        Drain::new(self)
    }

    /// Read-only cursor at the first element.
    #[inline]
    pub fn cursor_front(&self) -> Cursor<'_, T, N, K, S> {
        Cursor::new(self, self.begin())
    }

    /// Read-only cursor at the last element.
    #[inline]
    pub fn cursor_back(&self) -> Cursor<'_, T, N, K, S> {
        Cursor::new(self, self.last_position().unwrap_or_default())
    }

    /// Read-only cursor at `pos`.
    pub fn cursor_at(&self, pos: Position<K>) -> Result<Cursor<'_, T, N, K, S>, PositionError> {
        self.check(pos)?;
        Ok(Cursor::new(self, pos))
    }

    /// Mutable cursor at the first element.
    #[inline]
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, N, K, S> {
        let begin = self.begin();
        CursorMut::new(self, begin)
    }

    /// Mutable cursor at the last element.
    #[inline]
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, N, K, S> {
        let last = self.last_position().unwrap_or_default();
        CursorMut::new(self, last)
    }

    /// Mutable cursor at `pos`.
    pub fn cursor_at_mut(
        &mut self,
        pos: Position<K>,
    ) -> Result<CursorMut<'_, T, N, K, S>, PositionError> {
        self.check(pos)?;
        Ok(CursorMut::new(self, pos))
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut key = self.head;
        let mut prev = K::NONE;
        let mut nodes = 0;
        let mut total = 0;

        while key.is_some() {
            let node = self.node(key);
            assert_eq!(node.prev, prev, "broken prev link");
            assert!(!node.is_empty(), "empty node in chain");
            total += node.len();
            nodes += 1;
            prev = key;
            key = node.next;
        }

        assert_eq!(self.tail, prev, "tail mismatch");
        assert_eq!(nodes, self.node_count, "node count mismatch");
        assert_eq!(total, self.len, "len mismatch");
        assert_eq!(self.head.is_none(), self.len == 0);
    }
}

// =============================================================================
// Unbounded storage impl - infallible insertion
// =============================================================================

#[inline]
fn grown<R, T>(result: Result<R, (T, Infallible)>) -> R {
    match result {
        Ok(value) => value,
        Err((_, never)) => match never {},
    }
}

impl<T, const N: usize, K: Index, S> UnrolledList<T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K>,
{
    /// Appends a value, returning its position.
    #[inline]
    pub fn push_back(&mut self, value: T) -> Position<K> {
        grown(self.push_back_in::<Growing>(value))
    }

    /// Prepends a value, returning its position.
    #[inline]
    pub fn push_front(&mut self, value: T) -> Position<K> {
        grown(self.push_front_in::<Growing>(value))
    }

    /// Appends the value built by `make` and returns a reference to it.
    #[inline]
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        let pos = self.push_back(make());
        &mut self.node_mut(pos.node()).as_mut_slice()[pos.offset()]
    }

    /// Prepends the value built by `make` and returns a reference to it.
    #[inline]
    pub fn emplace_front<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        let pos = self.push_front(make());
        &mut self.node_mut(pos.node()).as_mut_slice()[pos.offset()]
    }

    /// Inserts `value` before `pos`, returning the inserted element's
    /// position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` fails [`check`](Self::check). Use
    /// [`try_insert`](Self::try_insert) to get the error instead.
    pub fn insert(&mut self, pos: Position<K>, value: T) -> Position<K> {
        if let Err(error) = self.check(pos) {
            panic!("invalid insert position: {error}");
        }
        grown(self.insert_validated::<Growing>(pos, value))
    }

    /// Builds a value with `make` and inserts it before `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is invalid; `make` is not called in that case.
    pub fn emplace<F: FnOnce() -> T>(&mut self, pos: Position<K>, make: F) -> Position<K> {
        if let Err(error) = self.check(pos) {
            panic!("invalid insert position: {error}");
        }
        grown(self.insert_validated::<Growing>(pos, make()))
    }

    /// Inserts `count` clones of `value` before `pos`, returning the
    /// position of the first (or `pos` if `count` is 0).
    ///
    /// # Panics
    ///
    /// Panics if `pos` is invalid.
    pub fn insert_n(&mut self, pos: Position<K>, count: usize, value: T) -> Position<K>
    where
        T: Clone,
    {
        self.insert_range(pos, iter::repeat_n(value, count))
    }

    /// Inserts `values` before `pos` in order, returning the position of
    /// the first inserted element (or `pos` if `values` is empty).
    ///
    /// # Panics
    ///
    /// Panics if `pos` is invalid.
    pub fn insert_range<I: IntoIterator<Item = T>>(
        &mut self,
        pos: Position<K>,
        values: I,
    ) -> Position<K> {
        if let Err(error) = self.check(pos) {
            panic!("invalid insert position: {error}");
        }
        grown(self.insert_iter::<Growing, _>(pos, values))
    }

    /// Appends `values` in order.
    #[inline]
    pub fn append_range<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.push_back(value);
        }
    }

    /// Inserts `values` at the front, keeping their order.
    pub fn prepend_range<I: IntoIterator<Item = T>>(&mut self, values: I) {
        let begin = self.begin();
        grown(self.insert_iter::<Growing, _>(begin, values));
    }

    /// Replaces the contents with `count` clones of `value`.
    pub fn assign(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        self.clear();
        self.append_range(iter::repeat_n(value, count));
    }

    /// Replaces the contents with `values`.
    pub fn assign_range<I: IntoIterator<Item = T>>(&mut self, values: I) {
        self.clear();
        self.append_range(values);
    }

    /// Resizes to `new_len`, appending clones of `value` or truncating.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
        } else {
            let extra = new_len - self.len;
            self.append_range(iter::repeat_n(value, extra));
        }
    }

    /// Resizes to `new_len`, appending values from `make` or truncating.
    ///
    /// `list.resize_with(n, Default::default)` is the fill-less resize.
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut make: F) {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        for _ in self.len..new_len {
            self.push_back(make());
        }
    }
}

impl<T: Clone, const N: usize, K: Index, S> UnrolledList<T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K> + Default,
{
    /// Creates a list holding `count` clones of `value`.
    pub fn from_elem(value: T, count: usize) -> Self {
        let mut list = Self::new();
        list.append_range(iter::repeat_n(value, count));
        list
    }
}

// =============================================================================
// Trait impls
// =============================================================================

impl<T: Clone, const N: usize, K: Index, S> Clone for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    /// Clones into `self.storage().clone_empty()`, packing nodes densely.
    fn clone(&self) -> Self {
        let mut out = Self::with_storage(self.storage.clone_empty());
        out.append_reserved(self.iter().cloned());
        out
    }

    /// # Panics
    ///
    /// Panics if the storage is kept and too small; see
    /// [`try_clone_from`](UnrolledList::try_clone_from).
    fn clone_from(&mut self, source: &Self) {
        if self.try_clone_from(source).is_err() {
            panic!("node storage too small for clone_from");
        }
    }
}

impl<T, U, const N: usize, K1, S1, K2, S2> PartialEq<UnrolledList<U, N, K2, S2>>
    for UnrolledList<T, N, K1, S1>
where
    T: PartialEq<U>,
    K1: Index,
    K2: Index,
    S1: Storage<Node<T, N, K1>, Index = K1>,
    S2: Storage<Node<U, N, K2>, Index = K2>,
{
    fn eq(&self, other: &UnrolledList<U, N, K2, S2>) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq, const N: usize, K: Index, S> Eq for UnrolledList<T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<T: Hash, const N: usize, K: Index, S> Hash for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T: fmt::Debug, const N: usize, K: Index, S> fmt::Debug for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, const N: usize, K: Index, S> ops::Index<usize> for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "index out of bounds: the len is {} but the index is {}",
                self.len, index
            ),
        }
    }
}

impl<T, const N: usize, K: Index, S> ops::IndexMut<usize> for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<T, const N: usize, K: Index, S> Extend<T> for UnrolledList<T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        self.append_range(values);
    }
}

impl<'a, T: Copy + 'a, const N: usize, K: Index, S> Extend<&'a T> for UnrolledList<T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K>,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, values: I) {
        self.append_range(values.into_iter().copied());
    }
}

impl<T, const N: usize, K: Index, S> FromIterator<T> for UnrolledList<T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(values: I) -> Self {
        let mut list = Self::new();
        list.append_range(values);
        list
    }
}

impl<T, const N: usize, const M: usize, K: Index, S> From<[T; M]> for UnrolledList<T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K> + Default,
{
    fn from(values: [T; M]) -> Self {
        values.into_iter().collect()
    }
}

impl<T, const N: usize, K: Index, S> IntoIterator for UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = T;
    type IntoIter = IntoIter<T, N, K, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, const N: usize, K: Index, S> IntoIterator for &'a UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, N, K, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const N: usize, K: Index, S> IntoIterator for &'a mut UnrolledList<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, N, K, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
