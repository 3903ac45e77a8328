//! Borrowing cursors.
//!
//! A cursor is a [`Position`] paired with a borrow of its list, so it can
//! never go stale. The past-the-end position acts as a "ghost" element
//! between the back and the front: moving forward from it wraps to the
//! front, moving backward wraps to the back.

use crate::storage::Fallible;
use crate::{Full, Index, Node, Position, Storage, UnboundedStorage, UnrolledList};

/// Read-only cursor.
pub struct Cursor<'a, T, const N: usize, K: Index, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    list: &'a UnrolledList<T, N, K, S>,
    pos: Position<K>,
}

impl<T, const N: usize, K: Index, S> Clone for Cursor<'_, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            pos: self.pos,
        }
    }
}

impl<'a, T, const N: usize, K: Index, S> Cursor<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    pub(crate) fn new(list: &'a UnrolledList<T, N, K, S>, pos: Position<K>) -> Self {
        Self { list, pos }
    }

    /// The cursor's position.
    #[inline]
    pub fn position(&self) -> Position<K> {
        self.pos
    }

    /// Returns `true` if the cursor is on the past-the-end ghost.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos.is_end()
    }

    /// Returns the current element, or `None` on the ghost.
    #[inline]
    pub fn current(&self) -> Option<&'a T> {
        self.list.at(self.pos)
    }

    /// Moves to the next element; wraps from the ghost to the front.
    #[inline]
    pub fn move_next(&mut self) {
        self.pos = step_next(self.list, self.pos);
    }

    /// Moves to the previous element; moves from the front onto the ghost
    /// and from the ghost to the back.
    #[inline]
    pub fn move_prev(&mut self) {
        self.pos = step_prev(self.list, self.pos);
    }

    /// Returns the element after the current one.
    #[inline]
    pub fn peek_next(&self) -> Option<&'a T> {
        self.list.at(step_next(self.list, self.pos))
    }

    /// Returns the element before the current one.
    #[inline]
    pub fn peek_prev(&self) -> Option<&'a T> {
        self.list.at(step_prev(self.list, self.pos))
    }
}

#[inline]
fn step_next<T, const N: usize, K: Index, S>(
    list: &UnrolledList<T, N, K, S>,
    pos: Position<K>,
) -> Position<K>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    if pos.is_end() {
        list.begin()
    } else {
        list.advance(pos)
    }
}

#[inline]
fn step_prev<T, const N: usize, K: Index, S>(
    list: &UnrolledList<T, N, K, S>,
    pos: Position<K>,
) -> Position<K>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    list.retreat(pos).unwrap_or_default()
}

/// Mutable cursor with insertion and removal.
///
/// # Example
///
/// ```
/// use nexus_unrolled::UnrolledList;
///
/// let mut list: UnrolledList<u32, 4> = (1..=8).collect();
///
/// // Drop odd values, double even ones
/// let mut cursor = list.cursor_front_mut();
/// while let Some(value) = cursor.current_mut() {
///     if *value % 2 == 1 {
///         cursor.remove_current();
///     } else {
///         *value *= 2;
///         cursor.move_next();
///     }
/// }
///
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [4, 8, 12, 16]);
/// ```
pub struct CursorMut<'a, T, const N: usize, K: Index, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    list: &'a mut UnrolledList<T, N, K, S>,
    pos: Position<K>,
}

impl<'a, T, const N: usize, K: Index, S> CursorMut<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    pub(crate) fn new(list: &'a mut UnrolledList<T, N, K, S>, pos: Position<K>) -> Self {
        Self { list, pos }
    }

    /// The cursor's position.
    #[inline]
    pub fn position(&self) -> Position<K> {
        self.pos
    }

    /// Returns `true` if the cursor is on the past-the-end ghost.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos.is_end()
    }

    /// Returns the current element.
    #[inline]
    pub fn current(&self) -> Option<&T> {
        self.list.at(self.pos)
    }

    /// Returns the current element mutably.
    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.list.at_mut(self.pos)
    }

    /// See [`Cursor::move_next`].
    #[inline]
    pub fn move_next(&mut self) {
        self.pos = step_next(self.list, self.pos);
    }

    /// See [`Cursor::move_prev`].
    #[inline]
    pub fn move_prev(&mut self) {
        self.pos = step_prev(self.list, self.pos);
    }

    /// Returns the element after the current one.
    #[inline]
    pub fn peek_next(&self) -> Option<&T> {
        self.list.at(step_next(self.list, self.pos))
    }

    /// Returns the element before the current one.
    #[inline]
    pub fn peek_prev(&self) -> Option<&T> {
        self.list.at(step_prev(self.list, self.pos))
    }

    /// Removes the current element and moves to the one that followed it.
    ///
    /// Returns `None` on the ghost.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.pos.is_end() {
            return None;
        }
        let (value, next) = self.list.erase_validated(self.pos);
        self.pos = next;
        Some(value)
    }

    /// Inserts `value` before the current element; the cursor stays on the
    /// current element. On the ghost this appends.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` with the list unchanged if a split needed
    /// a node and the storage is full.
    pub fn try_insert(&mut self, value: T) -> Result<(), Full<T>> {
        let inserted = self
            .list
            .insert_validated::<Fallible>(self.pos, value)
            .map_err(|(value, _)| Full(value))?;
        self.pos = self.list.advance(inserted);
        Ok(())
    }

    /// Read-only view at the same position.
    #[inline]
    pub fn as_cursor(&self) -> Cursor<'_, T, N, K, S> {
        Cursor::new(self.list, self.pos)
    }
}

impl<T, const N: usize, K: Index, S> CursorMut<'_, T, N, K, S>
where
    S: UnboundedStorage<Node<T, N, K>, Index = K>,
{
    /// Inserts `value` before the current element; the cursor stays on the
    /// current element.
    pub fn insert(&mut self, value: T) {
        let inserted = self.list.insert(self.pos, value);
        self.pos = self.list.advance(inserted);
    }

    /// Builds a value with `make` and inserts it before the current element.
    pub fn emplace<F: FnOnce() -> T>(&mut self, make: F) {
        self.insert(make());
    }
}

impl<'a, T, const N: usize, K: Index, S> From<CursorMut<'a, T, N, K, S>> for Cursor<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn from(cursor: CursorMut<'a, T, N, K, S>) -> Self {
        Cursor::new(cursor.list, cursor.pos)
    }
}
