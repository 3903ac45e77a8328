//! Iterators over an [`UnrolledList`](crate::UnrolledList).
//!
//! Element iterators are flattened node iterators: [`Chunks`] walks the
//! chain yielding each node's slice, and [`Iter`] flattens it. Both ends
//! advance independently and stop when they meet, so every iterator here is
//! double-ended.

use core::fmt;
use core::iter::{Flatten, FusedIterator};
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::{Index, Node, Storage, UnrolledList};

// =============================================================================
// Chunks
// =============================================================================

/// Iterator over each node's elements as a slice, front to back.
///
/// Every yielded slice is non-empty.
pub struct Chunks<'a, T, const N: usize, K, S> {
    storage: &'a S,
    front: K,
    back: K,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T, const N: usize, K, S> Chunks<'a, T, N, K, S> {
    #[inline]
    pub(crate) fn new(storage: &'a S, front: K, back: K, nodes: usize) -> Self {
        Self {
            storage,
            front,
            back,
            remaining: nodes,
            _marker: PhantomData,
        }
    }
}

impl<T, const N: usize, K: Copy, S> Clone for Chunks<'_, T, N, K, S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> Iterator for Chunks<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = &'a [T];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let storage: &'a S = self.storage;
        let node = storage.get(self.front)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(node.as_slice())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> DoubleEndedIterator for Chunks<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let storage: &'a S = self.storage;
        let node = storage.get(self.back)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(node.as_slice())
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> ExactSizeIterator for Chunks<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<'a, T: 'a, const N: usize, K: Index, S> FusedIterator for Chunks<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

// =============================================================================
// ChunksMut
// =============================================================================

/// Iterator over each node's elements as a mutable slice.
pub struct ChunksMut<'a, T, const N: usize, K, S> {
    storage: NonNull<S>,
    front: K,
    back: K,
    remaining: usize,
    _marker: PhantomData<(&'a mut S, &'a mut T)>,
}

// Safety: ChunksMut behaves like `&'a mut S`
unsafe impl<T: Send, const N: usize, K: Send, S: Send> Send for ChunksMut<'_, T, N, K, S> {}
unsafe impl<T: Sync, const N: usize, K: Sync, S: Sync> Sync for ChunksMut<'_, T, N, K, S> {}

impl<'a, T, const N: usize, K, S> ChunksMut<'a, T, N, K, S> {
    #[inline]
    pub(crate) fn new(storage: &'a mut S, front: K, back: K, nodes: usize) -> Self {
        Self {
            storage: NonNull::from(storage),
            front,
            back,
            remaining: nodes,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> Iterator for ChunksMut<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = &'a mut [T];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // Safety: the storage is exclusively borrowed for 'a and never
        // restructured while this iterator lives. Front and back together
        // visit `remaining` distinct nodes, so no node is yielded twice.
        let storage = unsafe { &mut *self.storage.as_ptr() };
        let node = storage.get_mut(self.front)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(node.as_mut_slice())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> DoubleEndedIterator for ChunksMut<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // Safety: see `next`
        let storage = unsafe { &mut *self.storage.as_ptr() };
        let node = storage.get_mut(self.back)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(node.as_mut_slice())
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> ExactSizeIterator for ChunksMut<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<'a, T: 'a, const N: usize, K: Index, S> FusedIterator for ChunksMut<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

// =============================================================================
// Iter / IterMut
// =============================================================================

/// Iterator over references to list elements.
pub struct Iter<'a, T: 'a, const N: usize, K: Index, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    inner: Flatten<Chunks<'a, T, N, K, S>>,
    len: usize,
}

impl<'a, T: 'a, const N: usize, K: Index, S> Iter<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    pub(crate) fn new(chunks: Chunks<'a, T, N, K, S>, len: usize) -> Self {
        Self {
            inner: chunks.flatten(),
            len,
        }
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> Clone for Iter<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            len: self.len,
        }
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> Iterator for Iter<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.len -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> DoubleEndedIterator for Iter<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        self.len -= 1;
        Some(item)
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> ExactSizeIterator for Iter<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<'a, T: 'a, const N: usize, K: Index, S> FusedIterator for Iter<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<'a, T: fmt::Debug + 'a, const N: usize, K: Index, S> fmt::Debug for Iter<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Iterator over mutable references to list elements.
pub struct IterMut<'a, T: 'a, const N: usize, K: Index, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    inner: Flatten<ChunksMut<'a, T, N, K, S>>,
    len: usize,
}

impl<'a, T: 'a, const N: usize, K: Index, S> IterMut<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    pub(crate) fn new(chunks: ChunksMut<'a, T, N, K, S>, len: usize) -> Self {
        Self {
            inner: chunks.flatten(),
            len,
        }
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> Iterator for IterMut<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.len -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> DoubleEndedIterator for IterMut<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        self.len -= 1;
        Some(item)
    }
}

impl<'a, T: 'a, const N: usize, K: Index, S> ExactSizeIterator for IterMut<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<'a, T: 'a, const N: usize, K: Index, S> FusedIterator for IterMut<'a, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

// =============================================================================
// IntoIter / Drain
// =============================================================================

/// Owning iterator over list elements.
pub struct IntoIter<T, const N: usize, K: Index, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    list: UnrolledList<T, N, K, S>,
}

impl<T, const N: usize, K: Index, S> IntoIter<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    pub(crate) fn new(list: UnrolledList<T, N, K, S>) -> Self {
        Self { list }
    }
}

impl<T, const N: usize, K: Index, S> Iterator for IntoIter<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.list.len();
        (len, Some(len))
    }
}

impl<T, const N: usize, K: Index, S> DoubleEndedIterator for IntoIter<T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, const N: usize, K: Index, S> ExactSizeIterator for IntoIter<T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<T, const N: usize, K: Index, S> FusedIterator for IntoIter<T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

/// Draining iterator. Removes all elements; those not yielded are dropped
/// when the iterator is.
pub struct Drain<'a, T, const N: usize, K: Index, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    list: &'a mut UnrolledList<T, N, K, S>,
}

impl<'a, T, const N: usize, K: Index, S> Drain<'a, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    pub(crate) fn new(list: &'a mut UnrolledList<T, N, K, S>) -> Self {
        Self { list }
    }
}

impl<T, const N: usize, K: Index, S> Iterator for Drain<'_, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.list.len();
        (len, Some(len))
    }
}

impl<T, const N: usize, K: Index, S> DoubleEndedIterator for Drain<'_, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, const N: usize, K: Index, S> ExactSizeIterator for Drain<'_, T, N, K, S> where
    S: Storage<Node<T, N, K>, Index = K>
{
}

impl<T, const N: usize, K: Index, S> Drop for Drain<'_, T, N, K, S>
where
    S: Storage<Node<T, N, K>, Index = K>,
{
    fn drop(&mut self) {
        self.list.clear();
    }
}
