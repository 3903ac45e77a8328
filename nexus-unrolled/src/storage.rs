//! Node storage: the allocation strategy behind an unrolled list.
//!
//! A list never allocates nodes itself. It asks its storage for a slot,
//! gets back a stable [`Index`], and links nodes by those indices. Swapping
//! the storage type swaps the allocation strategy without touching the
//! list algorithms.
//!
//! # Implementations
//!
//! | Storage | Capacity | Stale handles | Use Case |
//! |---------|----------|---------------|----------|
//! | [`Arena`] | Growable | Detected (generational) | Default choice |
//! | [`BoundedArena`] | Fixed node budget | Detected (generational) | No growth after startup |
//! | `slab::Slab` | Growable | Not detected (slots reused) | Feature `slab` |

use crate::Index;

use core::convert::Infallible;
use core::fmt;

/// Slab-like storage with stable indices.
///
/// # Requirements
///
/// Implementations must provide:
/// - **Stable indices**: an index remains valid until explicitly removed
/// - **O(1)** insert, remove, get operations
/// - **Slot reuse**: removed slots can be reused by future inserts
pub trait Storage<T> {
    /// Index type for this storage.
    type Index: Index;

    /// How a list over this storage treats the storage on `clone_from` and
    /// move assignment.
    const PROPAGATION: Propagation = Propagation::OnMoveOnly;

    /// Inserts a value, returning its stable index.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the storage has no free slot.
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Full<T>>;

    /// Removes and returns the value at `index`, if present.
    fn remove(&mut self, index: Self::Index) -> Option<T>;

    /// Returns a reference to the value at `index`, if present.
    fn get(&self, index: Self::Index) -> Option<&T>;

    /// Returns a mutable reference to the value at `index`, if present.
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T>;

    /// Returns the number of occupied slots.
    fn len(&self) -> usize;

    /// Returns `true` if no slots are occupied.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound on the number of slots this storage can ever hold.
    fn max_len(&self) -> usize;

    /// Returns an empty storage configured like `self`.
    ///
    /// Used when a list is cloned: the clone gets its own storage, never a
    /// share of the source's.
    fn clone_empty(&self) -> Self
    where
        Self: Sized;
}

/// Storage that grows on demand; insertion cannot fail.
///
/// Lists over unbounded storage get the infallible `push_back`/`insert`/...
/// API in addition to the `try_*` forms.
pub trait UnboundedStorage<T>: Storage<T> {
    /// Inserts a value, returning its stable index.
    fn insert(&mut self, value: T) -> Self::Index;
}

/// Storage propagation policy for assignment.
///
/// Mirrors the two independent switches of allocator-aware containers:
/// whether `clone_from` adopts the source's storage configuration, and
/// whether move assignment steals the source's storage wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// Adopt the source's storage on both `clone_from` and move assignment.
    Always,
    /// Keep the destination's own storage; elements are copied or moved in.
    Never,
    /// Steal the source's storage on move assignment only.
    OnMoveOnly,
}

impl Propagation {
    /// Whether `clone_from` replaces the destination's storage.
    #[inline]
    pub const fn on_clone(self) -> bool {
        matches!(self, Self::Always)
    }

    /// Whether move assignment takes the source's storage.
    #[inline]
    pub const fn on_move(self) -> bool {
        matches!(self, Self::Always | Self::OnMoveOnly)
    }
}

/// Error returned when fixed-capacity storage is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Swaps the carried value, keeping the error.
    pub(crate) fn with<U>(self, value: U) -> Full<U> {
        Full(value)
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node storage is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

// =============================================================================
// Arena - growable, generational
// =============================================================================

/// Generation-checked handle into an [`Arena`].
///
/// A handle whose slot has been freed and reused no longer resolves, so a
/// [`Position`](crate::Position) into a destroyed node is reported as stale
/// instead of silently aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    slot: u32,
    generation: u32,
}

impl NodeKey {
    /// Slot index within the arena.
    #[inline]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Generation of the slot when this key was issued.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl Index for NodeKey {
    const NONE: Self = NodeKey {
        slot: u32::MAX,
        generation: 0,
    };

    #[inline]
    fn is_none(self) -> bool {
        self.slot == u32::MAX
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeKey(slot={}, gen={})", self.slot, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Growable storage with generation-checked keys.
///
/// Freed slots go on a LIFO free stack and are reused by the next insert;
/// each reuse bumps the slot's generation so old keys stop resolving.
///
/// # Example
///
/// ```
/// use nexus_unrolled::{Arena, Storage, UnboundedStorage};
///
/// let mut arena: Arena<u64> = Arena::new();
/// let key = arena.insert(42);
/// assert_eq!(arena.get(key), Some(&42));
///
/// arena.remove(key);
/// let reused = arena.insert(7);
/// assert_eq!(arena.get(key), None); // stale
/// assert_eq!(arena.get(reused), Some(&7));
/// ```
#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free_stack: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Slot limit; `u32::MAX` is reserved for [`NodeKey::NONE`].
    const MAX_SLOTS: usize = u32::MAX as usize;

    /// Creates an empty arena.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_stack: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` slots before it
    /// reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_stack: Vec::new(),
            len: 0,
        }
    }

    /// Number of slots allocated without reallocation.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    #[inline]
    fn entry(&self, key: NodeKey) -> Option<&Entry<T>> {
        self.entries
            .get(key.slot as usize)
            .filter(|entry| entry.generation == key.generation)
    }

    #[inline]
    fn entry_mut(&mut self, key: NodeKey) -> Option<&mut Entry<T>> {
        self.entries
            .get_mut(key.slot as usize)
            .filter(|entry| entry.generation == key.generation)
    }
}

impl<T> Storage<T> for Arena<T> {
    type Index = NodeKey;

    fn try_insert(&mut self, value: T) -> Result<NodeKey, Full<T>> {
        if let Some(slot) = self.free_stack.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.value = Some(value);
            self.len += 1;
            return Ok(NodeKey {
                slot,
                generation: entry.generation,
            });
        }

        if self.entries.len() >= Self::MAX_SLOTS {
            return Err(Full(value));
        }

        let slot = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        self.len += 1;
        Ok(NodeKey {
            slot,
            generation: 0,
        })
    }

    fn remove(&mut self, index: NodeKey) -> Option<T> {
        let entry = self.entry_mut(index)?;
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_stack.push(index.slot);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    fn get(&self, index: NodeKey) -> Option<&T> {
        self.entry(index)?.value.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, index: NodeKey) -> Option<&mut T> {
        self.entry_mut(index)?.value.as_mut()
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn max_len(&self) -> usize {
        Self::MAX_SLOTS
    }

    fn clone_empty(&self) -> Self {
        Self::new()
    }
}

impl<T> UnboundedStorage<T> for Arena<T> {
    fn insert(&mut self, value: T) -> NodeKey {
        match self.try_insert(value) {
            Ok(key) => key,
            Err(_) => panic!("arena exhausted its {} slots", Self::MAX_SLOTS),
        }
    }
}

// =============================================================================
// BoundedArena - fixed node budget
// =============================================================================

/// Generational arena with a hard limit on live slots.
///
/// Inserting past the limit fails with [`Full`], which the list surfaces
/// through its `try_*` API. The limit is the owner's configuration, so the
/// arena never propagates on assignment ([`Propagation::Never`]).
///
/// # Example
///
/// ```
/// use nexus_unrolled::{BoundedArena, Storage};
///
/// let mut arena: BoundedArena<u64> = BoundedArena::with_max_nodes(2);
/// arena.try_insert(1).unwrap();
/// arena.try_insert(2).unwrap();
/// assert_eq!(arena.try_insert(3).unwrap_err().into_inner(), 3);
/// ```
#[derive(Debug)]
pub struct BoundedArena<T> {
    arena: Arena<T>,
    max_nodes: usize,
}

impl<T> BoundedArena<T> {
    /// Creates an arena holding at most `max_nodes` live slots.
    ///
    /// All slots are reserved up front.
    ///
    /// # Panics
    ///
    /// Panics if `max_nodes` is 0.
    pub fn with_max_nodes(max_nodes: usize) -> Self {
        assert!(max_nodes > 0, "max_nodes must be > 0");
        Self {
            arena: Arena::with_capacity(max_nodes.min(Arena::<T>::MAX_SLOTS)),
            max_nodes: max_nodes.min(Arena::<T>::MAX_SLOTS),
        }
    }

    /// Maximum number of live slots.
    #[inline]
    pub const fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Returns `true` if every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.arena.len() == self.max_nodes
    }
}

impl<T> Storage<T> for BoundedArena<T> {
    type Index = NodeKey;

    const PROPAGATION: Propagation = Propagation::Never;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<NodeKey, Full<T>> {
        if self.is_full() {
            return Err(Full(value));
        }
        self.arena.try_insert(value)
    }

    #[inline]
    fn remove(&mut self, index: NodeKey) -> Option<T> {
        self.arena.remove(index)
    }

    #[inline]
    fn get(&self, index: NodeKey) -> Option<&T> {
        self.arena.get(index)
    }

    #[inline]
    fn get_mut(&mut self, index: NodeKey) -> Option<&mut T> {
        self.arena.get_mut(index)
    }

    #[inline]
    fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    fn max_len(&self) -> usize {
        self.max_nodes
    }

    fn clone_empty(&self) -> Self {
        Self::with_max_nodes(self.max_nodes)
    }
}

// =============================================================================
// slab::Slab implementation
// =============================================================================

#[cfg(feature = "slab")]
impl<T> Storage<T> for slab::Slab<T> {
    type Index = usize;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Full<T>> {
        Ok(self.insert(value))
    }

    #[inline]
    fn remove(&mut self, index: Self::Index) -> Option<T> {
        self.try_remove(index)
    }

    #[inline]
    fn get(&self, index: Self::Index) -> Option<&T> {
        self.get(index)
    }

    #[inline]
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T> {
        self.get_mut(index)
    }

    #[inline]
    fn len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn max_len(&self) -> usize {
        // usize::MAX is the NONE sentinel
        usize::MAX - 1
    }

    fn clone_empty(&self) -> Self {
        slab::Slab::new()
    }
}

#[cfg(feature = "slab")]
impl<T> UnboundedStorage<T> for slab::Slab<T> {
    #[inline]
    fn insert(&mut self, value: T) -> usize {
        self.insert(value)
    }
}

/// Allocation strategy used by the list's generic insertion paths.
///
/// `Fallible` goes through [`Storage::try_insert`] and reports [`Full`];
/// `Growing` uses [`UnboundedStorage::insert`] and cannot fail.
pub(crate) trait Allocate<T, S: Storage<T>> {
    type Error;

    fn allocate(storage: &mut S, value: T) -> Result<S::Index, Self::Error>;
}

pub(crate) struct Fallible;

impl<T, S: Storage<T>> Allocate<T, S> for Fallible {
    type Error = Full<()>;

    #[inline]
    fn allocate(storage: &mut S, value: T) -> Result<S::Index, Full<()>> {
        storage.try_insert(value).map_err(|full| full.with(()))
    }
}

pub(crate) struct Growing;

impl<T, S: UnboundedStorage<T>> Allocate<T, S> for Growing {
    type Error = Infallible;

    #[inline]
    fn allocate(storage: &mut S, value: T) -> Result<S::Index, Infallible> {
        Ok(storage.insert(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let arena: Arena<u64> = Arena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.max_len(), u32::MAX as usize);
    }

    #[test]
    fn insert_get_remove() {
        let mut arena: Arena<u64> = Arena::new();

        let idx = arena.insert(42);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(idx), Some(&42));

        let removed = arena.remove(idx);
        assert_eq!(removed, Some(42));
        assert_eq!(arena.get(idx), None);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn get_mut() {
        let mut arena: Arena<u64> = Arena::new();

        let idx = arena.insert(10);
        *arena.get_mut(idx).unwrap() = 20;

        assert_eq!(arena.get(idx), Some(&20));
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut arena: Arena<u64> = Arena::new();

        let k0 = arena.insert(0);
        let _k1 = arena.insert(1);

        arena.remove(k0);

        // Next insert reuses k0's slot (LIFO) under a new generation
        let k2 = arena.insert(2);
        assert_eq!(k2.slot(), k0.slot());
        assert_ne!(k2.generation(), k0.generation());
        assert_eq!(arena.get(k0), None);
        assert_eq!(arena.get(k2), Some(&2));
    }

    #[test]
    fn remove_nonexistent() {
        let mut arena: Arena<u64> = Arena::new();

        let idx = arena.insert(42);
        arena.remove(idx);

        // Double remove returns None
        assert_eq!(arena.remove(idx), None);
        assert_eq!(arena.remove(NodeKey::NONE), None);
    }

    #[test]
    fn none_key_never_resolves() {
        let mut arena: Arena<u64> = Arena::new();
        arena.insert(1);
        assert!(NodeKey::NONE.is_none());
        assert_eq!(arena.get(NodeKey::NONE), None);
    }

    #[test]
    fn drop_cleans_up() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        #[derive(Debug)]
        struct DropCounter;
        impl Drop for DropCounter {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);

        {
            let mut arena: Arena<DropCounter> = Arena::new();
            arena.insert(DropCounter);
            let k = arena.insert(DropCounter);
            arena.insert(DropCounter);
            drop(arena.remove(k));
            assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1);
        }

        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn bounded_fill_to_capacity() {
        let mut arena: BoundedArena<u64> = BoundedArena::with_max_nodes(4);

        let k0 = arena.try_insert(0).unwrap();
        let k1 = arena.try_insert(1).unwrap();
        let k2 = arena.try_insert(2).unwrap();
        let k3 = arena.try_insert(3).unwrap();

        assert!(arena.is_full());

        let err = arena.try_insert(4);
        assert!(err.is_err());
        assert_eq!(err.unwrap_err().into_inner(), 4);

        assert_eq!(arena.get(k0), Some(&0));
        assert_eq!(arena.get(k1), Some(&1));
        assert_eq!(arena.get(k2), Some(&2));
        assert_eq!(arena.get(k3), Some(&3));

        arena.remove(k1);
        assert!(!arena.is_full());
        assert!(arena.try_insert(5).is_ok());
    }

    #[test]
    fn bounded_clone_empty_keeps_limit() {
        let mut arena: BoundedArena<u64> = BoundedArena::with_max_nodes(3);
        arena.try_insert(1).unwrap();

        let fresh = arena.clone_empty();
        assert!(fresh.is_empty());
        assert_eq!(fresh.max_nodes(), 3);
    }

    #[test]
    #[should_panic(expected = "max_nodes must be > 0")]
    fn bounded_zero_panics() {
        let _arena: BoundedArena<u64> = BoundedArena::with_max_nodes(0);
    }

    #[test]
    fn propagation_switches() {
        assert!(Propagation::Always.on_clone());
        assert!(Propagation::Always.on_move());
        assert!(!Propagation::Never.on_clone());
        assert!(!Propagation::Never.on_move());
        assert!(!Propagation::OnMoveOnly.on_clone());
        assert!(Propagation::OnMoveOnly.on_move());

        assert_eq!(<Arena<u8> as Storage<u8>>::PROPAGATION, Propagation::OnMoveOnly);
        assert_eq!(<BoundedArena<u8> as Storage<u8>>::PROPAGATION, Propagation::Never);
    }

    #[test]
    fn full_display() {
        assert_eq!(Full(3u8).to_string(), "node storage is full");
    }

    #[cfg(feature = "slab")]
    mod slab_tests {
        use super::*;

        #[test]
        fn insert_get_remove() {
            let mut storage = slab::Slab::new();

            let idx = Storage::try_insert(&mut storage, 42).unwrap();
            assert_eq!(Storage::get(&storage, idx), Some(&42));

            let removed = Storage::remove(&mut storage, idx);
            assert_eq!(removed, Some(42));
            assert_eq!(Storage::get(&storage, idx), None);
        }

        #[test]
        fn slot_reuse() {
            let mut storage = slab::Slab::new();

            let idx1 = UnboundedStorage::insert(&mut storage, 1);
            Storage::remove(&mut storage, idx1);

            let idx2 = UnboundedStorage::insert(&mut storage, 2);
            assert_eq!(idx1, idx2); // Slot reused
        }
    }
}
