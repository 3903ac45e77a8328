//! Unrolled linked list with pluggable node storage.
//!
//! An unrolled list is a doubly-linked chain of small fixed-capacity arrays.
//! It keeps the O(1) insert/erase-at-a-known-position of a linked list while
//! touching far fewer cache lines per element:
//!
//! ```text
//! LinkedList<T>      - one allocation and two links per element
//! Vec<T>             - contiguous, but O(n) insert/erase in the middle
//! UnrolledList<T, N> - N elements per node, O(N) shift on insert/erase
//! ```
//!
//! Nodes are allocated from a [`Storage`] and linked by stable handles, so
//! the chain never holds raw pointers and the allocation strategy is a type
//! parameter.
//!
//! # Quick Start
//!
//! ```
//! use nexus_unrolled::UnrolledList;
//!
//! let mut list: UnrolledList<u64> = UnrolledList::new();
//! list.push_back(1);
//! list.push_back(2);
//! list.push_back(3);
//! list.push_front(0);
//!
//! assert_eq!(list.len(), 4);
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 1, 2, 3]);
//!
//! // Positions are checked on every use
//! let pos = list.position_at(1).unwrap();
//! let pos = list.insert(pos, 10);
//! assert_eq!(list.at(pos), Some(&10));
//! ```
//!
//! # Node Capacity
//!
//! `N` trades shift cost against pointer chasing: inserting or erasing moves
//! up to `N` elements, traversal follows `len / N` links. The default is 10.
//! `N` must be at least 2, checked at compile time, so a split always leaves
//! both halves non-empty.
//!
//! # Storage Options
//!
//! | Storage | Capacity | Stale positions | Use Case |
//! |---------|----------|-----------------|----------|
//! | [`Arena`] | Growable | Detected | Default choice |
//! | [`BoundedArena`] | Fixed node budget | Detected | No growth after startup |
//! | `slab::Slab` | Growable | Partially detected | Feature `slab` |
//!
//! # Storage Traits
//!
//! ```text
//! Storage<T>              - try_insert -> Result, get, remove, len
//!     │
//!     └── UnboundedStorage<T> - growable, insert -> Index (infallible)
//! ```
//!
//! This enables different APIs on the list:
//! - `try_push_back`, `try_insert`, ... for any storage (return `Result`)
//! - `push_back`, `insert`, ... for unbounded storage (infallible)
//!
//! # Logging
//!
//! Node allocation, destruction and splits emit `tracing` events at TRACE
//! level; a refused allocation emits a DEBUG event. The crate installs no
//! subscriber.
//!
//! # Feature Flags
//!
//! - `slab` - Enable [`Storage`] impl for `slab::Slab`

#![warn(missing_docs)]

pub mod cursor;
pub mod error;
pub mod index;
pub mod iter;
pub mod list;
pub mod node;
pub mod position;
pub mod storage;

pub use cursor::{Cursor, CursorMut};
pub use error::{InsertError, PositionError, RangeError};
pub use index::Index;
pub use iter::{Chunks, ChunksMut, Drain, IntoIter, Iter, IterMut};
pub use list::{BoundedList, DEFAULT_NODE_CAPACITY, UnrolledList};
pub use node::Node;
pub use position::Position;
pub use storage::{Arena, BoundedArena, Full, NodeKey, Propagation, Storage, UnboundedStorage};

#[cfg(feature = "slab")]
pub use list::SlabList;
