//! Sentinel-based handle trait for node links.
//!
//! Node links use a reserved sentinel value (e.g., `usize::MAX`) instead of
//! `Option<K>` so a node stays two handles plus its inline buffer.

use core::fmt::Debug;
use core::hash::Hash;

/// A copyable node handle with a sentinel "none" value.
///
/// Storage backends hand these out when a node is allocated; the list stores
/// them in `prev`/`next` links and in [`Position`](crate::Position)s.
///
/// # Example
///
/// ```
/// use nexus_unrolled::Index;
///
/// let idx: u32 = 5;
/// let none: u32 = u32::NONE;
///
/// assert!(idx.is_some());
/// assert!(none.is_none());
/// ```
pub trait Index: Copy + Eq + Hash + Debug + 'static {
    /// Sentinel value representing "no node".
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts the sentinel to `None`.
    #[inline]
    fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }
}

macro_rules! impl_index_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;
            }
        )*
    };
}

impl_index_for_unsigned!(u8, u16, u32, u64, usize);
