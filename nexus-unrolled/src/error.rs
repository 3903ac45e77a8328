//! Position and insertion errors.

use thiserror::Error;

/// Why a [`Position`](crate::Position) was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The node no longer belongs to the list.
    #[error("position refers to a node that is no longer in the list")]
    StaleNode,

    /// The node is live but holds fewer elements than the offset implies.
    #[error("offset {offset} out of range for node holding {len} elements")]
    OffsetOutOfRange {
        /// Offset carried by the position.
        offset: usize,
        /// Elements in the node.
        len: usize,
    },

    /// Advanced or dereferenced the past-the-end position.
    #[error("position is past the end")]
    PastTheEnd,

    /// Retreated from the first element.
    #[error("cannot move before the first element")]
    BeforeBegin,

    /// The range end does not follow the range start.
    #[error("range end is not reachable from range start")]
    InvalidRange,
}

/// Failed single-element insertion. The value is always handed back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError<T> {
    /// The node storage could not provide a node for a split or a new end.
    #[error("node storage is full")]
    Full(T),

    /// The insertion position was invalid.
    #[error("invalid insert position")]
    InvalidPosition {
        /// The value that was not inserted.
        value: T,
        /// Why the position was rejected.
        #[source]
        error: PositionError,
    },
}

impl<T> InsertError<T> {
    /// Recovers the value that was not inserted.
    pub fn into_inner(self) -> T {
        match self {
            InsertError::Full(value) | InsertError::InvalidPosition { value, .. } => value,
        }
    }
}

/// Failed range insertion.
///
/// On `Full` the elements inserted so far have been removed again and the
/// rejected element is handed back; the rest of the source is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError<T> {
    /// The node storage ran out part-way through.
    #[error("node storage is full")]
    Full(T),

    /// The insertion position was invalid; nothing was consumed.
    #[error(transparent)]
    InvalidPosition(#[from] PositionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            PositionError::OffsetOutOfRange { offset: 4, len: 2 }.to_string(),
            "offset 4 out of range for node holding 2 elements"
        );
        assert_eq!(InsertError::Full(1).to_string(), "node storage is full");
        assert_eq!(
            RangeError::<u8>::from(PositionError::StaleNode).to_string(),
            PositionError::StaleNode.to_string()
        );
    }

    #[test]
    fn into_inner_returns_value() {
        assert_eq!(InsertError::Full("a").into_inner(), "a");
        let err = InsertError::InvalidPosition {
            value: "b",
            error: PositionError::PastTheEnd,
        };
        assert_eq!(err.into_inner(), "b");
    }

    #[test]
    fn source_chain() {
        use std::error::Error as _;

        let err = InsertError::InvalidPosition {
            value: 0u8,
            error: PositionError::StaleNode,
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("position refers to a node that is no longer in the list")
        );
    }
}
