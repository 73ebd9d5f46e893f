use core::fmt;

/// Errors reported by tree construction and cursor operations.
///
/// Duplicate insertions and removals of absent keys are *not* errors; those
/// are reported through `bool` returns on
/// [`insert`](crate::MwayTreeSet::insert) and
/// [`remove`](crate::MwayTreeSet::remove).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The requested B-tree order is below the minimum of 3.
    InvalidOrder {
        /// The rejected order.
        order: usize,
    },
    /// A cursor was stepped after the tree was mutated behind its back.
    ConcurrentModification,
    /// [`Cursor::remove`](crate::Cursor::remove) was called before any
    /// advance, or twice without an intervening advance.
    InvalidCursorState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrder { order } => {
                write!(f, "invalid B-tree order {order}, must be at least 3")
            }
            Self::ConcurrentModification => {
                write!(f, "tree was modified while a cursor was outstanding")
            }
            Self::InvalidCursorState => {
                write!(f, "cursor remove requires a preceding advance")
            }
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_names_the_order() {
        let err = Error::InvalidOrder { order: 2 };
        assert_eq!(err.to_string(), "invalid B-tree order 2, must be at least 3");
    }
}
