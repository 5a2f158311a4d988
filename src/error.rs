//! Error types for the `segmap` crate.

/// Errors reported by [`HashMap`](crate::HashMap), [`SegmentedVec`](crate::SegmentedVec) and
/// [`JaggedMap`](crate::JaggedMap).
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument was outside of its accepted range.
    ///
    /// Raised for a capacity larger than [`MAX_CAPACITY`](crate::hash_map::MAX_CAPACITY), a copy
    /// destination that cannot hold the entries, or a key path of the wrong depth.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The requested key is not present.
    #[error("the given key was not present in the map")]
    KeyNotFound,

    /// An entry with the same key already exists.
    #[error("an entry with the same key has already been added")]
    DuplicateKey,

    /// The container was structurally modified after the [`Cursor`](crate::Cursor) was
    /// created.
    ///
    /// The enumeration cannot continue; start over with a new cursor.
    #[error("collection was modified; enumeration operation may not execute")]
    ConcurrentModification,

    /// The element footprint or the segment ceiling cannot describe a usable segment.
    #[error("invalid segment configuration: {0}")]
    Configuration(&'static str),
}
