//! Entry slots and the links threading them into chains.

use std::fmt::{self, Debug};

/// [`Link`] is a logical index into the entry store, or nothing.
#[derive(Clone, Copy, Eq, PartialEq)]
pub(crate) struct Link(u32);

/// [`Slot`] is a single entry of the entry store.
///
/// A live slot has a non-negative `hash` and is reachable from exactly one bucket chain; a free
/// slot has [`Slot::FREE`] as its `hash`, holds no data, and is reachable only from the free list
/// or not at all if it has never been used.
#[derive(Clone, Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) hash: i32,
    pub(crate) next: Link,
    pub(crate) data: Option<(K, V)>,
}

impl Link {
    /// The link that points nowhere.
    pub(crate) const NONE: Link = Link(u32::MAX);

    /// Creates a [`Link`] pointing to `index`.
    #[allow(clippy::cast_possible_truncation)] // Bounded by `MAX_PRIME`.
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        Link(index as u32)
    }

    /// Returns the index the [`Link`] points to.
    #[inline]
    pub(crate) const fn get(self) -> Option<usize> {
        if self.0 == u32::MAX {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(index) => write!(f, "Link({index})"),
            None => f.write_str("Link(None)"),
        }
    }
}

impl Default for Link {
    #[inline]
    fn default() -> Self {
        Self::NONE
    }
}

impl<K, V> Slot<K, V> {
    /// The hash value of a free slot.
    pub(crate) const FREE: i32 = -1;

    /// Returns `true` if the slot holds an entry.
    #[inline]
    pub(crate) const fn is_live(&self) -> bool {
        self.hash >= 0
    }

    /// Turns the slot into a free-list node, returning the entry it held.
    #[inline]
    pub(crate) fn vacate(&mut self, next_free: Link) -> Option<(K, V)> {
        self.hash = Self::FREE;
        self.next = next_free;
        self.data.take()
    }
}

impl<K, V> Default for Slot<K, V> {
    #[inline]
    fn default() -> Self {
        Self {
            hash: Self::FREE,
            next: Link::NONE,
            data: None,
        }
    }
}
