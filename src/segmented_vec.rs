//! [`SegmentedVec`] is a growable array made of bounded-size segments that never move.

use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};
use std::{slice, vec};

use tracing::trace;

use super::config::SegmentConfig;
use super::segment_layout::{Position, SegmentLayout};
use super::Error;

/// [`SegmentedVec`] is an append-only list of segments exposing one logical index space.
///
/// Growing a [`SegmentedVec`] allocates new segments at the end; existing segments are never
/// reallocated, copied, or resized, so the address of every element stays the same for the
/// lifetime of the store, and no single allocation exceeds the configured byte ceiling.
///
/// Every slot below [`len`](Self::len) is initialized; newly allocated slots hold
/// `T::default()`.
///
/// # Examples
///
/// ```
/// use segmap::SegmentedVec;
///
/// let mut store: SegmentedVec<u64> = SegmentedVec::new().unwrap();
/// assert!(store.is_empty());
///
/// store.ensure_capacity(20);
/// assert_eq!(store.len(), 48);
/// assert_eq!(store.num_segments(), 2);
///
/// store[17] = 7;
/// assert_eq!(store.get(17), Some(&7));
/// assert_eq!(store.get(48), None);
/// ```
#[derive(Clone)]
pub struct SegmentedVec<T> {
    segments: Vec<Box<[T]>>,
    len: usize,
    layout: SegmentLayout,
}

/// An iterator over the slots of a [`SegmentedVec`].
#[derive(Debug)]
pub struct Iter<'s, T> {
    segments: slice::Iter<'s, Box<[T]>>,
    current: Option<slice::Iter<'s, T>>,
}

/// A mutable iterator over the slots of a [`SegmentedVec`].
#[derive(Debug)]
pub struct IterMut<'s, T> {
    segments: slice::IterMut<'s, Box<[T]>>,
    current: Option<slice::IterMut<'s, T>>,
}

/// An iterator that moves out of a [`SegmentedVec`].
#[derive(Debug)]
pub struct IntoIter<T> {
    segments: vec::IntoIter<Box<[T]>>,
    current: Option<vec::IntoIter<T>>,
}

impl<T> SegmentedVec<T> {
    /// Creates an empty [`SegmentedVec`] with the given [`SegmentLayout`].
    ///
    /// Nothing is allocated until [`ensure_capacity`](Self::ensure_capacity) is called.
    #[inline]
    #[must_use]
    pub const fn with_layout(layout: SegmentLayout) -> Self {
        Self {
            segments: Vec::new(),
            len: 0,
            layout,
        }
    }

    /// Creates an empty [`SegmentedVec`] with the given [`SegmentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` does not fit the configured ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{Error, SegmentConfig, SegmentedVec};
    ///
    /// let config = SegmentConfig::new().with_ceiling(1024);
    /// let store: SegmentedVec<u32> = SegmentedVec::with_config(&config).unwrap();
    /// assert_eq!(store.layout().max_segment_len(), 255);
    ///
    /// let tiny = SegmentConfig::new().with_ceiling(4);
    /// assert!(matches!(
    ///     SegmentedVec::<u32>::with_config(&tiny),
    ///     Err(Error::Configuration(_))
    /// ));
    /// ```
    #[inline]
    pub fn with_config(config: &SegmentConfig) -> Result<Self, Error> {
        Ok(Self::with_layout(SegmentLayout::of::<T>(config)?))
    }

    /// Creates an empty [`SegmentedVec`] with the default [`SegmentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` is zero-sized or too large for the default
    /// ceiling.
    #[inline]
    pub fn new() -> Result<Self, Error> {
        Self::with_config(&SegmentConfig::default())
    }

    /// Returns the number of allocated slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot has been allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of allocated segments.
    #[inline]
    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns the [`SegmentLayout`] of the [`SegmentedVec`].
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    /// Resolves an allocated logical index into its [`Position`].
    ///
    /// Returns `None` if `index` is not below [`len`](Self::len).
    #[inline]
    #[must_use]
    pub fn resolve(&self, index: usize) -> Option<Position> {
        if index < self.len {
            Some(self.layout.resolve(index))
        } else {
            None
        }
    }

    /// Returns a reference to the slot at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let position = self.resolve(index)?;
        Some(&self.segments[position.segment][position.offset])
    }

    /// Returns a mutable reference to the slot at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let position = self.resolve(index)?;
        Some(&mut self.segments[position.segment][position.offset])
    }

    /// Returns the segment at `segment`.
    #[inline]
    #[must_use]
    pub fn segment(&self, segment: usize) -> Option<&[T]> {
        self.segments.get(segment).map(AsRef::as_ref)
    }

    /// Returns an iterator over all the allocated slots in logical order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            segments: self.segments.iter(),
            current: None,
        }
    }

    /// Returns a mutable iterator over all the allocated slots in logical order.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            segments: self.segments.iter_mut(),
            current: None,
        }
    }
}

impl<T: Default> SegmentedVec<T> {
    /// Appends segments until at least `capacity` slots are allocated.
    ///
    /// New segments follow the [`SegmentLayout`] growth schedule and are filled with
    /// `T::default()`. Already allocated segments are left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::SegmentedVec;
    ///
    /// let mut store: SegmentedVec<u32> = SegmentedVec::new().unwrap();
    /// store.ensure_capacity(1);
    /// let first = store.get(0).unwrap() as *const u32;
    ///
    /// store.ensure_capacity(100_000);
    /// assert!(store.len() >= 100_000);
    /// assert_eq!(store.get(0).unwrap() as *const u32, first);
    /// ```
    pub fn ensure_capacity(&mut self, capacity: usize) {
        while self.len < capacity {
            let segment = self.segments.len();
            let segment_len = self.layout.segment_len(segment);
            self.segments
                .push((0..segment_len).map(|_| T::default()).collect());
            self.len += segment_len;
            trace!(segment, segment_len, len = self.len, "appended segment");
        }
    }

    /// Resets every allocated slot to `T::default()` without releasing any segment.
    #[inline]
    pub fn clear(&mut self) {
        for segment in &mut self.segments {
            segment.iter_mut().for_each(|slot| *slot = T::default());
        }
        trace!(len = self.len, "cleared segments");
    }
}

impl<T: Clone> SegmentedVec<T> {
    /// Overwrites every allocated slot with a clone of `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::SegmentedVec;
    ///
    /// let mut store: SegmentedVec<i32> = SegmentedVec::new().unwrap();
    /// store.ensure_capacity(40);
    /// store.set_all(-1);
    /// assert!(store.iter().all(|v| *v == -1));
    /// ```
    #[inline]
    pub fn set_all(&mut self, value: T) {
        for segment in &mut self.segments {
            segment.fill(value.clone());
        }
    }
}

impl<T: Debug> Debug for SegmentedVec<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for SegmentedVec<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(slot) => slot,
            None => panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.len
            ),
        }
    }
}

impl<T> IndexMut<usize> for SegmentedVec<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let len = self.len;
        match self.get_mut(index) {
            Some(slot) => slot,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}

impl<'s, T> IntoIterator for &'s SegmentedVec<T> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, T> IntoIterator for &'s mut SegmentedVec<T> {
    type Item = &'s mut T;
    type IntoIter = IterMut<'s, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> IntoIterator for SegmentedVec<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            segments: self.segments.into_iter(),
            current: None,
        }
    }
}

impl<'s, T> Iterator for Iter<'s, T> {
    type Item = &'s T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.current.as_mut().and_then(Iterator::next) {
                return Some(slot);
            }
            self.current = Some(self.segments.next()?.iter());
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'s, T> Iterator for IterMut<'s, T> {
    type Item = &'s mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.current.as_mut().and_then(Iterator::next) {
                return Some(slot);
            }
            self.current = Some(self.segments.next()?.iter_mut());
        }
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.current.as_mut().and_then(Iterator::next) {
                return Some(slot);
            }
            self.current = Some(self.segments.next()?.into_vec().into_iter());
        }
    }
}

impl<T> FusedIterator for IntoIter<T> {}
