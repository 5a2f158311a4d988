//! [`SegmentLayout`] maps a logical index onto a `(segment, offset)` pair.
//!
//! Segments start at [`FIRST_SEGMENT_LEN`] elements and double in length until the next length
//! would reach the per-segment element limit derived from the byte ceiling; from then on every
//! segment has exactly that limit.
//!
//! Segmented stores size their elements with [`Shape::of`], i.e. `size_of::<T>()`; the `Word`
//! and `Composite` shapes estimate footprints of element types that are not laid out yet.

use std::mem::size_of;

use super::config::SegmentConfig;
use super::Error;

/// The number of bytes assigned to a reference-like or primitive [`Shape`].
pub const WORD_SIZE: usize = size_of::<usize>();

/// The length of the first segment of the progressive growth regime.
pub const FIRST_SEGMENT_LEN: usize = 16;

/// The static shape of an element, used to compute its footprint.
///
/// # Examples
///
/// ```
/// use segmap::segment_layout::{Shape, WORD_SIZE};
///
/// let pair = [Shape::Word, Shape::Bytes(4)];
/// assert_eq!(Shape::Composite(&pair).footprint(), WORD_SIZE + 4);
/// assert_eq!(Shape::of::<u64>().footprint(), 8);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape<'s> {
    /// A reference-like or primitive value occupying one machine word.
    Word,

    /// A value of a known size in bytes.
    Bytes(usize),

    /// A struct-like value whose footprint is the sum of its fields.
    Composite(&'s [Shape<'s>]),
}

impl Shape<'static> {
    /// Returns the [`Shape`] of `T` as laid out by the compiler.
    #[inline]
    #[must_use]
    pub const fn of<T>() -> Self {
        Shape::Bytes(size_of::<T>())
    }
}

impl Shape<'_> {
    /// Returns the number of bytes a value of this shape occupies.
    #[must_use]
    pub fn footprint(&self) -> usize {
        match self {
            Shape::Word => WORD_SIZE,
            Shape::Bytes(bytes) => *bytes,
            Shape::Composite(fields) => fields.iter().map(Shape::footprint).sum(),
        }
    }
}

/// A segment of the progressive growth regime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SegmentRun {
    /// The logical index of the first element in the segment.
    pub start: usize,

    /// The number of elements in the segment.
    pub len: usize,
}

/// The physical location of a logical index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Position {
    /// The index of the segment.
    pub segment: usize,

    /// The offset within the segment.
    pub offset: usize,
}

/// [`SegmentLayout`] is the precomputed growth schedule of a segmented store.
///
/// The layout is a pure function of the element footprint and the byte ceiling; two stores
/// with the same layout place every logical index at the same [`Position`].
///
/// # Examples
///
/// ```
/// use segmap::segment_layout::{Position, SegmentLayout};
///
/// // 1000 / 8 - 1 = 124 elements per segment, progressive segments of 16, 32 and 64.
/// let layout = SegmentLayout::new(1000, 8).unwrap();
/// assert_eq!(layout.max_segment_len(), 124);
/// assert_eq!(layout.first_fixed_index(), 112);
///
/// assert_eq!(layout.resolve(0), Position { segment: 0, offset: 0 });
/// assert_eq!(layout.resolve(47), Position { segment: 1, offset: 31 });
/// assert_eq!(layout.resolve(112), Position { segment: 3, offset: 0 });
/// assert_eq!(layout.resolve(236), Position { segment: 4, offset: 0 });
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SegmentLayout {
    element_size: usize,
    max_segment_len: usize,
    progressive: Box<[SegmentRun]>,
    first_fixed_index: usize,
}

impl SegmentLayout {
    /// Creates a [`SegmentLayout`] for elements of `element_size` bytes under a
    /// `ceiling_bytes` limit per segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `element_size` is zero, or if the ceiling cannot
    /// hold at least two elements; one element is always held back as headroom.
    pub fn new(ceiling_bytes: usize, element_size: usize) -> Result<Self, Error> {
        if element_size == 0 {
            return Err(Error::Configuration("element footprint must be non-zero"));
        }
        let max_segment_len = (ceiling_bytes / element_size).saturating_sub(1);
        if max_segment_len == 0 {
            return Err(Error::Configuration(
                "segment ceiling is too small for the element footprint",
            ));
        }

        let mut progressive = Vec::new();
        let mut start = 0;
        let mut len = FIRST_SEGMENT_LEN;
        while len < max_segment_len {
            progressive.push(SegmentRun { start, len });
            start += len;
            len = match len.checked_mul(2) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(Self {
            element_size,
            max_segment_len,
            progressive: progressive.into_boxed_slice(),
            first_fixed_index: start,
        })
    }

    /// Creates a [`SegmentLayout`] for `T` under the given [`SegmentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `T` is zero-sized or larger than half the ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::segment_layout::SegmentLayout;
    /// use segmap::SegmentConfig;
    ///
    /// let layout = SegmentLayout::of::<u32>(&SegmentConfig::default()).unwrap();
    /// assert_eq!(layout.max_segment_len(), 21_249);
    ///
    /// assert!(SegmentLayout::of::<()>(&SegmentConfig::default()).is_err());
    /// ```
    #[inline]
    pub fn of<T>(config: &SegmentConfig) -> Result<Self, Error> {
        Self::new(config.ceiling_bytes(), Shape::of::<T>().footprint())
    }

    /// Returns the footprint of a single element in bytes.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Returns the maximum number of elements in a single segment.
    #[inline]
    #[must_use]
    pub const fn max_segment_len(&self) -> usize {
        self.max_segment_len
    }

    /// Returns the progressive part of the growth schedule.
    #[inline]
    #[must_use]
    pub fn progressive_segments(&self) -> &[SegmentRun] {
        &self.progressive
    }

    /// Returns the first logical index stored in a fixed-length segment.
    #[inline]
    #[must_use]
    pub const fn first_fixed_index(&self) -> usize {
        self.first_fixed_index
    }

    /// Returns the length of the segment at `segment`.
    #[inline]
    #[must_use]
    pub fn segment_len(&self, segment: usize) -> usize {
        self.progressive
            .get(segment)
            .map_or(self.max_segment_len, |run| run.len)
    }

    /// Resolves a logical index into its [`Position`].
    ///
    /// The result depends only on the layout, so it never changes as the store grows.
    #[inline]
    #[must_use]
    pub fn resolve(&self, index: usize) -> Position {
        if index < self.first_fixed_index {
            let segment = self
                .progressive
                .partition_point(|run| run.start + run.len <= index);
            Position {
                segment,
                offset: index - self.progressive[segment].start,
            }
        } else {
            let fixed = index - self.first_fixed_index;
            Position {
                segment: self.progressive.len() + fixed / self.max_segment_len,
                offset: fixed % self.max_segment_len,
            }
        }
    }

    /// Converts a [`Position`] back into its logical index.
    #[inline]
    #[must_use]
    pub fn logical_index(&self, position: Position) -> usize {
        match self.progressive.get(position.segment) {
            Some(run) => run.start + position.offset,
            None => {
                self.first_fixed_index
                    + (position.segment - self.progressive.len()) * self.max_segment_len
                    + position.offset
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn footprint() {
        assert_eq!(Shape::Word.footprint(), WORD_SIZE);
        let inner = [Shape::Word, Shape::Bytes(2)];
        let outer = [Shape::Composite(&inner), Shape::Bytes(4), Shape::Word];
        assert_eq!(
            Shape::Composite(&outer).footprint(),
            2 * WORD_SIZE + 2 + 4
        );
        assert_eq!(Shape::Composite(&[]).footprint(), 0);
        assert_eq!(Shape::of::<[u16; 3]>().footprint(), 6);
    }

    #[test]
    fn configuration_errors() {
        assert!(matches!(
            SegmentLayout::new(85_000, 0),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            SegmentLayout::new(15, 8),
            Err(Error::Configuration(_))
        ));
        assert_eq!(SegmentLayout::new(16, 8).unwrap().max_segment_len(), 1);
    }

    #[test]
    fn growth_schedule() {
        // 85_000 / 4 - 1 = 21_249.
        let layout = SegmentLayout::new(85_000, 4).unwrap();
        assert_eq!(layout.max_segment_len(), 21_249);
        let runs = layout.progressive_segments();
        assert_eq!(runs.len(), 11);
        assert_eq!(runs[0], SegmentRun { start: 0, len: 16 });
        assert_eq!(runs[10], SegmentRun { start: 16_368, len: 16_384 });
        assert_eq!(layout.first_fixed_index(), 32_752);
        for window in runs.windows(2) {
            assert_eq!(window[0].start + window[0].len, window[1].start);
            assert_eq!(window[0].len * 2, window[1].len);
        }
    }

    #[test]
    fn unbounded_ceiling() {
        let layout = SegmentLayout::new(usize::MAX, 1).unwrap();
        assert_eq!(layout.max_segment_len(), usize::MAX - 1);
        let runs = layout.progressive_segments();
        assert_eq!(runs.len(), 60);
        assert_eq!(runs[59].len, 1 << 63);
        assert_eq!(layout.first_fixed_index(), usize::MAX - 15);
        assert_eq!(layout.resolve(1 << 63), Position { segment: 59, offset: 16 });
        assert_eq!(
            layout.resolve(usize::MAX - 15),
            Position { segment: 60, offset: 0 }
        );
        assert_eq!(layout.logical_index(Position { segment: 60, offset: 3 }), usize::MAX - 12);

        let config = SegmentConfig::new().with_ceiling(usize::MAX);
        assert!(SegmentLayout::of::<u64>(&config).is_ok());
    }

    #[test]
    fn small_segment_limit() {
        // No progressive segment fits below the limit.
        let layout = SegmentLayout::new(100, 10).unwrap();
        assert_eq!(layout.max_segment_len(), 9);
        assert!(layout.progressive_segments().is_empty());
        assert_eq!(layout.first_fixed_index(), 0);
        assert_eq!(layout.resolve(0), Position { segment: 0, offset: 0 });
        assert_eq!(layout.resolve(9), Position { segment: 1, offset: 0 });
        assert_eq!(layout.segment_len(0), 9);
    }

    #[test]
    fn resolve_is_contiguous() {
        for (ceiling, element_size) in [(85_000, 4), (85_000, 24), (1000, 8), (40, 2), (100, 10)] {
            let layout = SegmentLayout::new(ceiling, element_size).unwrap();
            let mut expected = Position {
                segment: 0,
                offset: 0,
            };
            for index in 0..100_000 {
                let position = layout.resolve(index);
                assert_eq!(position, expected, "{ceiling} {element_size} {index}");
                assert_eq!(layout.logical_index(position), index);
                assert!(position.offset < layout.segment_len(position.segment));
                expected.offset += 1;
                if expected.offset == layout.segment_len(expected.segment) {
                    expected.segment += 1;
                    expected.offset = 0;
                }
            }
        }
    }
}
