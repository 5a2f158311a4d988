//! Segment sizing configuration.

/// The default upper bound, in bytes, of a single segment.
///
/// Allocations at or above this size are treated as "large" objects by several allocators.
pub const DEFAULT_SEGMENT_CEILING: usize = 85_000;

/// [`SegmentConfig`] bounds the size of every memory segment allocated by a
/// [`SegmentedVec`](crate::SegmentedVec) or a [`HashMap`](crate::HashMap).
///
/// # Examples
///
/// ```
/// use segmap::SegmentConfig;
///
/// let config = SegmentConfig::new().with_ceiling(4096);
/// assert_eq!(config.ceiling_bytes(), 4096);
/// assert_eq!(SegmentConfig::default().ceiling_bytes(), 85_000);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SegmentConfig {
    ceiling_bytes: usize,
}

impl SegmentConfig {
    /// Creates a [`SegmentConfig`] with [`DEFAULT_SEGMENT_CEILING`].
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ceiling_bytes: DEFAULT_SEGMENT_CEILING,
        }
    }

    /// Sets the maximum number of bytes a single segment may occupy.
    ///
    /// The value is validated against the element footprint when a store is created.
    #[inline]
    #[must_use]
    pub const fn with_ceiling(mut self, ceiling_bytes: usize) -> Self {
        self.ceiling_bytes = ceiling_bytes;
        self
    }

    /// Returns the maximum number of bytes a single segment may occupy.
    #[inline]
    #[must_use]
    pub const fn ceiling_bytes(&self) -> usize {
        self.ceiling_bytes
    }
}

impl Default for SegmentConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_test {
    use super::SegmentConfig;

    use serde_test::{assert_de_tokens, assert_tokens, Token};

    #[test]
    fn serde_segment_config() {
        let config = SegmentConfig::new().with_ceiling(1024);
        assert_tokens(
            &config,
            &[
                Token::Struct {
                    name: "SegmentConfig",
                    len: 1,
                },
                Token::Str("ceiling_bytes"),
                Token::U64(1024),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn serde_segment_config_default() {
        assert_de_tokens(
            &SegmentConfig::default(),
            &[
                Token::Struct {
                    name: "SegmentConfig",
                    len: 0,
                },
                Token::StructEnd,
            ],
        );
    }
}
