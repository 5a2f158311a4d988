//! Hash map and growable array backed by bounded-size memory segments.
//!
//! # segmap::SegmentedVec
//! A growable array made of segments that never move; no single allocation exceeds the
//! configured byte ceiling.
//!
//! # segmap::HashMap
//! A chaining hash map with free-list slot reuse and prime bucket counts whose buckets and
//! entries are stored in [`SegmentedVec`] instances.
//!
//! # segmap::JaggedMap
//! A map keyed by fixed-length key paths, built from nested [`Map`] instances.

mod config;
pub use config::{SegmentConfig, DEFAULT_SEGMENT_CEILING};

mod error;
pub use error::Error;

pub mod hash_map;
pub use hash_map::{Cursor, HashMap};

pub mod jagged_map;
pub use jagged_map::JaggedMap;

mod map;
pub use map::{BTreeMapFactory, HashMapFactory, Map, MapFactory};

pub mod segment_layout;
pub use segment_layout::{Position, SegmentLayout, Shape};

pub mod segmented_vec;
pub use segmented_vec::SegmentedVec;

#[cfg(not(feature = "equivalent"))]
mod equivalent;
#[cfg(not(feature = "equivalent"))]
pub use equivalent::Equivalent;
#[cfg(feature = "equivalent")]
pub use equivalent::Equivalent;

mod hash_table;
