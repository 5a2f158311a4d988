//! [`HashMap`] is a hash map whose buckets and entries live in bounded-size segments.

use std::collections::hash_map::RandomState;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::mem::replace;
use std::ops::Index;

use tracing::debug;

use super::config::SegmentConfig;
use super::hash_table::primes::{expand_prime, get_prime, MAX_PRIME};
use super::hash_table::slot::{Link, Slot};
use super::hash_table::HashTable;
use super::segment_layout::SegmentLayout;
use super::segmented_vec::{self, SegmentedVec};
use super::{Equivalent, Error};

/// The maximum number of entries a [`HashMap`] can hold.
pub const MAX_CAPACITY: usize = MAX_PRIME;

/// Hash map backed by segmented storage.
///
/// [`HashMap`] is a chaining hash table: every bucket holds the head of a singly-linked chain
/// of entries, and removed entries are recycled through a free list. Unlike a flat-array hash
/// table, both the bucket heads and the entries are stored in [`SegmentedVec`] instances, so
/// growing the table appends new segments instead of reallocating and copying the existing
/// ones, and no single allocation exceeds the [`SegmentConfig`] ceiling.
///
/// ## The key features of [`HashMap`]
///
/// * Bounded allocations: every segment stays below the configured byte ceiling.
/// * No bulk copies: entries are never moved when the table grows; only the chains are
///   re-threaded.
/// * Prime bucket counts: the number of buckets is always a prime number.
/// * Versioned enumeration: a [`Cursor`] detects structural changes made after it was created.
///
/// ## Iteration order
///
/// Entries are visited in the order of their slots in the entry store, which is neither the
/// insertion order nor stable across removals and re-insertions.
///
/// ## Thread safety
///
/// [`HashMap`] is a single-threaded container; it is `Send` and `Sync` when its keys, values,
/// and hasher are, and relies on `&mut` exclusivity for mutation.
pub struct HashMap<K, V, H = RandomState>
where
    H: BuildHasher,
{
    buckets: SegmentedVec<Link>,
    entries: SegmentedVec<Slot<K, V>>,
    bucket_count: usize,
    count: usize,
    free_list: Link,
    free_count: usize,
    version: u64,
    config: SegmentConfig,
    build_hasher: H,
}

/// [`Cursor`] is a detached position in a [`HashMap`].
///
/// A [`Cursor`] does not borrow the [`HashMap`], so the map may be modified while the cursor
/// is alive; in that case the next call to [`Cursor::next`] fails with
/// [`Error::ConcurrentModification`] instead of visiting a changed table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cursor {
    version: u64,
    segment: usize,
    offset: usize,
    index: usize,
}

/// An iterator over the entries of a [`HashMap`].
#[derive(Debug)]
pub struct Iter<'h, K, V> {
    slots: segmented_vec::Iter<'h, Slot<K, V>>,
    remaining: usize,
}

/// A mutable iterator over the entries of a [`HashMap`].
#[derive(Debug)]
pub struct IterMut<'h, K, V> {
    slots: segmented_vec::IterMut<'h, Slot<K, V>>,
    remaining: usize,
}

/// An iterator that moves out of a [`HashMap`].
#[derive(Debug)]
pub struct IntoIter<K, V> {
    slots: segmented_vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

/// An iterator over the keys of a [`HashMap`].
#[derive(Debug)]
pub struct Keys<'h, K, V> {
    iter: Iter<'h, K, V>,
}

/// An iterator over the values of a [`HashMap`].
#[derive(Debug)]
pub struct Values<'h, K, V> {
    iter: Iter<'h, K, V>,
}

/// A mutable iterator over the values of a [`HashMap`].
#[derive(Debug)]
pub struct ValuesMut<'h, K, V> {
    iter: IterMut<'h, K, V>,
}

impl<K, V, H> HashMap<K, V, H>
where
    H: BuildHasher,
{
    /// Creates an empty [`HashMap`] with the specified capacity, [`BuildHasher`], and
    /// [`SegmentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `capacity` exceeds [`MAX_CAPACITY`], and
    /// [`Error::Configuration`] if an entry does not fit the segment ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{Error, HashMap, SegmentConfig};
    /// use std::collections::hash_map::RandomState;
    ///
    /// let config = SegmentConfig::new().with_ceiling(4096);
    /// let hashmap: Result<HashMap<u64, u64>, Error> =
    ///     HashMap::try_with_config(100, RandomState::new(), config);
    /// assert_eq!(hashmap.unwrap().capacity(), 107);
    ///
    /// let tiny = SegmentConfig::new().with_ceiling(16);
    /// let hashmap: Result<HashMap<u64, u64>, Error> =
    ///     HashMap::try_with_config(0, RandomState::new(), tiny);
    /// assert!(matches!(hashmap, Err(Error::Configuration(_))));
    /// ```
    pub fn try_with_config(
        capacity: usize,
        build_hasher: H,
        config: SegmentConfig,
    ) -> Result<Self, Error> {
        if capacity > MAX_CAPACITY {
            return Err(Error::InvalidArgument(
                "capacity exceeds the maximum number of entries",
            ));
        }
        let mut hashmap = Self {
            buckets: SegmentedVec::with_layout(SegmentLayout::of::<Link>(&config)?),
            entries: SegmentedVec::with_layout(SegmentLayout::of::<Slot<K, V>>(&config)?),
            bucket_count: 0,
            count: 0,
            free_list: Link::NONE,
            free_count: 0,
            version: 0,
            config,
            build_hasher,
        };
        if capacity > 0 {
            hashmap.initialize(capacity);
        }
        Ok(hashmap)
    }

    /// Creates an empty [`HashMap`] with the specified capacity, [`BuildHasher`], and
    /// [`SegmentConfig`].
    ///
    /// # Panics
    ///
    /// Panics if [`HashMap::try_with_config`] fails.
    #[inline]
    #[must_use]
    pub fn with_config(capacity: usize, build_hasher: H, config: SegmentConfig) -> Self {
        match Self::try_with_config(capacity, build_hasher, config) {
            Ok(hashmap) => hashmap,
            Err(error) => panic!("{error}"),
        }
    }

    /// Creates an empty [`HashMap`] with the given [`BuildHasher`].
    ///
    /// # Panics
    ///
    /// Panics if a single entry is larger than half the default segment ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let hashmap: HashMap<u64, u32, RandomState> = HashMap::with_hasher(RandomState::new());
    /// assert_eq!(hashmap.capacity(), 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_hasher(build_hasher: H) -> Self {
        Self::with_config(0, build_hasher, SegmentConfig::default())
    }

    /// Creates an empty [`HashMap`] with the specified capacity and [`BuildHasher`].
    ///
    /// The actual capacity is the smallest usable prime equal to or greater than `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`] or a single entry is larger than half the
    /// default segment ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let hashmap: HashMap<u64, u32, RandomState> =
    ///     HashMap::with_capacity_and_hasher(1000, RandomState::new());
    /// assert_eq!(hashmap.capacity(), 1103);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: H) -> Self {
        Self::with_config(capacity, build_hasher, SegmentConfig::default())
    }

    /// Returns the number of entries in the [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.upsert(1, 0);
    /// assert_eq!(hashmap.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.count - self.free_count
    }

    /// Returns `true` if the [`HashMap`] is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.is_empty());
    /// hashmap.upsert(1, 0);
    /// assert!(!hashmap.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets, which is also the number of entries the [`HashMap`] can
    /// hold before it grows.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// assert_eq!(hashmap.capacity(), 0);
    ///
    /// hashmap.upsert(1, 0);
    /// assert_eq!(hashmap.capacity(), 3);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bucket_count
    }

    /// Returns a reference to the [`BuildHasher`].
    #[inline]
    pub fn hasher(&self) -> &H {
        &self.build_hasher
    }

    /// Returns the [`SegmentConfig`] of the [`HashMap`].
    #[inline]
    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Returns a [`Cursor`] positioned before the first entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{Error, HashMap};
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// hashmap.upsert(1, 10);
    /// hashmap.upsert(2, 20);
    ///
    /// let mut cursor = hashmap.cursor();
    /// assert!(cursor.next(&hashmap).unwrap().is_some());
    ///
    /// hashmap.remove(&1);
    /// assert_eq!(cursor.next(&hashmap), Err(Error::ConcurrentModification));
    /// ```
    #[inline]
    pub fn cursor(&self) -> Cursor {
        Cursor {
            version: self.version,
            segment: 0,
            offset: 0,
            index: 0,
        }
    }

    /// Returns an iterator over the entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = [(1, 10), (2, 20)].into_iter().collect();
    ///
    /// let sum: u32 = hashmap.iter().map(|(_, v)| *v).sum();
    /// assert_eq!(sum, 30);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.entries.iter(),
            remaining: self.len(),
        }
    }

    /// Returns a mutable iterator over the entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = [(1, 10), (2, 20)].into_iter().collect();
    ///
    /// hashmap.iter_mut().for_each(|(_, v)| *v += 1);
    /// assert_eq!(hashmap.get(&1), Ok(&11));
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        IterMut {
            slots: self.entries.iter_mut(),
            remaining,
        }
    }

    /// Returns an iterator over the keys.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { iter: self.iter() }
    }

    /// Returns an iterator over the values.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { iter: self.iter() }
    }

    /// Returns a mutable iterator over the values.
    #[inline]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            iter: self.iter_mut(),
        }
    }

    /// Returns `true` if any entry holds a value equal to `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, &str> = HashMap::default();
    /// hashmap.upsert(1, "one");
    ///
    /// assert!(hashmap.contains_value(&"one"));
    /// assert!(!hashmap.contains_value(&"two"));
    /// ```
    #[inline]
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Clones every entry into `destination`, starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `index` is out of range or the entries do not fit
    /// in the rest of `destination`; `destination` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{Error, HashMap};
    ///
    /// let hashmap: HashMap<u64, u32> = [(1, 10), (2, 20)].into_iter().collect();
    ///
    /// let mut destination = [(0, 0); 3];
    /// assert!(hashmap.copy_to(&mut destination, 1).is_ok());
    /// assert_eq!(destination[0], (0, 0));
    /// destination[1..].sort_unstable();
    /// assert_eq!(destination[1..], [(1, 10), (2, 20)]);
    ///
    /// assert!(matches!(
    ///     hashmap.copy_to(&mut destination, 2),
    ///     Err(Error::InvalidArgument(_))
    /// ));
    /// ```
    pub fn copy_to(&self, destination: &mut [(K, V)], index: usize) -> Result<(), Error>
    where
        K: Clone,
        V: Clone,
    {
        if index > destination.len() {
            return Err(Error::InvalidArgument(
                "index is outside of the destination",
            ));
        }
        if destination.len() - index < self.len() {
            return Err(Error::InvalidArgument(
                "destination is too small to hold every entry",
            ));
        }
        for (target, (k, v)) in destination[index..].iter_mut().zip(self.iter()) {
            *target = (k.clone(), v.clone());
        }
        Ok(())
    }

    /// Removes every entry.
    ///
    /// The segments are kept for reuse; the capacity does not change.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.upsert(1, 0);
    /// hashmap.clear();
    ///
    /// assert!(hashmap.is_empty());
    /// assert_eq!(hashmap.capacity(), 3);
    /// ```
    pub fn clear(&mut self) {
        if self.count > 0 {
            let live = self.len();
            self.buckets.set_all(Link::NONE);
            self.entries.clear();
            self.count = 0;
            self.free_list = Link::NONE;
            self.free_count = 0;
            if live > 0 {
                self.bump_version();
            }
        }
    }

    /// Allocates the bucket and entry stores for at least `capacity` entries.
    fn initialize(&mut self, capacity: usize) {
        let bucket_count = get_prime(capacity);
        self.buckets.ensure_capacity(bucket_count);
        self.buckets.set_all(Link::NONE);
        self.entries.ensure_capacity(bucket_count);
        self.bucket_count = bucket_count;
        self.free_list = Link::NONE;
    }

    /// Grows the table to `bucket_count` buckets and re-threads every live entry.
    ///
    /// Entries keep their slots; only the bucket heads and the `next` links change.
    fn resize(&mut self, bucket_count: usize) {
        assert!(self.count < MAX_CAPACITY, "capacity overflow");
        debug_assert!(bucket_count >= self.bucket_count);

        self.buckets.ensure_capacity(bucket_count);
        self.buckets.set_all(Link::NONE);
        self.entries.ensure_capacity(bucket_count);
        for (index, slot) in self.entries.iter_mut().take(self.count).enumerate() {
            if slot.is_live() {
                let bucket = Self::bucket_of(slot.hash, bucket_count);
                slot.next = self.buckets[bucket];
                self.buckets[bucket] = Link::new(index);
            }
        }

        debug!(
            from = self.bucket_count,
            to = bucket_count,
            entries = self.len(),
            segments = self.entries.num_segments(),
            "resized hash table"
        );
        self.bucket_count = bucket_count;
        self.bump_version();
    }

    /// Returns the bucket for `hash` in a table of `bucket_count` buckets.
    #[allow(clippy::cast_sign_loss)] // Live hash values are non-negative.
    #[inline]
    fn bucket_of(hash: i32, bucket_count: usize) -> usize {
        debug_assert!(hash >= 0);
        hash as usize % bucket_count
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Moves `cursor` to the next live entry.
    fn advance(&self, cursor: &mut Cursor) -> Option<(&K, &V)> {
        while cursor.index < self.count {
            let Some(segment) = self.entries.segment(cursor.segment) else {
                break;
            };
            if cursor.offset == segment.len() {
                cursor.segment += 1;
                cursor.offset = 0;
                continue;
            }
            let slot = &segment[cursor.offset];
            cursor.offset += 1;
            cursor.index += 1;
            if let Some((k, v)) = &slot.data {
                return Some((k, v));
            }
        }
        None
    }
}

impl<K, V, H> HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    /// Inserts a key-value pair into the [`HashMap`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the key exists; the existing entry is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{Error, HashMap};
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert_eq!(hashmap.insert(1, 1), Err(Error::DuplicateKey));
    /// assert_eq!(hashmap.get(&1), Ok(&0));
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, val: V) -> Result<(), Error> {
        self.insert_entry(key, val, false).map(|_| ())
    }

    /// Upserts a key-value pair into the [`HashMap`].
    ///
    /// Returns the old value if the [`HashMap`] has this key present, or returns `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.upsert(1, 0).is_none());
    /// assert_eq!(hashmap.upsert(1, 1), Some(0));
    /// assert_eq!(hashmap.get(&1), Ok(&1));
    /// ```
    #[inline]
    pub fn upsert(&mut self, key: K, val: V) -> Option<V> {
        match self.insert_entry(key, val, true) {
            Ok(old) => old,
            Err(_) => None,
        }
    }

    /// Returns a reference to the value associated with the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{Error, HashMap};
    ///
    /// let mut hashmap: HashMap<String, u32> = HashMap::default();
    ///
    /// assert_eq!(hashmap.get("a"), Err(Error::KeyNotFound));
    /// hashmap.upsert("a".to_owned(), 1);
    /// assert_eq!(hashmap.get("a"), Ok(&1));
    /// ```
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.try_get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a reference to the value associated with the key, or `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.try_get(&1).is_none());
    /// hashmap.upsert(1, 10);
    /// assert_eq!(hashmap.try_get(&1), Some(&10));
    /// ```
    #[inline]
    pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        let index = self.find(key)?;
        self.entries[index].data.as_ref().map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value associated with the key, or `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.upsert(1, 10);
    /// if let Some(v) = hashmap.get_mut(&1) {
    ///     *v += 1;
    /// }
    /// assert_eq!(hashmap.get(&1), Ok(&11));
    /// ```
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        let index = self.find(key)?;
        self.entries[index].data.as_mut().map(|(_, v)| v)
    }

    /// Returns `true` if the [`HashMap`] contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(!hashmap.contains_key(&1));
    /// hashmap.upsert(1, 0);
    /// assert!(hashmap.contains_key(&1));
    /// ```
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes a key-value pair if the key exists.
    ///
    /// Returns `true` if an entry was removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(!hashmap.remove(&1));
    /// hashmap.upsert(1, 0);
    /// assert!(hashmap.remove(&1));
    /// assert!(hashmap.is_empty());
    /// ```
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes a key-value pair if the key exists, and returns it.
    ///
    /// The slot of the removed entry is recycled by a later insertion.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.remove_entry(&1).is_none());
    /// hashmap.upsert(1, 0);
    /// assert_eq!(hashmap.remove_entry(&1), Some((1, 0)));
    /// ```
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        if self.bucket_count == 0 {
            return None;
        }
        let hash = self.hash(key);
        let bucket = Self::bucket_of(hash, self.bucket_count);
        let mut previous = Link::NONE;
        let mut link = self.buckets[bucket];
        while let Some(index) = link.get() {
            let slot = &self.entries[index];
            let next = slot.next;
            if slot.hash == hash && slot.data.as_ref().map_or(false, |(k, _)| key.equivalent(k)) {
                match previous.get() {
                    Some(previous) => self.entries[previous].next = next,
                    None => self.buckets[bucket] = next,
                }
                let entry = self.entries[index].vacate(self.free_list);
                self.free_list = link;
                self.free_count += 1;
                self.bump_version();
                return entry;
            }
            previous = link;
            link = next;
        }
        None
    }

    /// Reserves capacity for at least `additional` more entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the total capacity would exceed [`MAX_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.reserve(100).is_ok());
    /// assert_eq!(hashmap.capacity(), 107);
    /// assert!(hashmap.reserve(usize::MAX).is_err());
    /// ```
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let required = self
            .len()
            .checked_add(additional)
            .filter(|required| *required <= MAX_CAPACITY)
            .ok_or(Error::InvalidArgument(
                "capacity exceeds the maximum number of entries",
            ))?;
        if self.bucket_count == 0 {
            if required > 0 {
                self.initialize(required);
            }
        } else if required > self.bucket_count {
            self.resize(get_prime(required));
        }
        Ok(())
    }

    /// Returns the logical index of the live entry holding the key.
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        if self.bucket_count == 0 {
            return None;
        }
        let hash = self.hash(key);
        let mut link = self.buckets[Self::bucket_of(hash, self.bucket_count)];
        while let Some(index) = link.get() {
            let slot = &self.entries[index];
            if slot.hash == hash && slot.data.as_ref().map_or(false, |(k, _)| key.equivalent(k)) {
                return Some(index);
            }
            link = slot.next;
        }
        None
    }

    /// Inserts or overwrites an entry.
    ///
    /// Returns the replaced value, or [`Error::DuplicateKey`] if overwriting is not allowed.
    fn insert_entry(&mut self, key: K, val: V, overwrite: bool) -> Result<Option<V>, Error> {
        if self.bucket_count == 0 {
            self.initialize(0);
        }
        let hash = self.hash(&key);
        let mut bucket = Self::bucket_of(hash, self.bucket_count);

        let mut link = self.buckets[bucket];
        while let Some(index) = link.get() {
            let slot = &mut self.entries[index];
            if slot.hash == hash {
                if let Some((k, v)) = slot.data.as_mut() {
                    if *k == key {
                        if !overwrite {
                            return Err(Error::DuplicateKey);
                        }
                        let old = replace(v, val);
                        self.bump_version();
                        return Ok(Some(old));
                    }
                }
            }
            link = slot.next;
        }

        let index = if let Some(free) = self.free_list.get() {
            debug_assert!(self.free_count > 0);
            self.free_list = self.entries[free].next;
            self.free_count -= 1;
            free
        } else {
            if self.count == self.bucket_count {
                self.resize(expand_prime(self.count));
                bucket = Self::bucket_of(hash, self.bucket_count);
            }
            self.count += 1;
            self.count - 1
        };

        let slot = &mut self.entries[index];
        slot.hash = hash;
        slot.next = self.buckets[bucket];
        slot.data = Some((key, val));
        self.buckets[bucket] = Link::new(index);
        self.bump_version();
        Ok(None)
    }
}

impl<K, V> HashMap<K, V, RandomState> {
    /// Creates an empty default [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::new();
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty [`HashMap`] with the specified capacity.
    ///
    /// The actual capacity is equal to or greater than the specified capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::with_capacity(1000);
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 1103);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl Cursor {
    /// Returns the next entry of `hashmap`, or `None` once every entry has been visited.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if `hashmap` was structurally modified after
    /// the [`Cursor`] was created.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = [(1, 10)].into_iter().collect();
    ///
    /// let mut cursor = hashmap.cursor();
    /// assert_eq!(cursor.next(&hashmap), Ok(Some((&1, &10))));
    /// assert_eq!(cursor.next(&hashmap), Ok(None));
    /// ```
    #[inline]
    pub fn next<'h, K, V, H>(
        &mut self,
        hashmap: &'h HashMap<K, V, H>,
    ) -> Result<Option<(&'h K, &'h V)>, Error>
    where
        H: BuildHasher,
    {
        if self.version != hashmap.version {
            return Err(Error::ConcurrentModification);
        }
        Ok(hashmap.advance(self))
    }
}

impl<K, V, H> Clone for HashMap<K, V, H>
where
    K: Clone,
    V: Clone,
    H: BuildHasher + Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            entries: self.entries.clone(),
            bucket_count: self.bucket_count,
            count: self.count,
            free_list: self.free_list,
            free_count: self.free_count,
            version: self.version,
            config: self.config,
            build_hasher: self.build_hasher.clone(),
        }
    }
}

impl<K, V, H> Debug for HashMap<K, V, H>
where
    K: Debug,
    V: Debug,
    H: BuildHasher,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H> Default for HashMap<K, V, H>
where
    H: BuildHasher + Default,
{
    /// Creates an empty default [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 0);
    /// ```
    #[inline]
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<K, V, H> Extend<(K, V)> for HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    #[inline]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        iter.into_iter().for_each(|(k, v)| {
            self.upsert(k, v);
        });
    }
}

impl<K, V, H> FromIterator<(K, V)> for HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher + Default,
{
    #[inline]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let into_iter = iter.into_iter();
        let mut hashmap = Self::with_capacity_and_hasher(
            into_iter.size_hint().0.min(MAX_CAPACITY),
            H::default(),
        );
        hashmap.extend(into_iter);
        hashmap
    }
}

impl<K, V, H> HashTable<H> for HashMap<K, V, H>
where
    H: BuildHasher,
{
    #[inline]
    fn hasher(&self) -> &H {
        &self.build_hasher
    }
}

impl<K, Q, V, H> Index<&Q> for HashMap<K, V, H>
where
    K: Eq + Hash,
    Q: Equivalent<K> + Hash + ?Sized,
    H: BuildHasher,
{
    type Output = V;

    /// Returns a reference to the value associated with the key.
    ///
    /// # Panics
    ///
    /// Panics if the key does not exist.
    #[inline]
    fn index(&self, key: &Q) -> &Self::Output {
        match self.try_get(key) {
            Some(v) => v,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

impl<'h, K, V, H> IntoIterator for &'h HashMap<K, V, H>
where
    H: BuildHasher,
{
    type Item = (&'h K, &'h V);
    type IntoIter = Iter<'h, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'h, K, V, H> IntoIterator for &'h mut HashMap<K, V, H>
where
    H: BuildHasher,
{
    type Item = (&'h K, &'h mut V);
    type IntoIter = IterMut<'h, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, H> IntoIterator for HashMap<K, V, H>
where
    H: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        IntoIter {
            slots: self.entries.into_iter(),
            remaining,
        }
    }
}

impl<K, V, H> PartialEq for HashMap<K, V, H>
where
    K: Eq + Hash,
    V: PartialEq,
    H: BuildHasher,
{
    /// Compares two [`HashMap`] instances regardless of their iteration order.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.try_get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, H> Eq for HashMap<K, V, H>
where
    K: Eq + Hash,
    V: Eq,
    H: BuildHasher,
{
}

impl<'h, K, V> Iterator for Iter<'h, K, V> {
    type Item = (&'h K, &'h V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for slot in self.slots.by_ref() {
            if let Some((k, v)) = &slot.data {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'h, K, V> Iterator for IterMut<'h, K, V> {
    type Item = (&'h K, &'h mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for slot in self.slots.by_ref() {
            if let Some((k, v)) = slot.data.as_mut() {
                self.remaining -= 1;
                return Some((&*k, v));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for slot in self.slots.by_ref() {
            if let Some(entry) = slot.data {
                self.remaining -= 1;
                return Some(entry);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<'h, K, V> Iterator for Keys<'h, K, V> {
    type Item = &'h K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<'h, K, V> Iterator for Values<'h, K, V> {
    type Item = &'h V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<'h, K, V> Iterator for ValuesMut<'h, K, V> {
    type Item = &'h mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

#[cfg(test)]
mod test {
    use super::*;

    fn slot_of<K: Eq + Hash, V>(hashmap: &HashMap<K, V>, key: &K) -> usize {
        hashmap.find(key).unwrap()
    }

    #[test]
    fn free_slot_reuse() {
        let mut hashmap: HashMap<u64, u64> = HashMap::default();
        for k in 0..3 {
            assert!(hashmap.insert(k, k).is_ok());
        }
        let middle = slot_of(&hashmap, &1);
        assert!(hashmap.remove(&1));
        assert_eq!(hashmap.free_count, 1);
        assert_eq!(hashmap.free_list.get(), Some(middle));
        assert_eq!(hashmap.count, 3);

        assert!(hashmap.insert(7, 7).is_ok());
        assert_eq!(hashmap.free_count, 0);
        assert_eq!(hashmap.free_list, Link::NONE);
        assert_eq!(hashmap.count, 3);
        assert_eq!(slot_of(&hashmap, &7), middle);
        assert_eq!(hashmap.len(), 3);
    }

    #[test]
    fn free_list_is_lifo() {
        let mut hashmap: HashMap<u64, u64> = HashMap::with_capacity(16);
        for k in 0..8 {
            assert!(hashmap.insert(k, k).is_ok());
        }
        let slots: Vec<usize> = (0..8).map(|k| slot_of(&hashmap, &k)).collect();
        for k in [2, 5, 6] {
            assert!(hashmap.remove(&k));
        }
        assert_eq!(hashmap.free_count, 3);
        for (k, expected) in [(10, slots[6]), (11, slots[5]), (12, slots[2])] {
            assert!(hashmap.insert(k, k).is_ok());
            assert_eq!(slot_of(&hashmap, &k), expected);
        }
        assert_eq!(hashmap.count, 8);
        assert!(hashmap.insert(13, 13).is_ok());
        assert_eq!(slot_of(&hashmap, &13), 8);
    }

    #[test]
    fn tombstones_are_not_chained() {
        let mut hashmap: HashMap<u64, u64> = HashMap::with_capacity(3);
        for k in 0..3 {
            assert!(hashmap.insert(k, k).is_ok());
        }
        assert!(hashmap.remove(&0));
        assert!(hashmap.remove(&2));
        let mut chained = 0;
        for bucket in 0..hashmap.bucket_count {
            let mut link = hashmap.buckets[bucket];
            while let Some(index) = link.get() {
                let slot = &hashmap.entries[index];
                assert!(slot.is_live());
                assert_eq!(
                    <HashMap<u64, u64>>::bucket_of(slot.hash, hashmap.bucket_count),
                    bucket
                );
                chained += 1;
                link = slot.next;
            }
        }
        assert_eq!(chained, hashmap.len());

        let mut free = 0;
        let mut link = hashmap.free_list;
        while let Some(index) = link.get() {
            let slot = &hashmap.entries[index];
            assert!(!slot.is_live());
            assert!(slot.data.is_none());
            free += 1;
            link = slot.next;
        }
        assert_eq!(free, hashmap.free_count);
    }

    #[test]
    fn resize_keeps_slots() {
        let mut hashmap: HashMap<u64, String> = HashMap::default();
        let mut slots = Vec::new();
        let mut resizes = 0;
        for k in 0..5000 {
            let capacity = hashmap.capacity();
            assert!(hashmap.insert(k, k.to_string()).is_ok());
            if hashmap.capacity() != capacity {
                resizes += 1;
            }
            slots.push(slot_of(&hashmap, &k));
            for (j, slot) in slots.iter().enumerate().step_by(97) {
                let j = j as u64;
                assert_eq!(slot_of(&hashmap, &j), *slot);
                assert_eq!(hashmap.get(&j), Ok(&j.to_string()));
            }
        }
        assert!(resizes >= 2);
        assert!(slots.iter().copied().eq(0..5000));
    }

    #[test]
    fn version_tracks_structural_changes() {
        let mut hashmap: HashMap<u64, u64> = HashMap::default();
        let mut version = hashmap.version;
        assert!(hashmap.insert(1, 1).is_ok());
        assert_ne!(hashmap.version, version);

        version = hashmap.version;
        assert!(hashmap.try_get(&1).is_some());
        assert!(hashmap.contains_key(&1));
        assert!(!hashmap.remove(&2));
        assert_eq!(hashmap.version, version);

        assert_eq!(hashmap.upsert(1, 2), Some(1));
        assert_ne!(hashmap.version, version);

        version = hashmap.version;
        assert!(hashmap.remove(&1));
        assert_ne!(hashmap.version, version);

        version = hashmap.version;
        hashmap.clear();
        assert_eq!(hashmap.version, version);
        assert_eq!(hashmap.count, 0);
        assert_eq!(hashmap.free_list, Link::NONE);
        assert!(hashmap.insert(1, 1).is_ok());
        assert_eq!(slot_of(&hashmap, &1), 0);
        version = hashmap.version;
        hashmap.clear();
        assert_ne!(hashmap.version, version);
    }

    #[test]
    fn clear_retains_segments() {
        let mut hashmap: HashMap<u64, u64> = HashMap::default();
        for k in 0..1000 {
            hashmap.upsert(k, k);
        }
        let bucket_segments = hashmap.buckets.num_segments();
        let entry_segments = hashmap.entries.num_segments();
        let capacity = hashmap.capacity();
        hashmap.clear();
        assert_eq!(hashmap.count, 0);
        assert_eq!(hashmap.free_count, 0);
        assert!(hashmap.entries.iter().all(|slot| !slot.is_live()));
        for k in 0..1000 {
            hashmap.upsert(k, k);
        }
        assert_eq!(hashmap.buckets.num_segments(), bucket_segments);
        assert_eq!(hashmap.entries.num_segments(), entry_segments);
        assert_eq!(hashmap.capacity(), capacity);
    }

    #[test]
    fn bounded_segments() {
        let config = SegmentConfig::new().with_ceiling(2048);
        let mut hashmap: HashMap<u64, [u8; 40]> =
            HashMap::with_config(0, RandomState::new(), config);
        for k in 0..10_000 {
            hashmap.upsert(k, [0; 40]);
        }
        let entry_size = hashmap.entries.layout().element_size();
        for segment in 0..hashmap.entries.num_segments() {
            let len = hashmap.entries.segment(segment).unwrap().len();
            assert!(len * entry_size < 2048);
        }
        assert_eq!(hashmap.len(), 10_000);
    }
}
