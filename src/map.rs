//! [`Map`] and [`MapFactory`] abstract over the map types a [`JaggedMap`](crate::JaggedMap)
//! can be built from.

use std::collections::hash_map::RandomState;
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash};

use super::{HashMap, SegmentConfig};

/// [`Map`] is the minimal associative-container interface shared by [`HashMap`] and
/// [`BTreeMap`].
pub trait Map<K, V> {
    /// Returns a reference to the value associated with the key.
    fn get(&self, key: &K) -> Option<&V>;

    /// Returns a mutable reference to the value associated with the key.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Inserts or overwrites an entry, returning the replaced value.
    fn insert(&mut self, key: K, val: V) -> Option<V>;

    /// Removes an entry, returning its value.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Returns `true` if the key exists.
    #[inline]
    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the map has no entries.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    fn clear(&mut self);

    /// Invokes `f` on every entry.
    fn for_each<F: FnMut(&K, &V)>(&self, f: F);
}

/// [`MapFactory`] creates empty maps keyed by `K` for any value type.
///
/// # Examples
///
/// ```
/// use segmap::{BTreeMapFactory, Map, MapFactory};
///
/// let mut map = MapFactory::<u32>::create_map(&BTreeMapFactory);
/// map.insert(2, "two");
/// map.insert(1, "one");
///
/// let mut keys = Vec::new();
/// map.for_each(|k, _| keys.push(*k));
/// assert_eq!(keys, [1, 2]);
/// ```
pub trait MapFactory<K> {
    /// The type of the maps the factory creates.
    type Output<V>: Map<K, V>;

    /// Creates an empty map.
    fn create_map<V>(&self) -> Self::Output<V>;
}

/// [`HashMapFactory`] creates [`HashMap`] instances sharing a [`BuildHasher`] and a
/// [`SegmentConfig`].
#[derive(Clone, Debug, Default)]
pub struct HashMapFactory<H = RandomState> {
    build_hasher: H,
    config: SegmentConfig,
}

/// [`BTreeMapFactory`] creates [`BTreeMap`] instances for ordered keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct BTreeMapFactory;

impl<H> HashMapFactory<H>
where
    H: BuildHasher + Clone,
{
    /// Creates a [`HashMapFactory`].
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{HashMapFactory, MapFactory, SegmentConfig};
    /// use std::collections::hash_map::RandomState;
    ///
    /// let factory = HashMapFactory::new(RandomState::new(), SegmentConfig::new());
    /// let mut map = MapFactory::<&str>::create_map(&factory);
    /// assert!(map.upsert("a", 1).is_none());
    /// assert_eq!(map.get(&"a"), Ok(&1));
    /// ```
    #[inline]
    pub fn new(build_hasher: H, config: SegmentConfig) -> Self {
        Self {
            build_hasher,
            config,
        }
    }
}

impl<K, H> MapFactory<K> for HashMapFactory<H>
where
    K: Eq + Hash,
    H: BuildHasher + Clone,
{
    type Output<V> = HashMap<K, V, H>;

    /// Creates an empty [`HashMap`].
    ///
    /// # Panics
    ///
    /// Panics if an entry of the value type does not fit the configured segment ceiling.
    #[inline]
    fn create_map<V>(&self) -> Self::Output<V> {
        HashMap::with_config(0, self.build_hasher.clone(), self.config)
    }
}

impl<K> MapFactory<K> for BTreeMapFactory
where
    K: Ord,
{
    type Output<V> = BTreeMap<K, V>;

    #[inline]
    fn create_map<V>(&self) -> Self::Output<V> {
        BTreeMap::new()
    }
}

impl<K, V, H> Map<K, V> for HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    #[inline]
    fn get(&self, key: &K) -> Option<&V> {
        self.try_get(key)
    }

    #[inline]
    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        HashMap::get_mut(self, key)
    }

    #[inline]
    fn insert(&mut self, key: K, val: V) -> Option<V> {
        self.upsert(key, val)
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    #[inline]
    fn contains_key(&self, key: &K) -> bool {
        HashMap::contains_key(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    #[inline]
    fn clear(&mut self) {
        HashMap::clear(self);
    }

    #[inline]
    fn for_each<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.iter().for_each(|(k, v)| f(k, v));
    }
}

impl<K, V> Map<K, V> for BTreeMap<K, V>
where
    K: Ord,
{
    #[inline]
    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    #[inline]
    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        BTreeMap::get_mut(self, key)
    }

    #[inline]
    fn insert(&mut self, key: K, val: V) -> Option<V> {
        BTreeMap::insert(self, key, val)
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    #[inline]
    fn contains_key(&self, key: &K) -> bool {
        BTreeMap::contains_key(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    #[inline]
    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    #[inline]
    fn for_each<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.iter().for_each(|(k, v)| f(k, v));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn exercise<M: Map<u32, String>>(mut map: M) {
        assert!(map.is_empty());
        for k in 0..64 {
            assert!(map.insert(k, k.to_string()).is_none());
        }
        assert_eq!(map.len(), 64);
        assert_eq!(map.insert(7, "seven".to_owned()).as_deref(), Some("7"));
        assert_eq!(map.get(&7).map(String::as_str), Some("seven"));
        if let Some(v) = map.get_mut(&8) {
            v.push('!');
        }
        assert_eq!(map.get(&8).map(String::as_str), Some("8!"));
        assert_eq!(map.remove(&9).as_deref(), Some("9"));
        assert!(map.remove(&9).is_none());
        assert!(!map.contains_key(&9));
        assert!(map.contains_key(&10));

        let mut visited = 0;
        map.for_each(|k, v| {
            assert_ne!(*k, 9);
            assert!(!v.is_empty());
            visited += 1;
        });
        assert_eq!(visited, 63);

        map.clear();
        assert!(map.is_empty());
        assert!(map.get(&0).is_none());
    }

    #[test]
    fn hash_map_factory() {
        let factory = HashMapFactory::<RandomState>::default();
        exercise(MapFactory::<u32>::create_map(&factory));
    }

    #[test]
    fn btree_map_factory() {
        exercise(MapFactory::<u32>::create_map(&BTreeMapFactory));
    }
}
