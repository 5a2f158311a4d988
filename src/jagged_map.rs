//! [`JaggedMap`] is a map keyed by fixed-length key paths, built from nested maps.

use std::fmt::{self, Debug};

use super::map::{HashMapFactory, Map, MapFactory};
use super::Error;

/// [`JaggedMap`] maps a path of exactly [`depth`](Self::depth) keys to a value.
///
/// Every key of a path selects a map of the next level; intermediate maps are created on demand
/// by the [`MapFactory`] and are kept once created, even when every entry under them has been
/// removed.
///
/// # Examples
///
/// ```
/// use segmap::{Error, JaggedMap};
///
/// let mut jagged: JaggedMap<&str, u32> = JaggedMap::new(2).unwrap();
///
/// assert!(jagged.insert(&["a", "x"], 1).is_ok());
/// assert!(jagged.insert(&["a", "y"], 2).is_ok());
/// assert_eq!(jagged.get(&["a", "y"]), Ok(&2));
/// assert_eq!(jagged.get(&["b", "x"]), Err(Error::KeyNotFound));
/// assert!(matches!(jagged.get(&["a"]), Err(Error::InvalidArgument(_))));
/// assert_eq!(jagged.len(), 2);
/// ```
pub struct JaggedMap<K, V, F = HashMapFactory>
where
    F: MapFactory<K>,
{
    depth: usize,
    len: usize,
    factory: F,
    branches: Vec<F::Output<usize>>,
    leaves: Vec<F::Output<V>>,
}

impl<K, V, F> JaggedMap<K, V, F>
where
    K: Clone,
    F: MapFactory<K>,
{
    /// Creates an empty [`JaggedMap`] of the given depth with a default [`MapFactory`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `depth` is zero.
    #[inline]
    pub fn new(depth: usize) -> Result<Self, Error>
    where
        F: Default,
    {
        Self::with_factory(depth, F::default())
    }

    /// Creates an empty [`JaggedMap`] of the given depth with the supplied [`MapFactory`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `depth` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{BTreeMapFactory, JaggedMap};
    ///
    /// let mut jagged: JaggedMap<u32, char, BTreeMapFactory> =
    ///     JaggedMap::with_factory(3, BTreeMapFactory).unwrap();
    /// jagged.upsert(&[2, 0, 0], 'c').unwrap();
    /// jagged.upsert(&[1, 9, 9], 'b').unwrap();
    /// jagged.upsert(&[1, 0, 5], 'a').unwrap();
    ///
    /// let mut visited = String::new();
    /// jagged.for_each(|_, v| visited.push(*v));
    /// assert_eq!(visited, "abc");
    ///
    /// assert!(JaggedMap::<u32, char, BTreeMapFactory>::with_factory(0, BTreeMapFactory).is_err());
    /// ```
    pub fn with_factory(depth: usize, factory: F) -> Result<Self, Error> {
        if depth == 0 {
            return Err(Error::InvalidArgument("depth must be at least one"));
        }
        let mut jagged = Self {
            depth,
            len: 0,
            factory,
            branches: Vec::new(),
            leaves: Vec::new(),
        };
        jagged.plant_root();
        Ok(jagged)
    }

    /// Returns the number of keys in every key path.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the [`JaggedMap`] holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the value at the key path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `keys` does not have exactly
    /// [`depth`](Self::depth) keys, and [`Error::KeyNotFound`] if the path is absent.
    #[inline]
    pub fn get(&self, keys: &[K]) -> Result<&V, Error> {
        self.check(keys)?;
        self.find(keys).ok_or(Error::KeyNotFound)
    }

    /// Returns a reference to the value at the key path, or `None`.
    ///
    /// A key path of the wrong length is never present.
    #[inline]
    pub fn try_get(&self, keys: &[K]) -> Option<&V> {
        self.check(keys).ok()?;
        self.find(keys)
    }

    /// Returns `true` if a value exists at the key path.
    #[inline]
    pub fn contains_key(&self, keys: &[K]) -> bool {
        self.try_get(keys).is_some()
    }

    /// Inserts or overwrites the value at the key path, returning the replaced value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `keys` does not have exactly
    /// [`depth`](Self::depth) keys.
    pub fn upsert(&mut self, keys: &[K], val: V) -> Result<Option<V>, Error> {
        self.check(keys)?;
        let leaf = self.open_leaf(keys);
        let old = self.leaves[leaf].insert(keys[self.depth - 1].clone(), val);
        if old.is_none() {
            self.len += 1;
        }
        Ok(old)
    }

    /// Inserts a value at a vacant key path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `keys` does not have exactly
    /// [`depth`](Self::depth) keys, and [`Error::DuplicateKey`] if the path is occupied.
    pub fn insert(&mut self, keys: &[K], val: V) -> Result<(), Error> {
        self.check(keys)?;
        if self.find(keys).is_some() {
            return Err(Error::DuplicateKey);
        }
        self.upsert(keys, val).map(|_| ())
    }

    /// Removes the value at the key path.
    ///
    /// Returns `true` if a value was removed. Intermediate maps are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `keys` does not have exactly
    /// [`depth`](Self::depth) keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::JaggedMap;
    ///
    /// let mut jagged: JaggedMap<u8, u8> = JaggedMap::new(2).unwrap();
    /// jagged.upsert(&[1, 2], 3).unwrap();
    ///
    /// assert_eq!(jagged.remove(&[1, 2]), Ok(true));
    /// assert_eq!(jagged.remove(&[1, 2]), Ok(false));
    /// assert!(jagged.remove(&[1]).is_err());
    /// ```
    pub fn remove(&mut self, keys: &[K]) -> Result<bool, Error> {
        self.check(keys)?;
        let Some(leaf) = self.find_leaf(keys) else {
            return Ok(false);
        };
        if self.leaves[leaf].remove(&keys[self.depth - 1]).is_some() {
            self.len -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Removes every value and every intermediate map.
    pub fn clear(&mut self) {
        self.branches.clear();
        self.leaves.clear();
        self.len = 0;
        self.plant_root();
    }

    /// Invokes `f` on every key path and its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::JaggedMap;
    ///
    /// let mut jagged: JaggedMap<u32, u32> = JaggedMap::new(2).unwrap();
    /// jagged.upsert(&[1, 2], 3).unwrap();
    /// jagged.upsert(&[4, 5], 9).unwrap();
    ///
    /// let mut sum = 0;
    /// jagged.for_each(|keys, v| sum += keys.iter().sum::<u32>() + *v);
    /// assert_eq!(sum, 24);
    /// ```
    pub fn for_each<G: FnMut(&[K], &V)>(&self, mut f: G) {
        let mut path = Vec::with_capacity(self.depth);
        if self.depth == 1 {
            self.visit_leaf(0, &mut path, &mut f);
        } else {
            self.visit_branch(0, 0, &mut path, &mut f);
        }
    }

    /// Returns `true` if any key path holds a value equal to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.leaves.iter().any(|leaf| {
            let mut found = false;
            leaf.for_each(|_, v| found |= v == value);
            found
        })
    }

    /// Clones every key path and its value into `destination`, starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `index` is out of range or the values do not fit
    /// in the rest of `destination`; `destination` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use segmap::{BTreeMapFactory, JaggedMap};
    ///
    /// let mut jagged: JaggedMap<u8, char, BTreeMapFactory> =
    ///     JaggedMap::with_factory(2, BTreeMapFactory).unwrap();
    /// jagged.upsert(&[1, 2], 'a').unwrap();
    /// jagged.upsert(&[0, 7], 'b').unwrap();
    ///
    /// let mut destination = vec![(Vec::new(), ' '); 3];
    /// assert!(jagged.copy_to(&mut destination, 1).is_ok());
    /// assert_eq!(destination[1], (vec![0, 7], 'b'));
    /// assert_eq!(destination[2], (vec![1, 2], 'a'));
    /// assert!(jagged.copy_to(&mut destination, 2).is_err());
    /// ```
    pub fn copy_to(&self, destination: &mut [(Vec<K>, V)], index: usize) -> Result<(), Error>
    where
        V: Clone,
    {
        if index > destination.len() {
            return Err(Error::InvalidArgument(
                "index is outside of the destination",
            ));
        }
        if destination.len() - index < self.len {
            return Err(Error::InvalidArgument(
                "destination is too small to hold every value",
            ));
        }
        let mut targets = destination[index..].iter_mut();
        self.for_each(|keys, val| {
            if let Some(target) = targets.next() {
                *target = (keys.to_vec(), val.clone());
            }
        });
        Ok(())
    }

    fn check(&self, keys: &[K]) -> Result<(), Error> {
        if keys.len() == self.depth {
            Ok(())
        } else {
            Err(Error::InvalidArgument(
                "the number of keys does not match the depth",
            ))
        }
    }

    fn plant_root(&mut self) {
        if self.depth == 1 {
            self.leaves.push(self.factory.create_map());
        } else {
            self.branches.push(self.factory.create_map());
        }
    }

    fn find(&self, keys: &[K]) -> Option<&V> {
        let leaf = self.find_leaf(keys)?;
        self.leaves[leaf].get(&keys[self.depth - 1])
    }

    /// Returns the index of the leaf map the key path ends in, if it exists.
    fn find_leaf(&self, keys: &[K]) -> Option<usize> {
        let mut node = 0;
        for key in &keys[..self.depth - 1] {
            node = *self.branches[node].get(key)?;
        }
        Some(node)
    }

    /// Returns the index of the leaf map the key path ends in, creating missing maps.
    fn open_leaf(&mut self, keys: &[K]) -> usize {
        let last = self.depth - 1;
        let mut node = 0;
        for (level, key) in keys[..last].iter().enumerate() {
            let existing = self.branches[node].get(key).copied();
            node = if let Some(child) = existing {
                child
            } else {
                let child = if level + 1 == last {
                    self.leaves.push(self.factory.create_map());
                    self.leaves.len() - 1
                } else {
                    self.branches.push(self.factory.create_map());
                    self.branches.len() - 1
                };
                self.branches[node].insert(key.clone(), child);
                child
            };
        }
        node
    }

    fn visit_branch<G: FnMut(&[K], &V)>(
        &self,
        level: usize,
        node: usize,
        path: &mut Vec<K>,
        f: &mut G,
    ) {
        self.branches[node].for_each(|key, child| {
            path.push(key.clone());
            if level + 2 == self.depth {
                self.visit_leaf(*child, path, f);
            } else {
                self.visit_branch(level + 1, *child, path, f);
            }
            path.pop();
        });
    }

    fn visit_leaf<G: FnMut(&[K], &V)>(&self, leaf: usize, path: &mut Vec<K>, f: &mut G) {
        self.leaves[leaf].for_each(|key, val| {
            path.push(key.clone());
            f(path.as_slice(), val);
            path.pop();
        });
    }
}

impl<K, V, F> Debug for JaggedMap<K, V, F>
where
    F: MapFactory<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JaggedMap")
            .field("depth", &self.depth)
            .field("len", &self.len)
            .field("maps", &(self.branches.len() + self.leaves.len()))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BTreeMapFactory;

    #[test]
    fn intermediate_maps_are_kept() {
        let mut jagged: JaggedMap<u8, u8> = JaggedMap::new(3).unwrap();
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (1, 0));

        jagged.upsert(&[1, 2, 3], 0).unwrap();
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (2, 1));
        jagged.upsert(&[1, 2, 4], 0).unwrap();
        jagged.upsert(&[1, 5, 4], 0).unwrap();
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (2, 2));

        assert_eq!(jagged.remove(&[1, 5, 4]), Ok(true));
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (2, 2));
        assert!(!jagged.contains_key(&[1, 5, 4]));

        assert_eq!(jagged.insert(&[9, 9, 9], 0), Ok(()));
        assert_eq!(jagged.insert(&[9, 9, 9], 1), Err(Error::DuplicateKey));
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (3, 3));

        jagged.clear();
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (1, 0));
        assert!(jagged.is_empty());
    }

    #[test]
    fn lookups_do_not_create_maps() {
        let mut jagged: JaggedMap<u8, u8, BTreeMapFactory> =
            JaggedMap::with_factory(2, BTreeMapFactory).unwrap();
        assert_eq!(jagged.get(&[1, 2]), Err(Error::KeyNotFound));
        assert_eq!(jagged.remove(&[1, 2]), Ok(false));
        assert!(jagged.try_get(&[1, 2]).is_none());
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (1, 0));

        assert!(matches!(
            jagged.upsert(&[1, 2, 3], 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(jagged.insert(&[], 0), Err(Error::InvalidArgument(_))));
        assert_eq!((jagged.branches.len(), jagged.leaves.len()), (1, 0));
    }

    #[test]
    fn copy_to_bounds() {
        let mut jagged: JaggedMap<u8, u8> = JaggedMap::new(3).unwrap();
        jagged.upsert(&[1, 2, 3], 6).unwrap();
        jagged.upsert(&[4, 5, 6], 15).unwrap();

        let mut destination = vec![(Vec::new(), 0); 2];
        assert!(matches!(
            jagged.copy_to(&mut destination, 3),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            jagged.copy_to(&mut destination, 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(destination.iter().all(|(keys, v)| keys.is_empty() && *v == 0));

        assert!(jagged.copy_to(&mut destination, 0).is_ok());
        destination.sort_unstable();
        assert_eq!(destination, [(vec![1, 2, 3], 6), (vec![4, 5, 6], 15)]);

        assert!(jagged.copy_to(&mut destination[2..], 0).is_err());
        jagged.clear();
        assert!(jagged.copy_to(&mut destination[2..], 0).is_ok());
    }

    #[test]
    fn single_level() {
        let mut jagged: JaggedMap<String, u32> = JaggedMap::new(1).unwrap();
        assert_eq!(jagged.upsert(&["a".to_owned()], 1), Ok(None));
        assert_eq!(jagged.upsert(&["a".to_owned()], 2), Ok(Some(1)));
        assert_eq!(jagged.get(&["a".to_owned()]), Ok(&2));
        assert!(jagged.contains_value(&2));
        assert!(!jagged.contains_value(&1));
        assert_eq!(jagged.len(), 1);

        let mut paths = Vec::new();
        jagged.for_each(|keys, v| paths.push((keys.to_vec(), *v)));
        assert_eq!(paths, [(vec!["a".to_owned()], 2)]);
    }
}
