//! Borrowed-key lookups, mirroring the [`equivalent`](https://crates.io/crates/equivalent)
//! crate so that enabling the `equivalent` feature does not change any signature.

use std::borrow::Borrow;

/// [`Equivalent`] lets a [`HashMap`](crate::HashMap) be queried with a type other than its
/// key type.
///
/// The query must hash exactly like the key it is equivalent to.
///
/// # Examples
///
/// ```
/// use segmap::{Equivalent, HashMap};
/// use std::hash::{Hash, Hasher};
///
/// #[derive(Eq, PartialEq)]
/// struct Path(String, u32);
///
/// impl Hash for Path {
///     fn hash<H: Hasher>(&self, state: &mut H) {
///         self.0.hash(state);
///     }
/// }
///
/// impl Equivalent<Path> for str {
///     fn equivalent(&self, key: &Path) -> bool {
///         key.0 == self
///     }
/// }
///
/// let mut hashmap: HashMap<Path, u32> = HashMap::default();
/// hashmap.upsert(Path("/tmp".to_owned(), 1), 7);
/// assert_eq!(hashmap.get("/tmp"), Ok(&7));
/// ```
pub trait Equivalent<K: ?Sized> {
    /// Returns `true` if `self` and `key` denote the same entry.
    fn equivalent(&self, key: &K) -> bool;
}

impl<Q: ?Sized, K: ?Sized> Equivalent<K> for Q
where
    Q: Eq,
    K: Borrow<Q>,
{
    #[inline]
    fn equivalent(&self, key: &K) -> bool {
        PartialEq::eq(self, key.borrow())
    }
}
