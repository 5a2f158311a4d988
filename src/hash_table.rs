pub(crate) mod primes;
pub(crate) mod slot;

use std::hash::{BuildHasher, Hash, Hasher};

/// `HashTable` defines common functions for hash table implementations.
pub(crate) trait HashTable<H: BuildHasher> {
    /// Returns a reference to its [`BuildHasher`].
    fn hasher(&self) -> &H;

    /// Returns the 31-bit hash value of the key.
    ///
    /// The top bit is always clear so that negative values can mark free slots.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Intended truncation.
    #[inline]
    fn hash<Q: Hash + ?Sized>(&self, key: &Q) -> i32 {
        let mut h = self.hasher().build_hasher();
        key.hash(&mut h);
        let mut hash = h.finish();

        // Bitmix: https://mostlymangling.blogspot.com/2019/01/better-stronger-mixer-and-test-procedure.html
        hash ^= hash.rotate_right(25) ^ hash.rotate_right(50);
        hash = hash.wrapping_mul(0xA24B_AED4_963E_E407);
        hash ^= hash.rotate_right(24) ^ hash.rotate_right(49);
        hash = hash.wrapping_mul(0x9FB2_1C65_1E98_DF25);
        hash ^= hash >> 28;

        (((hash >> 32) ^ hash) as u32 & 0x7FFF_FFFF) as i32
    }
}
