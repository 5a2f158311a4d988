//! Prime bucket counts.

/// The largest bucket count, and therefore the largest number of entry slots, of a hash table.
pub(crate) const MAX_PRIME: usize = 0x7FEF_FFFD;

/// Primes found beyond [`PRIMES`] must not be congruent to `1` modulo this value.
const HASH_PRIME: usize = 101;

/// Roughly 1.2x apart, covering the bucket counts most tables go through.
const PRIMES: [usize; 72] = [
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103,
    12143, 14591, 17519, 21023, 25229, 30293, 36353, 43627, 52361, 62851, 75431, 90523, 108_631,
    130_363, 156_437, 187_751, 225_307, 270_371, 324_449, 389_357, 467_237, 560_689, 672_827,
    807_403, 968_897, 1_162_687, 1_395_263, 1_674_319, 2_009_191, 2_411_033, 2_893_249,
    3_471_899, 4_166_287, 4_999_559, 5_999_471, 7_199_369,
];

/// Returns `true` if `candidate` is a prime number.
pub(crate) fn is_prime(candidate: usize) -> bool {
    if candidate & 1 == 0 {
        return candidate == 2;
    }
    let mut divisor = 3;
    while divisor * divisor <= candidate {
        if candidate % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    candidate != 1
}

/// Returns the smallest usable prime that is equal to or greater than `min`.
pub(crate) fn get_prime(min: usize) -> usize {
    if let Some(prime) = PRIMES.iter().copied().find(|prime| *prime >= min) {
        return prime;
    }
    let mut candidate = min | 1;
    while candidate < MAX_PRIME {
        if is_prime(candidate) && (candidate - 1) % HASH_PRIME != 0 {
            return candidate;
        }
        candidate += 2;
    }
    min
}

/// Returns the bucket count to grow into from `old_size`: a prime at least twice as large,
/// capped at [`MAX_PRIME`].
pub(crate) fn expand_prime(old_size: usize) -> usize {
    let new_size = old_size.saturating_mul(2);
    if new_size > MAX_PRIME && MAX_PRIME > old_size {
        return MAX_PRIME;
    }
    get_prime(new_size)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_prime_and_sorted() {
        assert!(PRIMES.iter().all(|p| is_prime(*p)));
        assert!(PRIMES.windows(2).all(|w| w[0] < w[1]));
        assert!(is_prime(MAX_PRIME));
        assert!(is_prime(2));
        assert!(!is_prime(1));
        assert!(!is_prime(0));
        assert!(!is_prime(9));
        assert!(!is_prime(7_199_369 * 3));
    }

    #[test]
    fn get_prime_bounds() {
        assert_eq!(get_prime(0), 3);
        assert_eq!(get_prime(3), 3);
        assert_eq!(get_prime(4), 7);
        assert_eq!(get_prime(100), 107);
        let beyond = get_prime(7_199_370);
        assert!(beyond >= 7_199_370);
        assert!(is_prime(beyond));
        assert_ne!((beyond - 1) % HASH_PRIME, 0);
    }

    #[test]
    fn expand_prime_doubles() {
        let mut size = 3;
        for _ in 0..20 {
            let next = expand_prime(size);
            assert!(next >= size * 2);
            assert!(is_prime(next));
            size = next;
        }
        assert_eq!(expand_prime(MAX_PRIME / 2 + 1), MAX_PRIME);
    }
}
