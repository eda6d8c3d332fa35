//! Collection aliases used by the decomposition internals.
//!
//! Hash-based scratch structures use `rustc_hash::FxHasher`; small per-bucket
//! lists use `SmallVec` to stay on the stack in the common case. Results that
//! callers iterate (neighbor sets) use ordered std collections instead, so
//! their iteration order is reproducible.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Fast non-cryptographic `HashMap` for internal lookups.
///
/// ⚠️ **Not DoS-resistant**: only use with keys derived from trusted data.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(7, 1);
/// assert_eq!(map.get(&7), Some(&1));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast non-cryptographic `HashSet` for internal membership tests.
pub type FastHashSet<T> = FxHashSet<T>;

/// Build hasher backing [`FastHashMap`] and [`FastHashSet`].
pub type FastBuildHasher = FxBuildHasher;

/// Stack-allocated vector for small collections, spilling to the heap past `N`.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a [`FastHashMap`] with at least `capacity` slots.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with at least `capacity` slots.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}
