//! Key comparators

use std::cmp::Ordering;

/// Total order over stored keys
///
/// Two keys comparing `Equal` are the same element; the list keeps at most
/// one of them.
pub trait Comparator<K> {
    fn compare(&self, a: &K, b: &K) -> Ordering;

    fn less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Orders keys by their `Ord` impl
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<K: Ord> Comparator<K> for NaturalOrder {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders `(key, value)` pairs by key alone; the value is a passenger
#[derive(Debug, Clone, Copy, Default)]
pub struct ByKey<C>(pub C);

impl<K, V, C: Comparator<K>> Comparator<(K, V)> for ByKey<C> {
    fn compare(&self, a: &(K, V), b: &(K, V)) -> Ordering {
        self.0.compare(&a.0, &b.0)
    }
}
