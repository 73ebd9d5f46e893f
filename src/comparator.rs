use core::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Every ordering decision inside the tree goes through an explicit
/// comparator value instead of an implicit `Ord` bound, so the same key type
/// can be stored under different orders and the core carries no hidden
/// global state.
///
/// Closures of type `Fn(&K, &K) -> Ordering` implement this trait, so an
/// ad-hoc order never needs a named type:
///
/// ```
/// use mway_tree::MwayTreeSet;
///
/// let mut set =
///     MwayTreeSet::with_comparator(4, |a: &i32, b: &i32| b.cmp(a)).unwrap();
/// set.insert(1);
/// set.insert(2);
/// set.insert(3);
/// assert_eq!(set.to_sorted_vec(), [3, 2, 1]);
/// ```
pub trait Comparator<K> {
    /// Compares two keys, returning their relative order.
    ///
    /// Must be a total order: antisymmetric, transitive, and total. The tree
    /// treats `Ordering::Equal` as "same key".
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

/// The natural order of a key type, via its [`Ord`] implementation.
///
/// This is the default comparator of [`MwayTreeSet`](crate::MwayTreeSet).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Natural;

impl<K: Ord> Comparator<K> for Natural {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}

impl<K, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering {
        self(lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_matches_ord() {
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
        assert_eq!(Natural.compare(&2, &2), Ordering::Equal);
        assert_eq!(Natural.compare(&3, &2), Ordering::Greater);
    }

    #[test]
    fn closure_comparator() {
        let reverse = |a: &u32, b: &u32| b.cmp(a);
        assert_eq!(reverse.compare(&1, &2), Ordering::Greater);
        assert_eq!(reverse.compare(&2, &1), Ordering::Less);
    }
}
