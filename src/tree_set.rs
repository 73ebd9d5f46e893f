//! An ordered set backed by a B-tree of caller-chosen order.

use alloc::vec::Vec;
use core::fmt;
use core::iter::FusedIterator;

use crate::comparator::{Comparator, Natural};
use crate::error::Error;
use crate::raw::{Handle, RawTree};

/// Smallest supported B-tree order; order 2 would be a binary tree with no
/// room to split around a median.
const MIN_ORDER: usize = 3;

/// An ordered set backed by a B-tree whose order (maximum children per
/// internal node) is chosen at construction time.
///
/// Keys are ordered by an injected [`Comparator`]; the default [`Natural`]
/// comparator uses the key type's [`Ord`]. Duplicate inserts are rejected by
/// return value, not treated as errors.
///
/// # Examples
///
/// ```
/// use mway_tree::MwayTreeSet;
///
/// let mut set = MwayTreeSet::new(5)?;
/// for k in [40, 10, 30, 20] {
///     set.insert(k);
/// }
///
/// assert_eq!(set.len(), 4);
/// assert!(set.contains(&30));
/// assert!(set.remove(&30));
/// assert_eq!(set.to_sorted_vec(), [10, 20, 40]);
/// # Ok::<(), mway_tree::Error>(())
/// ```
#[derive(Clone)]
pub struct MwayTreeSet<K, C = Natural> {
    raw: RawTree<K, C>,
}

impl<K: Ord> MwayTreeSet<K, Natural> {
    /// Creates an empty set of the given order under the natural key order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::{Error, MwayTreeSet};
    ///
    /// let set: MwayTreeSet<i32> = MwayTreeSet::new(7)?;
    /// assert!(set.is_empty());
    ///
    /// assert!(matches!(
    ///     MwayTreeSet::<i32>::new(2),
    ///     Err(Error::InvalidOrder { order: 2 })
    /// ));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn new(order: usize) -> Result<Self, Error> {
        Self::with_comparator(order, Natural)
    }

    /// Builds a set of the given order from an unsorted, possibly duplicated
    /// collection in a single linear pass.
    ///
    /// This produces a tree of minimum height directly, instead of `n`
    /// root-to-leaf insertions. Duplicates collapse to one member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::MwayTreeSet;
    ///
    /// let set = MwayTreeSet::from_items([3, 1, 4, 1, 5, 9, 2, 6], 4)?;
    /// assert_eq!(set.len(), 7);
    /// assert_eq!(set.to_sorted_vec(), [1, 2, 3, 4, 5, 6, 9]);
    /// # Ok::<(), mway_tree::Error>(())
    /// ```
    pub fn from_items<I>(items: I, order: usize) -> Result<Self, Error>
    where
        I: IntoIterator<Item = K>,
    {
        Self::from_items_with_comparator(items, order, Natural)
    }
}

impl<K, C: Comparator<K>> MwayTreeSet<K, C> {
    /// Creates an empty set of the given order under a caller-supplied
    /// comparator. Closures of type `Fn(&K, &K) -> Ordering` work directly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::MwayTreeSet;
    ///
    /// let mut set = MwayTreeSet::with_comparator(4, |a: &i32, b: &i32| b.cmp(a))?;
    /// set.insert(1);
    /// set.insert(2);
    /// set.insert(3);
    /// assert_eq!(set.to_sorted_vec(), [3, 2, 1]);
    /// # Ok::<(), mway_tree::Error>(())
    /// ```
    pub fn with_comparator(order: usize, comparator: C) -> Result<Self, Error> {
        if order < MIN_ORDER {
            return Err(Error::InvalidOrder { order });
        }
        Ok(Self {
            raw: RawTree::new(order, comparator),
        })
    }

    /// Bulk construction under a caller-supplied comparator; see
    /// [`from_items`](MwayTreeSet::from_items).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order < 3`.
    pub fn from_items_with_comparator<I>(items: I, order: usize, comparator: C) -> Result<Self, Error>
    where
        I: IntoIterator<Item = K>,
    {
        let mut set = Self::with_comparator(order, comparator)?;
        set.raw.bulk_load(items.into_iter().collect());
        Ok(set)
    }

    /// Inserts a key, returning true iff it was not already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::MwayTreeSet;
    ///
    /// let mut set = MwayTreeSet::new(3)?;
    /// assert!(set.insert(7));
    /// assert!(!set.insert(7));
    /// # Ok::<(), mway_tree::Error>(())
    /// ```
    pub fn insert(&mut self, key: K) -> bool {
        self.raw.insert(key)
    }

    /// Removes a key, returning true iff it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.raw.remove(key)
    }

    /// Returns true if the set contains the key.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.raw.contains(key)
    }

    /// Walks the whole tree and panics on any structural violation.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        self.raw.check_invariants();
    }
}

impl<K, C> MwayTreeSet<K, C> {
    /// Returns the number of keys in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns true if the set holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the height of the tree: the number of levels from the root to
    /// the leaves, counted from 1. An empty set has height 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::MwayTreeSet;
    ///
    /// let mut set = MwayTreeSet::new(3)?;
    /// assert_eq!(set.height(), 0);
    /// set.insert(1);
    /// assert_eq!(set.height(), 1);
    /// set.insert(2);
    /// set.insert(3); // the root splits
    /// assert_eq!(set.height(), 2);
    /// # Ok::<(), mway_tree::Error>(())
    /// ```
    #[must_use]
    pub const fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the order the set was constructed with.
    #[must_use]
    pub const fn order(&self) -> usize {
        self.raw.order()
    }

    /// Returns the maximum number of keys a node may hold (`order - 1`).
    #[must_use]
    pub const fn max_keys_per_node(&self) -> usize {
        self.raw.max_keys()
    }

    /// Returns the minimum number of keys a non-root node must hold
    /// (`ceil(order / 2) - 1`).
    #[must_use]
    pub const fn min_keys_per_node(&self) -> usize {
        self.raw.min_keys()
    }

    /// Removes all keys, keeping the order and comparator.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns a borrowing in-order iterator over the keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::MwayTreeSet;
    ///
    /// let set = MwayTreeSet::from_items([2, 3, 1], 3)?;
    /// let doubled: Vec<i32> = set.iter().map(|k| k * 2).collect();
    /// assert_eq!(doubled, [2, 4, 6]);
    /// # Ok::<(), mway_tree::Error>(())
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, C> {
        let mut iter = Iter {
            raw: &self.raw,
            stack: Vec::new(),
            remaining: self.raw.len(),
        };
        if let Some(root) = self.raw.root() {
            iter.descend_left(root);
        }
        iter
    }

    /// Returns the keys in comparator order as a `Vec`.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Returns a [`Cursor`] over a snapshot of the current keys.
    ///
    /// The cursor is detached: its methods take the set as an argument, and a
    /// version check fails them with [`Error::ConcurrentModification`] if the
    /// set was mutated other than through [`Cursor::remove`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mway_tree::MwayTreeSet;
    ///
    /// let mut set = MwayTreeSet::from_items(1..=6, 3)?;
    ///
    /// // Delete the even keys while traversing.
    /// let mut cursor = set.cursor();
    /// while let Some(&k) = cursor.next(&set)? {
    ///     if k % 2 == 0 {
    ///         cursor.remove(&mut set)?;
    ///     }
    /// }
    /// assert_eq!(set.to_sorted_vec(), [1, 3, 5]);
    /// # Ok::<(), mway_tree::Error>(())
    /// ```
    #[must_use]
    pub fn cursor(&self) -> Cursor<K>
    where
        K: Clone,
    {
        Cursor {
            snapshot: self.to_sorted_vec(),
            position: 0,
            expected_version: self.raw.version(),
            removable: false,
        }
    }
}

impl<K: fmt::Debug, C> fmt::Debug for MwayTreeSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K, C> IntoIterator for &'a MwayTreeSet<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A borrowing in-order iterator over a [`MwayTreeSet`].
///
/// Traversal is iterative: the stack holds one `(node, keys yielded)` frame
/// per level, so depth is bounded by the tree height.
pub struct Iter<'a, K, C> {
    raw: &'a RawTree<K, C>,
    stack: Vec<(Handle, usize)>,
    remaining: usize,
}

impl<K, C> Iter<'_, K, C> {
    /// Pushes `handle` and its chain of leftmost descendants.
    fn descend_left(&mut self, mut handle: Handle) {
        loop {
            self.stack.push((handle, 0));
            let node = self.raw.node(handle);
            if node.leaf {
                return;
            }
            handle = node.children[0];
        }
    }
}

impl<'a, K, C> Iterator for Iter<'a, K, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.raw;
        loop {
            let &(handle, index) = self.stack.last()?;
            let node = raw.node(handle);

            if index < node.key_count() {
                // This frame owes another key. For an internal node the
                // subtree to the key's right comes before the frame's next
                // key, so queue its leftmost descent now.
                self.stack
                    .last_mut()
                    .expect("frame checked above")
                    .1 = index + 1;
                if !node.leaf {
                    self.descend_left(node.children[index + 1]);
                }
                self.remaining -= 1;
                return Some(&node.keys[index]);
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, C> ExactSizeIterator for Iter<'_, K, C> {}
impl<K, C> FusedIterator for Iter<'_, K, C> {}

/// A detached cursor over a snapshot of a [`MwayTreeSet`], supporting removal
/// of the last-yielded key during traversal.
///
/// The cursor stores the set's version at creation. [`next`](Cursor::next)
/// and [`remove`](Cursor::remove) re-check that version against the live set:
/// any other mutation of the set invalidates the cursor with
/// [`Error::ConcurrentModification`]. A removal through the cursor re-arms it
/// with the set's new version, so traversal continues.
pub struct Cursor<K> {
    snapshot: Vec<K>,
    position: usize,
    expected_version: u64,
    removable: bool,
}

impl<K> Cursor<K> {
    /// Advances to the next key of the snapshot, or `Ok(None)` when the
    /// snapshot is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the set was mutated
    /// since this cursor was created or last removed through.
    pub fn next<'a, C>(&'a mut self, set: &MwayTreeSet<K, C>) -> Result<Option<&'a K>, Error> {
        if set.raw.version() != self.expected_version {
            return Err(Error::ConcurrentModification);
        }
        if self.position >= self.snapshot.len() {
            return Ok(None);
        }
        self.position += 1;
        self.removable = true;
        Ok(Some(&self.snapshot[self.position - 1]))
    }

    /// Removes the key most recently yielded by [`next`](Cursor::next) from
    /// the set, then re-arms the cursor against the set's new version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentModification`] if the set was mutated
    /// behind the cursor's back, and [`Error::InvalidCursorState`] if no key
    /// has been yielded yet or the last-yielded key was already removed.
    pub fn remove<C: Comparator<K>>(&mut self, set: &mut MwayTreeSet<K, C>) -> Result<(), Error> {
        if set.raw.version() != self.expected_version {
            return Err(Error::ConcurrentModification);
        }
        if !self.removable {
            return Err(Error::InvalidCursorState);
        }

        let key = &self.snapshot[self.position - 1];
        let removed = set.raw.remove(key);
        debug_assert!(removed, "snapshot key missing from the set");

        self.expected_version = set.raw.version();
        self.removable = false;
        Ok(())
    }
}
