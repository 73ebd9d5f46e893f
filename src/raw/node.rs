use smallvec::SmallVec;

use super::handle::Handle;
use crate::comparator::Comparator;

/// Inline capacity hints for node storage. The real bound is the tree's
/// runtime `order`: a node holds at most `order - 1` keys plus one slot of
/// transient slack between an insertion and the split check, so small orders
/// never spill to the heap.
const INLINE_KEYS: usize = 8;
const INLINE_CHILDREN: usize = INLINE_KEYS + 1;

/// A single B-tree node: an ordered run of keys, child handles (internal
/// nodes only), and a non-owning back-reference to the parent.
///
/// Node methods only touch this node's own storage. Re-pointing the `parent`
/// of children that move between nodes is the responsibility of the
/// tree-level split/rebalance code.
#[derive(Clone)]
pub(crate) struct Node<K> {
    pub(crate) keys: SmallVec<[K; INLINE_KEYS]>,
    pub(crate) children: SmallVec<[Handle; INLINE_CHILDREN]>,
    pub(crate) parent: Option<Handle>,
    pub(crate) leaf: bool,
}

/// Result of a binary search inside one node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K> Node<K> {
    pub(crate) fn new_leaf() -> Self {
        Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
            parent: None,
            leaf: true,
        }
    }

    pub(crate) fn new_internal() -> Self {
        Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
            parent: None,
            leaf: false,
        }
    }

    /// Returns the number of keys in this node.
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Binary-searches this node's keys under the given comparator.
    #[inline]
    pub(crate) fn search<C>(&self, key: &K, cmp: &C) -> SearchResult
    where
        C: Comparator<K>,
    {
        match self.keys.binary_search_by(|k| cmp.compare(k, key)) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::NotFound(index),
        }
    }

    /// Inserts a key into a leaf, shifting later keys right.
    ///
    /// Returns false (and leaves the node untouched) if the key is already
    /// present. Capacity is deliberately not checked here; the caller must
    /// split afterwards if the node overflowed.
    pub(crate) fn insert_into_leaf<C>(&mut self, key: K, cmp: &C) -> bool
    where
        C: Comparator<K>,
    {
        debug_assert!(self.leaf, "`Node::insert_into_leaf()` called on an internal node");
        match self.search(&key, cmp) {
            SearchResult::Found(_) => false,
            SearchResult::NotFound(index) => {
                self.keys.insert(index, key);
                true
            }
        }
    }

    /// Inserts a promoted key together with the split pair it separates.
    ///
    /// `left` and `right` are the two halves produced by a child split. When
    /// this node already has children, the slot the pre-split child occupied
    /// holds `right` (the original node); it is overwritten with `left` and
    /// `right` is re-inserted just after. A freshly created root has no
    /// children yet and simply adopts both.
    pub(crate) fn insert_into_internal<C>(&mut self, key: K, left: Handle, right: Handle, cmp: &C)
    where
        C: Comparator<K>,
    {
        debug_assert!(!self.leaf, "`Node::insert_into_internal()` called on a leaf");
        match self.search(&key, cmp) {
            SearchResult::Found(_) => {
                unreachable!("promoted separator already present in parent")
            }
            SearchResult::NotFound(index) => {
                self.keys.insert(index, key);
                if self.children.is_empty() {
                    self.children.push(left);
                    self.children.push(right);
                } else {
                    debug_assert_eq!(self.children[index], right);
                    self.children[index] = left;
                    self.children.insert(index + 1, right);
                }
            }
        }
    }

    /// Removes a key from a leaf. Returns false if the key is absent.
    pub(crate) fn delete_from_leaf<C>(&mut self, key: &K, cmp: &C) -> bool
    where
        C: Comparator<K>,
    {
        debug_assert!(self.leaf, "`Node::delete_from_leaf()` called on an internal node");
        match self.search(key, cmp) {
            SearchResult::Found(index) => {
                self.keys.remove(index);
                true
            }
            SearchResult::NotFound(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::comparator::Natural;

    use super::*;

    #[test]
    fn search_reports_position_or_insertion_point() {
        let mut node: Node<i32> = Node::new_leaf();
        for k in [10, 20, 30] {
            assert!(node.insert_into_leaf(k, &Natural));
        }

        assert_eq!(node.search(&20, &Natural), SearchResult::Found(1));
        assert_eq!(node.search(&5, &Natural), SearchResult::NotFound(0));
        assert_eq!(node.search(&25, &Natural), SearchResult::NotFound(2));
        assert_eq!(node.search(&35, &Natural), SearchResult::NotFound(3));
    }

    #[test]
    fn leaf_insert_rejects_duplicates_and_keeps_order() {
        let mut node: Node<i32> = Node::new_leaf();
        for k in [3, 1, 2] {
            assert!(node.insert_into_leaf(k, &Natural));
        }
        assert!(!node.insert_into_leaf(2, &Natural));
        assert_eq!(node.keys.as_slice(), [1, 2, 3]);
    }

    #[test]
    fn leaf_delete_reports_misses() {
        let mut node: Node<i32> = Node::new_leaf();
        node.insert_into_leaf(7, &Natural);
        assert!(node.delete_from_leaf(&7, &Natural));
        assert!(!node.delete_from_leaf(&7, &Natural));
        assert_eq!(node.key_count(), 0);
    }

    #[test]
    fn internal_insert_brackets_the_split_pair() {
        let a = Handle::from_index(0);
        let b = Handle::from_index(1);
        let c = Handle::from_index(2);

        let mut root: Node<i32> = Node::new_internal();
        root.insert_into_internal(10, a, b, &Natural);
        assert_eq!(root.children.as_slice(), [a, b]);

        // Splitting the child in slot 1 promotes 20; `b` stays as the right
        // half and `c` becomes the new left sibling.
        root.insert_into_internal(20, c, b, &Natural);
        assert_eq!(root.keys.as_slice(), [10, 20]);
        assert_eq!(root.children.as_slice(), [a, c, b]);
    }
}
