use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::mem;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, SearchResult};
use crate::comparator::Comparator;

/// The core B-tree implementation backing `MwayTreeSet`.
///
/// All structural mutation funnels through [`insert`](Self::insert) and
/// [`remove`](Self::remove); overflow repair (split) and underflow repair
/// (borrow/merge) walk toward the root iteratively, so the mutation depth is
/// bounded by the tree height rather than the call stack.
#[derive(Clone)]
pub(crate) struct RawTree<K, C> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// The injected total order over keys.
    comparator: C,
    /// Maximum number of children of an internal node; fixed at construction.
    order: usize,
    /// `order - 1`.
    max_keys: usize,
    /// `ceil(order / 2) - 1`; the root is exempt.
    min_keys: usize,
    /// Levels from root to leaves, counted from 1; 0 when empty.
    height: usize,
    /// Total number of keys.
    len: usize,
    /// Bumped by every structural mutation; guards outstanding cursors.
    version: u64,
}

impl<K, C> RawTree<K, C> {
    pub(crate) fn new(order: usize, comparator: C) -> Self {
        debug_assert!(order >= 3, "`RawTree::new()` - `order` must be validated by the caller");
        Self {
            nodes: Arena::new(),
            root: None,
            comparator,
            order,
            max_keys: order - 1,
            min_keys: order.div_ceil(2) - 1,
            height: 0,
            len: 0,
            version: 0,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    pub(crate) const fn order(&self) -> usize {
        self.order
    }

    pub(crate) const fn max_keys(&self) -> usize {
        self.max_keys
    }

    pub(crate) const fn min_keys(&self) -> usize {
        self.min_keys
    }

    pub(crate) const fn version(&self) -> u64 {
        self.version
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.height = 0;
        self.len = 0;
        self.version += 1;
    }
}

impl<K, C: Comparator<K>> RawTree<K, C> {
    /// Returns true if the tree contains the key.
    ///
    /// A separator hit in an internal node is a member of the set, so the
    /// descent can terminate above the leaf level.
    pub(crate) fn contains(&self, key: &K) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let mut current = root;
        loop {
            let node = self.nodes.get(current);
            match node.search(key, &self.comparator) {
                SearchResult::Found(_) => return true,
                SearchResult::NotFound(index) => {
                    if node.leaf {
                        return false;
                    }
                    current = node.children[index];
                }
            }
        }
    }

    /// Inserts a key. Returns true iff the key was not already present.
    pub(crate) fn insert(&mut self, key: K) -> bool {
        let Some(root) = self.root else {
            let mut leaf = Node::new_leaf();
            leaf.keys.push(key);
            let handle = self.nodes.alloc(leaf);
            self.root = Some(handle);
            self.height = 1;
            self.len = 1;
            self.version += 1;
            return true;
        };

        // Always descend to a leaf; a separator hit on the way down means
        // the key is already present.
        let mut current = root;
        loop {
            let node = self.nodes.get(current);
            if node.leaf {
                break;
            }
            match node.search(&key, &self.comparator) {
                SearchResult::Found(_) => return false,
                SearchResult::NotFound(index) => current = node.children[index],
            }
        }

        let (nodes, cmp) = (&mut self.nodes, &self.comparator);
        if !nodes.get_mut(current).insert_into_leaf(key, cmp) {
            return false;
        }
        self.len += 1;
        self.version += 1;

        if self.nodes.get(current).key_count() > self.max_keys {
            self.split(current);
        }
        true
    }

    /// Removes a key. Returns true iff the key was present.
    pub(crate) fn remove(&mut self, key: &K) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        // Every removal is reduced to a leaf removal: an internal hit swaps
        // the separator with its in-order predecessor first.
        let mut current = root;
        let shrunk_leaf = loop {
            let node = self.nodes.get(current);
            if node.leaf {
                let (nodes, cmp) = (&mut self.nodes, &self.comparator);
                if !nodes.get_mut(current).delete_from_leaf(key, cmp) {
                    return false;
                }
                break current;
            }
            match node.search(key, &self.comparator) {
                SearchResult::NotFound(index) => current = node.children[index],
                SearchResult::Found(index) => {
                    // Rightmost leaf of the left subtree.
                    let mut leaf = self.nodes.get(current).children[index];
                    while !self.nodes.get(leaf).leaf {
                        leaf = *self
                            .nodes
                            .get(leaf)
                            .children
                            .last()
                            .expect("internal node has children");
                    }
                    let predecessor = self
                        .nodes
                        .get_mut(leaf)
                        .keys
                        .pop()
                        .expect("leaf on a predecessor path is never empty");
                    self.nodes.get_mut(current).keys[index] = predecessor;
                    break leaf;
                }
            }
        };

        self.len -= 1;
        self.version += 1;

        if self.len == 0 {
            self.nodes.clear();
            self.root = None;
            self.height = 0;
            return true;
        }

        if self.nodes.get(shrunk_leaf).key_count() < self.min_keys {
            self.rebalance(shrunk_leaf);
        }
        true
    }

    /// Repairs overflow by splitting, walking toward the root.
    ///
    /// The overflowing node keeps its upper half and stays in place as the
    /// right sibling; a new node takes the lower half; the median moves up.
    fn split(&mut self, mut handle: Handle) {
        while self.nodes.get(handle).key_count() > self.max_keys {
            let parent = match self.nodes.get(handle).parent {
                Some(parent) => parent,
                None => {
                    // The root itself is splitting; grow a new level.
                    let new_root = self.nodes.alloc(Node::new_internal());
                    self.nodes.get_mut(handle).parent = Some(new_root);
                    self.root = Some(new_root);
                    self.height += 1;
                    new_root
                }
            };

            let (left, median) = {
                let node = self.nodes.get_mut(handle);
                let mid = (node.key_count() - 1) / 2;
                let mut left = if node.leaf { Node::new_leaf() } else { Node::new_internal() };
                left.parent = Some(parent);
                left.keys = node.keys.drain(..mid).collect();
                let median = node.keys.remove(0);
                if !node.leaf {
                    left.children = node.children.drain(..=mid).collect();
                }
                (left, median)
            };

            // Children moved into the new sibling must point back at it.
            let moved: Vec<Handle> = left.children.to_vec();
            let left_handle = self.nodes.alloc(left);
            for child in moved {
                self.nodes.get_mut(child).parent = Some(left_handle);
            }

            let (nodes, cmp) = (&mut self.nodes, &self.comparator);
            nodes.get_mut(parent).insert_into_internal(median, left_handle, handle, cmp);

            handle = parent;
        }
    }

    /// Repairs underflow by sibling rotation or merge, walking toward the
    /// root. The root is exempt from minimum occupancy.
    fn rebalance(&mut self, mut handle: Handle) {
        loop {
            if Some(handle) == self.root {
                return;
            }
            let parent = self.nodes.get(handle).parent.expect("non-root node has a parent");

            let (position, right_sibling, left_sibling) = {
                let parent_node = self.nodes.get(parent);
                let position = parent_node
                    .children
                    .iter()
                    .position(|&child| child == handle)
                    .expect("child is listed in its parent");
                let right = (position < parent_node.key_count())
                    .then(|| parent_node.children[position + 1]);
                let left = (position > 0).then(|| parent_node.children[position - 1]);
                (position, right, left)
            };

            if let Some(right) = right_sibling {
                if self.nodes.get(right).key_count() > self.min_keys {
                    self.borrow_from_right(handle, parent, right, position);
                    return;
                }
            }
            if let Some(left) = left_sibling {
                if self.nodes.get(left).key_count() > self.min_keys {
                    self.borrow_from_left(handle, parent, left, position);
                    return;
                }
            }

            // Neither sibling can lend a key; merge with one of them,
            // right preferred.
            let (left_half, right_half, separator_index) = match right_sibling {
                Some(right) => (handle, right, position),
                None => {
                    let left = left_sibling.expect("underflowing non-root node has a sibling");
                    (left, handle, position - 1)
                }
            };
            self.merge(parent, left_half, right_half, separator_index);

            if Some(parent) == self.root {
                if self.nodes.get(parent).key_count() == 0 {
                    // The root emptied out; the merged node takes its place.
                    self.nodes.free(parent);
                    self.nodes.get_mut(left_half).parent = None;
                    self.root = Some(left_half);
                    self.height -= 1;
                }
                return;
            }
            if self.nodes.get(parent).key_count() < self.min_keys {
                handle = parent;
                continue;
            }
            return;
        }
    }

    /// Rotates the parent separator down into `handle` and the right
    /// sibling's first key up into the separator slot.
    fn borrow_from_right(&mut self, handle: Handle, parent: Handle, right: Handle, position: usize) {
        let (new_separator, moved_child) = {
            let sibling = self.nodes.get_mut(right);
            let key = sibling.keys.remove(0);
            let child = (!sibling.leaf).then(|| sibling.children.remove(0));
            (key, child)
        };
        let old_separator = mem::replace(&mut self.nodes.get_mut(parent).keys[position], new_separator);
        self.nodes.get_mut(handle).keys.push(old_separator);
        if let Some(child) = moved_child {
            self.nodes.get_mut(handle).children.push(child);
            self.nodes.get_mut(child).parent = Some(handle);
        }
    }

    /// The mirror image: separator at `position - 1` comes down in front,
    /// the left sibling's last key goes up.
    fn borrow_from_left(&mut self, handle: Handle, parent: Handle, left: Handle, position: usize) {
        let (new_separator, moved_child) = {
            let sibling = self.nodes.get_mut(left);
            let key = sibling.keys.pop().expect("lending sibling is non-empty");
            let child = if sibling.leaf { None } else { sibling.children.pop() };
            (key, child)
        };
        let old_separator =
            mem::replace(&mut self.nodes.get_mut(parent).keys[position - 1], new_separator);
        self.nodes.get_mut(handle).keys.insert(0, old_separator);
        if let Some(child) = moved_child {
            self.nodes.get_mut(handle).children.insert(0, child);
            self.nodes.get_mut(child).parent = Some(handle);
        }
    }

    /// Folds the separator and the right node into the left node, removing
    /// both from the parent and freeing the right node's arena slot.
    fn merge(&mut self, parent: Handle, left: Handle, right: Handle, separator_index: usize) {
        let separator = {
            let parent_node = self.nodes.get_mut(parent);
            let separator = parent_node.keys.remove(separator_index);
            let removed = parent_node.children.remove(separator_index + 1);
            debug_assert_eq!(removed, right);
            separator
        };

        let mut right_node = self.nodes.take(right);
        let moved: Vec<Handle> = right_node.children.to_vec();
        {
            let left_node = self.nodes.get_mut(left);
            left_node.keys.push(separator);
            left_node.keys.append(&mut right_node.keys);
            left_node.children.append(&mut right_node.children);
        }
        for child in moved {
            self.nodes.get_mut(child).parent = Some(left);
        }
    }

    /// Builds a minimum-height tree from an unsorted, possibly duplicated
    /// collection in one linear pass, instead of `len` root-to-leaf
    /// insertions. Must be called on an empty tree.
    pub(crate) fn bulk_load(&mut self, mut keys: Vec<K>) {
        debug_assert!(self.root.is_none() && self.len == 0, "`RawTree::bulk_load()` - tree must be empty");

        keys.sort_by(|a, b| self.comparator.compare(a, b));
        keys.dedup_by(|a, b| self.comparator.compare(a, b) == Ordering::Equal);
        if keys.is_empty() {
            return;
        }

        // The last leaf must end up strictly under `order` keys. On an exact
        // multiple of `order`, one key is set aside and re-inserted through
        // the normal insert path once the bulk structure stands.
        let extra = if keys.len() % self.order == 0 { keys.pop() } else { None };

        self.len = keys.len();
        self.version += 1;

        // Leaf layout: each run of `order` keys yields a leaf of `order - 1`
        // keys plus one promoted separator; the final leaf takes the
        // remainder. An under-minimum remainder redistributes with the
        // preceding run.
        let total = keys.len();
        let leaf_count = total.div_ceil(self.order);
        let leaf_sizes = if leaf_count == 1 {
            vec![total]
        } else {
            let remainder = total - (leaf_count - 1) * self.order;
            let mut sizes = vec![self.max_keys; leaf_count - 1];
            sizes.push(remainder);
            if remainder < self.min_keys {
                let tail = self.order + remainder;
                sizes[leaf_count - 2] = tail - self.min_keys - 1;
                sizes[leaf_count - 1] = self.min_keys;
            }
            sizes
        };

        let mut stream = keys.into_iter();
        let mut level: Vec<Handle> = Vec::with_capacity(leaf_count);
        let mut separators: Vec<K> = Vec::with_capacity(leaf_count - 1);
        for (index, &size) in leaf_sizes.iter().enumerate() {
            let mut leaf = Node::new_leaf();
            leaf.keys.extend(stream.by_ref().take(size));
            level.push(self.nodes.alloc(leaf));
            if index + 1 < leaf_count {
                separators.push(stream.next().expect("separator key after every non-final leaf"));
            }
        }
        debug_assert!(stream.next().is_none());

        // Internal levels bottom-up: parents adopt groups of children, the
        // separators inside a group become the parent's keys, and the
        // separators between groups move up one level.
        self.height = 1;
        while level.len() > 1 {
            let groups = group_sizes(level.len(), self.order, self.min_keys + 1);
            let group_count = groups.len();
            let mut next_level: Vec<Handle> = Vec::with_capacity(group_count);
            let mut next_separators: Vec<K> = Vec::with_capacity(group_count.saturating_sub(1));
            let mut children = level.into_iter();
            let mut seps = separators.into_iter();

            for (index, &size) in groups.iter().enumerate() {
                let mut parent = Node::new_internal();
                parent.children.extend(children.by_ref().take(size));
                parent.keys.extend(seps.by_ref().take(size - 1));
                let adopted: Vec<Handle> = parent.children.to_vec();
                let parent_handle = self.nodes.alloc(parent);
                for child in adopted {
                    self.nodes.get_mut(child).parent = Some(parent_handle);
                }
                next_level.push(parent_handle);
                if index + 1 < group_count {
                    next_separators.push(seps.next().expect("separator between sibling groups"));
                }
            }
            debug_assert!(children.next().is_none());
            debug_assert!(seps.next().is_none());

            level = next_level;
            separators = next_separators;
            self.height += 1;
        }

        self.root = Some(level[0]);

        if let Some(key) = extra {
            let inserted = self.insert(key);
            debug_assert!(inserted);
        }
    }

    /// Walks the whole tree and panics on any structural violation: key
    /// ordering, occupancy bounds, child counts, parent back-references,
    /// uniform leaf depth, and total key count.
    ///
    /// Structural corruption is a programming defect, so this is a test and
    /// debug aid rather than a runtime error path.
    pub(crate) fn check_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree with non-zero len");
            assert_eq!(self.height, 0, "empty tree with non-zero height");
            assert_eq!(self.nodes.len(), 0, "empty tree with live arena slots");
            return;
        };

        assert!(self.height >= 1, "non-empty tree with zero height");
        let counted = self.check_subtree(root, 1, None, None, None);
        assert_eq!(counted, self.len, "key count does not match len");
    }

    fn check_subtree(
        &self,
        handle: Handle,
        depth: usize,
        parent: Option<Handle>,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> usize {
        let node = self.nodes.get(handle);
        assert_eq!(node.parent, parent, "parent back-reference is stale");

        let key_count = node.key_count();
        assert!(key_count <= self.max_keys, "node exceeds max occupancy");
        if parent.is_some() {
            assert!(key_count >= self.min_keys, "non-root node below min occupancy");
        } else {
            assert!(key_count >= 1, "root must hold at least one key");
        }

        for window in node.keys.windows(2) {
            assert_eq!(
                self.comparator.compare(&window[0], &window[1]),
                Ordering::Less,
                "keys within a node must be strictly ascending"
            );
        }
        if let Some(lower) = lower {
            assert_eq!(
                self.comparator.compare(lower, &node.keys[0]),
                Ordering::Less,
                "subtree key at or below its lower bound"
            );
        }
        if let Some(upper) = upper {
            assert_eq!(
                self.comparator.compare(&node.keys[key_count - 1], upper),
                Ordering::Less,
                "subtree key at or above its upper bound"
            );
        }

        if node.leaf {
            assert!(node.children.is_empty(), "leaf node with children");
            assert_eq!(depth, self.height, "leaves must all sit at depth `height`");
            return key_count;
        }

        assert_eq!(node.children.len(), key_count + 1, "internal node child count mismatch");
        let mut total = key_count;
        for (index, &child) in node.children.iter().enumerate() {
            let child_lower = if index == 0 { lower } else { Some(&node.keys[index - 1]) };
            let child_upper = if index == key_count { upper } else { Some(&node.keys[index]) };
            total += self.check_subtree(child, depth + 1, Some(handle), child_lower, child_upper);
        }
        total
    }
}

/// Partitions `n` level nodes into parent groups: full groups of `order`
/// children, with the tail either kept as its own group (when it meets the
/// minimum child count) or split evenly across the last two groups.
fn group_sizes(n: usize, order: usize, min_children: usize) -> Vec<usize> {
    debug_assert!(n > 1);
    if n <= order {
        return vec![n];
    }
    let full = n / order;
    let remainder = n % order;
    if remainder == 0 {
        vec![order; full]
    } else if remainder >= min_children {
        let mut sizes = vec![order; full];
        sizes.push(remainder);
        sizes
    } else {
        let mut sizes = vec![order; full - 1];
        let tail = order + remainder;
        sizes.push(tail - tail / 2);
        sizes.push(tail / 2);
        sizes
    }
}
