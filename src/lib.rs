//! An order-m balanced search tree (B-tree) set for Rust.
//!
//! This crate provides [`MwayTreeSet`], an ordered set whose branching factor
//! (the B-tree *order*) is chosen at construction time and whose key ordering
//! is an explicitly injected [`Comparator`] rather than an implicit `Ord`
//! bound baked into the structure:
//!
//! - [`insert`](MwayTreeSet::insert) / [`remove`](MwayTreeSet::remove) /
//!   [`contains`](MwayTreeSet::contains) - O(log n) membership and mutation
//! - [`from_items`](MwayTreeSet::from_items) - linear-time bulk construction
//!   from an unsorted collection
//! - [`cursor`](MwayTreeSet::cursor) - versioned snapshot iteration with
//!   delete-during-traversal
//!
//! # Example
//!
//! ```
//! use mway_tree::MwayTreeSet;
//!
//! let mut set = MwayTreeSet::new(5).unwrap();
//! for k in [40, 10, 30, 20] {
//!     set.insert(k);
//! }
//!
//! assert!(set.contains(&30));
//! assert!(!set.insert(10)); // duplicates are rejected, not an error
//! assert_eq!(set.to_sorted_vec(), [10, 20, 30, 40]);
//!
//! set.remove(&30);
//! assert_eq!(set.len(), 3);
//! ```
//!
//! # Implementation
//!
//! Nodes live in a slot arena and refer to each other through stable integer
//! handles; the parent back-reference is a plain handle with no ownership
//! implication, so the node graph stays a tree for ownership purposes.
//! Splitting and rebalancing walk upward iteratively, bounded by the tree
//! height. Internal nodes store real keys (separators are members of the
//! set), so a search can terminate above the leaf level.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

mod comparator;
mod error;
mod raw;

pub mod tree_set;

pub use comparator::{Comparator, Natural};
pub use error::Error;
pub use tree_set::{Cursor, Iter, MwayTreeSet};
