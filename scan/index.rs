// ========================================================================================
//
//                      The implicit tree: heap-style index arithmetic
//
// ========================================================================================
//
// A complete binary tree over N leaves is laid out in one flat index space of
// 2N-1 nodes. Indices below N-1 are interior nodes; indices from N-1 upward are the
// leaves, in input order. There are no links: every relationship is arithmetic.
//
// The arithmetic is only exact when N is a power of two. This module never checks
// that; `SumHeap` validates the length before an index is ever built.

/// The flat index of the root node.
pub const ROOT: usize = 0;

/// Pure navigation over the heap layout of a complete binary tree with `leaves` leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapIndex {
    leaves: usize,
}

impl HeapIndex {
    #[inline]
    pub const fn new(leaves: usize) -> Self {
        Self { leaves }
    }

    /// Number of leaves (N).
    #[inline(always)]
    pub const fn leaves(&self) -> usize {
        self.leaves
    }

    /// Number of interior nodes (N-1). Zero for a single-leaf tree.
    #[inline(always)]
    pub const fn interior_len(&self) -> usize {
        self.leaves.saturating_sub(1)
    }

    /// Total number of nodes in the flat index space (2N-1).
    #[inline(always)]
    pub const fn size(&self) -> usize {
        self.interior_len() + self.leaves
    }

    /// Number of edges from the root to any leaf (log2 N).
    #[inline]
    pub const fn depth(&self) -> usize {
        if self.leaves == 0 {
            0
        } else {
            self.leaves.trailing_zeros() as usize
        }
    }

    #[inline(always)]
    pub const fn left(&self, i: usize) -> usize {
        2 * i + 1
    }

    #[inline(always)]
    pub const fn right(&self, i: usize) -> usize {
        2 * i + 2
    }

    /// The parent of `i`, or `None` for the root.
    #[inline(always)]
    pub const fn parent(&self, i: usize) -> Option<usize> {
        if i == ROOT { None } else { Some((i - 1) / 2) }
    }

    /// A node is a leaf when its right child would fall outside the tree.
    #[inline(always)]
    pub const fn is_leaf(&self, i: usize) -> bool {
        self.right(i) >= self.size()
    }

    #[inline(always)]
    pub const fn is_interior(&self, i: usize) -> bool {
        i < self.interior_len()
    }

    /// Position in the input sequence of leaf node `i`.
    ///
    /// The caller must pass a leaf; for an interior node this underflows.
    #[inline(always)]
    pub const fn leaf_position(&self, i: usize) -> usize {
        i - self.interior_len()
    }

    /// Flat node index of the leaf holding input element `pos`.
    #[inline(always)]
    pub const fn leaf_node(&self, pos: usize) -> usize {
        pos + self.interior_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_leaves_have_fifteen_nodes() {
        let index = HeapIndex::new(8);
        assert_eq!(index.size(), 15);
        assert_eq!(index.interior_len(), 7);
        assert_eq!(index.depth(), 3);
        assert_eq!(index.leaf_node(0), 7);
        assert_eq!(index.leaf_position(14), 7);
    }

    #[test]
    fn children_and_parent_are_inverse() {
        let index = HeapIndex::new(16);
        for i in 0..index.interior_len() {
            assert_eq!(index.parent(index.left(i)), Some(i));
            assert_eq!(index.parent(index.right(i)), Some(i));
            assert_eq!(index.right(i), index.left(i) + 1);
        }
        assert_eq!(index.parent(ROOT), None);
    }

    #[test]
    fn leaf_predicate_matches_interior_boundary() {
        for leaves in [1usize, 2, 4, 8, 64] {
            let index = HeapIndex::new(leaves);
            for i in 0..index.size() {
                assert_eq!(index.is_leaf(i), !index.is_interior(i), "N={leaves}, node {i}");
            }
        }
    }

    #[test]
    fn single_leaf_tree_is_only_a_root() {
        let index = HeapIndex::new(1);
        assert_eq!(index.size(), 1);
        assert_eq!(index.interior_len(), 0);
        assert_eq!(index.depth(), 0);
        assert!(index.is_leaf(ROOT));
        assert_eq!(index.leaf_position(ROOT), 0);
    }
}
