//! Binary Merkle tree backing.
//!
//! [`TreeNode`] is the navigation capability the proof walker needs from a
//! decoded SSZ tree. [`BackingNode`] is the in-memory implementation: an
//! immutable tree with roots cached at every branch, cheap to clone.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::gindex::cover_depth;
use crate::types::Hash32;

/// A node of a binary hash tree.
pub trait TreeNode {
    /// Root hash of the subtree under this node.
    fn merkle_root(&self) -> Hash32;

    /// Left child, or `None` when this node is a leaf.
    fn left(&self) -> Option<&Self>;

    /// Right child, or `None` when this node is a leaf.
    fn right(&self) -> Option<&Self>;
}

/// SHA-256 of two concatenated 32-byte nodes.
#[must_use]
pub fn hash_pair(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[derive(Debug)]
pub struct BranchNode {
    root: Hash32,
    left: BackingNode,
    right: BackingNode,
}

/// An immutable binary tree node.
#[derive(Debug, Clone)]
pub enum BackingNode {
    /// A 32-byte chunk. Opaque subtrees collapse into a leaf holding their root.
    Leaf(Hash32),
    Branch(Arc<BranchNode>),
}

impl BackingNode {
    #[must_use]
    pub const fn leaf(chunk: Hash32) -> Self {
        Self::Leaf(chunk)
    }

    #[must_use]
    pub fn branch(left: Self, right: Self) -> Self {
        let root = hash_pair(&left.merkle_root(), &right.merkle_root());
        Self::Branch(Arc::new(BranchNode { root, left, right }))
    }

    /// Merkleize `nodes` as the bottom layer of a tree of `depth` levels,
    /// padding the layer with zero chunks.
    ///
    /// # Panics
    /// Panics if more than `2^depth` nodes are supplied.
    #[must_use]
    pub fn merkleize(nodes: Vec<Self>, depth: u32) -> Self {
        let width = 1usize << depth;
        assert!(
            nodes.len() <= width,
            "{} nodes do not fit in depth {depth}",
            nodes.len()
        );

        let mut layer = nodes;
        layer.resize_with(width, || Self::Leaf([0u8; 32]));

        for _ in 0..depth {
            let mut parents = Vec::with_capacity(layer.len() / 2);
            let mut iter = layer.into_iter();
            while let (Some(left), Some(right)) = (iter.next(), iter.next()) {
                parents.push(Self::branch(left, right));
            }
            layer = parents;
        }

        layer
            .pop()
            .unwrap_or_else(|| Self::Leaf([0u8; 32]))
    }

    /// Merkleize container field nodes at the container's cover depth.
    #[must_use]
    pub fn from_fields(fields: Vec<Self>) -> Self {
        let depth = cover_depth(fields.len());
        Self::merkleize(fields, depth)
    }

    /// Merkleize raw 32-byte leaves.
    #[must_use]
    pub fn from_leaves(leaves: &[Hash32], depth: u32) -> Self {
        Self::merkleize(leaves.iter().copied().map(Self::Leaf).collect(), depth)
    }
}

impl TreeNode for BackingNode {
    fn merkle_root(&self) -> Hash32 {
        match self {
            Self::Leaf(chunk) => *chunk,
            Self::Branch(branch) => branch.root,
        }
    }

    fn left(&self) -> Option<&Self> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch(branch) => Some(&branch.left),
        }
    }

    fn right(&self) -> Option<&Self> {
        match self {
            Self::Leaf(_) => None,
            Self::Branch(branch) => Some(&branch.right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded_roots() {
        assert_eq!(BackingNode::from_fields(Vec::new()).merkle_root(), [0u8; 32]);
        let z1 = hash_pair(&[0u8; 32], &[0u8; 32]);
        assert_eq!(BackingNode::merkleize(Vec::new(), 1).merkle_root(), z1);
        assert_eq!(
            BackingNode::merkleize(Vec::new(), 2).merkle_root(),
            hash_pair(&z1, &z1)
        );
    }

    #[test]
    fn test_merkleize_two_leaves() {
        let tree = BackingNode::from_leaves(&[[1u8; 32], [2u8; 32]], 1);
        assert_eq!(tree.merkle_root(), hash_pair(&[1u8; 32], &[2u8; 32]));
        assert_eq!(tree.left().unwrap().merkle_root(), [1u8; 32]);
        assert_eq!(tree.right().unwrap().merkle_root(), [2u8; 32]);
        assert!(tree.left().unwrap().left().is_none());
    }

    #[test]
    fn test_merkleize_pads_with_zero_chunks() {
        // 3 fields -> depth 2, fourth slot is a zero chunk
        let fields = vec![
            BackingNode::leaf([1u8; 32]),
            BackingNode::leaf([2u8; 32]),
            BackingNode::leaf([3u8; 32]),
        ];
        let tree = BackingNode::from_fields(fields);
        let expected = hash_pair(
            &hash_pair(&[1u8; 32], &[2u8; 32]),
            &hash_pair(&[3u8; 32], &[0u8; 32]),
        );
        assert_eq!(tree.merkle_root(), expected);
    }

    #[test]
    fn test_single_field_container_is_its_field() {
        let tree = BackingNode::from_fields(vec![BackingNode::leaf([7u8; 32])]);
        assert!(tree.left().is_none());
        assert_eq!(tree.merkle_root(), [7u8; 32]);
    }

    #[test]
    fn test_nested_subtree_root_is_used() {
        let inner = BackingNode::from_leaves(&[[1u8; 32], [2u8; 32]], 1);
        let outer = BackingNode::from_fields(vec![inner.clone(), BackingNode::leaf([3u8; 32])]);
        assert_eq!(
            outer.merkle_root(),
            hash_pair(&inner.merkle_root(), &[3u8; 32])
        );
        assert_eq!(outer.left().unwrap().merkle_root(), inner.merkle_root());
    }

    #[test]
    #[should_panic(expected = "do not fit")]
    fn test_merkleize_rejects_overfull_layer() {
        let _ = BackingNode::from_leaves(&[[0u8; 32]; 3], 1);
    }
}
