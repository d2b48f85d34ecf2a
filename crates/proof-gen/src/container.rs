//! Indexed field access over a merkleized SSZ container.

use crate::gindex::{cover_depth, GeneralizedIndex};
use crate::proof::ProofError;
use crate::tree::TreeNode;
use crate::types::Hash32;

/// A container that exposes its fields by position.
pub trait SszContainer {
    type Node: TreeNode;

    /// Subtree holding the field at `position`.
    ///
    /// # Errors
    /// Fails if the position is outside the container or the backing tree
    /// is shallower than the container's cover depth.
    fn field_at(&self, position: usize) -> Result<&Self::Node, ProofError>;

    /// Hash tree root of the whole container.
    fn merkle_root(&self) -> Hash32;
}

/// Walk from `root` to the node at `index`.
///
/// # Errors
/// Returns [`ProofError::Traversal`] if a node on the path has no children.
pub fn node_at<N: TreeNode>(root: &N, index: GeneralizedIndex) -> Result<&N, ProofError> {
    let mut node = root;
    for (depth, go_right) in (0_u32..).zip(index.path()) {
        let next = if go_right { node.right() } else { node.left() };
        node = next.ok_or(ProofError::Traversal {
            gindex: index,
            depth,
        })?;
    }
    Ok(node)
}

/// A borrowed view of a tree node as a container with a known field count.
#[derive(Debug, Clone)]
pub struct ContainerView<'a, N> {
    backing: &'a N,
    field_count: usize,
}

impl<'a, N: TreeNode> ContainerView<'a, N> {
    #[must_use]
    pub const fn new(backing: &'a N, field_count: usize) -> Self {
        Self {
            backing,
            field_count,
        }
    }

    /// View the field at `position` as a nested container.
    ///
    /// # Errors
    /// Fails as [`SszContainer::field_at`] does.
    pub fn container_at(
        &self,
        position: usize,
        field_count: usize,
    ) -> Result<ContainerView<'a, N>, ProofError> {
        Ok(ContainerView::new(self.node(position)?, field_count))
    }

    /// Decode a `uint64` field from its chunk.
    ///
    /// # Errors
    /// Fails if the field cannot be reached or its chunk carries bytes past
    /// the first eight.
    pub fn uint64_at(&self, position: usize) -> Result<u64, ProofError> {
        let chunk = self.node(position)?.merkle_root();
        let (value, padding) = chunk.split_at(8);
        if padding.iter().any(|&b| b != 0) {
            return Err(ProofError::Decode(format!(
                "field {position} is not a uint64 chunk"
            )));
        }
        let mut le = [0u8; 8];
        le.copy_from_slice(value);
        Ok(u64::from_le_bytes(le))
    }

    fn node(&self, position: usize) -> Result<&'a N, ProofError> {
        if position >= self.field_count {
            return Err(ProofError::InvalidLayout(format!(
                "position {position} outside container of {} fields",
                self.field_count
            )));
        }
        let index = GeneralizedIndex::for_position(cover_depth(self.field_count), position as u64)?;
        node_at(self.backing, index)
    }
}

impl<N: TreeNode> SszContainer for ContainerView<'_, N> {
    type Node = N;

    fn field_at(&self, position: usize) -> Result<&N, ProofError> {
        self.node(position)
    }

    fn merkle_root(&self) -> Hash32 {
        self.backing.merkle_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BackingNode;

    fn uint64_chunk(value: u64) -> Hash32 {
        let mut chunk = [0u8; 32];
        chunk[..8].copy_from_slice(&value.to_le_bytes());
        chunk
    }

    fn sample_container() -> BackingNode {
        BackingNode::from_fields(vec![
            BackingNode::leaf(uint64_chunk(42)),
            BackingNode::leaf([0xaa; 32]),
            BackingNode::from_leaves(&[[1u8; 32], [2u8; 32]], 1),
        ])
    }

    #[test]
    fn test_field_at_reaches_each_field() {
        let backing = sample_container();
        let view = ContainerView::new(&backing, 3);
        assert_eq!(view.field_at(1).unwrap().merkle_root(), [0xaa; 32]);
        assert_eq!(view.uint64_at(0).unwrap(), 42);
        assert_eq!(view.merkle_root(), backing.merkle_root());
    }

    #[test]
    fn test_nested_container_access() {
        let backing = sample_container();
        let view = ContainerView::new(&backing, 3);
        let inner = view.container_at(2, 2).unwrap();
        assert_eq!(inner.field_at(1).unwrap().merkle_root(), [2u8; 32]);
    }

    #[test]
    fn test_field_outside_container_is_rejected() {
        let backing = sample_container();
        let view = ContainerView::new(&backing, 3);
        assert!(matches!(
            view.field_at(3),
            Err(ProofError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_overstated_field_count_fails_traversal() {
        let backing = sample_container();
        // 5 fields -> depth 3, but the tree only has depth 2 above its leaves
        let view = ContainerView::new(&backing, 5);
        assert!(matches!(
            view.field_at(0),
            Err(ProofError::Traversal { .. })
        ));
    }

    #[test]
    fn test_uint64_rejects_wide_chunk() {
        let backing = sample_container();
        let view = ContainerView::new(&backing, 3);
        assert!(matches!(view.uint64_at(1), Err(ProofError::Decode(_))));
    }
}
