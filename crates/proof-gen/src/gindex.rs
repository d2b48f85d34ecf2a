//! Generalized Index Computation
//!
//! A generalized index encodes a root-to-leaf path through a binary Merkle
//! tree: the most significant set bit is a sentinel and every following bit,
//! read high to low, selects the right (1) or left (0) child.
//!
//! SSZ containers are merkleized as balanced trees whose leaf count is the
//! next power of two at or above the field count, so a field's index inside
//! one container is `2^cover_depth + position`. Indices of nested containers
//! compose by shifting the outer index left by the inner depth.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::proof::ProofError;

/// Deepest tree a `u64` generalized index can address.
pub const MAX_TREE_DEPTH: u32 = 63;

/// A generalized index. Always non-zero; `1` is the root.
///
/// Serialized as a bare integer; deserializing `0` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct GeneralizedIndex(u64);

impl GeneralizedIndex {
    /// The root of any tree.
    pub const ROOT: Self = Self(1);

    /// Wrap a raw index, rejecting zero (which addresses nothing).
    #[must_use]
    pub const fn new(value: u64) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Index of leaf `position` in a tree of the given depth.
    ///
    /// # Errors
    /// Returns [`ProofError::InvalidLayout`] if the depth exceeds
    /// [`MAX_TREE_DEPTH`] or the position does not fit in it.
    pub fn for_position(depth: u32, position: u64) -> Result<Self, ProofError> {
        if depth > MAX_TREE_DEPTH {
            return Err(ProofError::InvalidLayout(format!(
                "tree depth {depth} exceeds {MAX_TREE_DEPTH}"
            )));
        }
        if position >= 1_u64 << depth {
            return Err(ProofError::InvalidLayout(format!(
                "position {position} does not fit in depth {depth}"
            )));
        }
        Ok(Self((1_u64 << depth) | position))
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Number of edges between the root and the addressed node.
    #[must_use]
    pub const fn depth(self) -> u32 {
        MAX_TREE_DEPTH.saturating_sub(self.0.leading_zeros())
    }

    /// Bit length including the sentinel; a proof has `bit_length - 1` siblings.
    #[must_use]
    pub const fn bit_length(self) -> u32 {
        self.depth() + 1
    }

    /// Descent decisions from the root, `true` meaning "go right".
    ///
    /// The iterator is double ended so verification can walk it leaf to root.
    pub fn path(self) -> impl DoubleEndedIterator<Item = bool> + ExactSizeIterator {
        let value = self.0;
        (0..self.depth()).rev().map(move |bit| (value >> bit) & 1 == 1)
    }

    /// Index of `inner` (relative to the node at `self`) from the outer root.
    ///
    /// # Errors
    /// Returns [`ProofError::InvalidLayout`] if the combined path would not
    /// fit in a `u64`.
    pub fn concat(self, inner: Self) -> Result<Self, ProofError> {
        let inner_depth = inner.depth();
        if self.depth() + inner_depth > MAX_TREE_DEPTH {
            return Err(ProofError::InvalidLayout(format!(
                "concatenated path of depth {} exceeds {MAX_TREE_DEPTH}",
                self.depth() + inner_depth
            )));
        }
        Ok(Self((self.0 << inner_depth) | (inner.0 ^ (1_u64 << inner_depth))))
    }
}

impl fmt::Display for GeneralizedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for GeneralizedIndex {
    type Error = ProofError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ProofError::InvalidIndex(value))
    }
}

impl From<GeneralizedIndex> for u64 {
    fn from(gindex: GeneralizedIndex) -> Self {
        gindex.0
    }
}

/// One container level crossed by a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    /// Zero-based field position inside the container.
    pub position: usize,
    /// Number of fields the container declares.
    pub field_count: usize,
}

impl PathStep {
    #[must_use]
    pub const fn new(position: usize, field_count: usize) -> Self {
        Self {
            position,
            field_count,
        }
    }
}

/// Minimal depth `d` such that `2^d >= field_count`.
///
/// Counts above `2^63` report depth 64, which no `u64` index can address.
#[must_use]
pub fn cover_depth(field_count: usize) -> u32 {
    if field_count <= 1 {
        0
    } else {
        (field_count as u64)
            .checked_next_power_of_two()
            .map_or(64, u64::trailing_zeros)
    }
}

/// Compose the generalized index of a field several containers deep.
///
/// `path` is ordered outermost first.
///
/// # Errors
/// Returns [`ProofError::InvalidLayout`] if a container has no fields, a
/// position does not fit the container's cover depth, or the total depth
/// overflows a `u64` index.
pub fn compose(path: &[PathStep]) -> Result<GeneralizedIndex, ProofError> {
    let mut gindex = 1_u64;
    let mut total_depth = 0_u32;

    for (level, step) in path.iter().enumerate() {
        if step.field_count == 0 {
            return Err(ProofError::InvalidLayout(format!(
                "level {level}: container declares no fields"
            )));
        }
        let depth = cover_depth(step.field_count);
        let position = step.position as u64;
        if depth >= 64 || position >= 1_u64 << depth {
            return Err(ProofError::InvalidLayout(format!(
                "level {level}: position {} does not fit {} fields (depth {depth})",
                step.position, step.field_count
            )));
        }
        total_depth += depth;
        if total_depth > MAX_TREE_DEPTH {
            return Err(ProofError::InvalidLayout(format!(
                "path depth {total_depth} exceeds {MAX_TREE_DEPTH}"
            )));
        }
        gindex = (gindex << depth) | position;
    }

    Ok(GeneralizedIndex(gindex))
}

/// Concatenate generalized indices along a path of nested subtrees.
///
/// # Errors
/// Returns [`ProofError::InvalidLayout`] if the result overflows.
pub fn concat_gindices(gindices: &[GeneralizedIndex]) -> Result<GeneralizedIndex, ProofError> {
    gindices
        .iter()
        .try_fold(GeneralizedIndex::ROOT, |acc, &gindex| acc.concat(gindex))
}
