//! # Incremental Merkle Tree
//!
//! Fixed-depth binary accumulator used for attester membership and for the
//! public attestation log. Empty slots hold precomputed zero values:
//!
//! - `zero[0] = 0`
//! - `zero[i] = hash(zero[i-1], zero[i-1])`
//!
//! so the root of an empty tree is `zero[depth]` and a partial subtree pads
//! with the zero value of its level.
//!
//! ## Algorithm
//!
//! Every mutation rebuilds all layers from the leaf vector. That is O(n) in
//! the number of leaves, and mutations are administrative events
//! (registration, revocation, public attestation), never on the request
//! path. Scaling past a few thousand leaves needs a sparse structure with
//! the same external contract.
//!
//! ## Proof Layout
//!
//! A proof is exactly `depth` `(sibling, is_right)` pairs, leaf level first.
//! `is_right` is bit `level` of the leaf index: when set, the running node is
//! the right child and is hashed as `hash(sibling, node)`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typeproof_core::FieldElement;

use crate::error::MerkleError;
use crate::hash::FieldHasher;

/// Largest supported depth. Capacity `2^32` leaves.
pub const MAX_DEPTH: u32 = 32;

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElement {
    /// The sibling node at this level.
    pub sibling: FieldElement,
    /// True when the running node is the right child.
    pub is_right: bool,
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The proven leaf value.
    pub leaf: FieldElement,
    /// Position of the leaf at the time the proof was taken.
    pub leaf_index: u64,
    /// Siblings from the leaf level upward.
    pub path: Vec<PathElement>,
}

impl MerkleProof {
    /// Fold the path into the root it commits to.
    pub fn compute_root(&self, hasher: &dyn FieldHasher) -> FieldElement {
        self.path.iter().fold(self.leaf, |node, step| {
            if step.is_right {
                hasher.hash2(&step.sibling, &node)
            } else {
                hasher.hash2(&node, &step.sibling)
            }
        })
    }

    /// Whether this proof folds to `root`.
    pub fn verify(&self, root: &FieldElement, hasher: &dyn FieldHasher) -> bool {
        self.compute_root(hasher) == *root
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Fixed-depth Merkle tree over field elements.
#[derive(Clone)]
pub struct IncrementalMerkleTree {
    depth: u32,
    hasher: Arc<dyn FieldHasher>,
    zeros: Vec<FieldElement>,
    /// `layers[0]` holds the leaves; `layers[depth]` holds the root when
    /// the tree is non-empty.
    layers: Vec<Vec<FieldElement>>,
}

impl IncrementalMerkleTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// [`MerkleError::InvalidDepth`] unless `1 <= depth <= 32`.
    pub fn new(depth: u32, hasher: Arc<dyn FieldHasher>) -> Result<Self, MerkleError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(MerkleError::InvalidDepth {
                depth,
                max: MAX_DEPTH,
            });
        }
        let mut zeros = Vec::with_capacity(depth as usize + 1);
        zeros.push(FieldElement::zero());
        for level in 1..=depth as usize {
            let below = zeros[level - 1];
            zeros.push(hasher.hash2(&below, &below));
        }
        let layers = vec![Vec::new(); depth as usize + 1];
        Ok(Self {
            depth,
            hasher,
            zeros,
            layers,
        })
    }

    /// Build a tree holding `leaves` in order.
    pub fn from_leaves(
        depth: u32,
        hasher: Arc<dyn FieldHasher>,
        leaves: &[FieldElement],
    ) -> Result<Self, MerkleError> {
        let mut tree = Self::new(depth, hasher)?;
        tree.remove_and_reindex(leaves)?;
        Ok(tree)
    }

    /// Tree depth, fixed for its lifetime.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Maximum number of leaves, `2^depth`.
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Number of occupied leaf slots.
    pub fn len(&self) -> u64 {
        self.layers[0].len() as u64
    }

    /// True when no leaf has been added.
    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// The leaves in index order.
    pub fn leaves(&self) -> &[FieldElement] {
        &self.layers[0]
    }

    /// The hasher this tree was built with.
    pub fn hasher(&self) -> &Arc<dyn FieldHasher> {
        &self.hasher
    }

    /// The zero value at `level` (0 = leaf level).
    pub fn zero(&self, level: u32) -> Option<FieldElement> {
        self.zeros.get(level as usize).copied()
    }

    /// Root of the empty tree of this depth.
    pub fn empty_root(&self) -> FieldElement {
        self.zeros[self.depth as usize]
    }

    /// Current root, or `zero[depth]` when empty.
    pub fn root(&self) -> FieldElement {
        self.layers[self.depth as usize]
            .first()
            .copied()
            .unwrap_or_else(|| self.empty_root())
    }

    /// Append a leaf at the next free index and return that index.
    ///
    /// # Errors
    ///
    /// [`MerkleError::TreeFull`] at capacity. The tree is unchanged.
    pub fn add_leaf(&mut self, value: FieldElement) -> Result<u64, MerkleError> {
        if self.len() >= self.capacity() {
            return Err(MerkleError::TreeFull {
                capacity: self.capacity(),
            });
        }
        let index = self.len();
        self.layers[0].push(value);
        self.rebuild();
        Ok(index)
    }

    /// Replace the leaf set with `survivors`, in the given order.
    ///
    /// Survivor `i` lands at index `i`. Callers persist the returned indices.
    ///
    /// # Errors
    ///
    /// [`MerkleError::TreeFull`] if `survivors` exceeds capacity. The tree
    /// is unchanged.
    pub fn remove_and_reindex(
        &mut self,
        survivors: &[FieldElement],
    ) -> Result<Vec<u64>, MerkleError> {
        if survivors.len() as u64 > self.capacity() {
            return Err(MerkleError::TreeFull {
                capacity: self.capacity(),
            });
        }
        self.layers[0] = survivors.to_vec();
        self.rebuild();
        Ok((0..survivors.len() as u64).collect())
    }

    /// Inclusion proof for the leaf at `index`.
    ///
    /// # Errors
    ///
    /// [`MerkleError::IndexOutOfRange`] if no leaf occupies `index`.
    pub fn proof(&self, index: u64) -> Result<MerkleProof, MerkleError> {
        let leaf = usize::try_from(index)
            .ok()
            .and_then(|i| self.layers[0].get(i).copied())
            .ok_or(MerkleError::IndexOutOfRange {
                index,
                len: self.len(),
            })?;

        let mut path = Vec::with_capacity(self.depth as usize);
        let mut position = index;
        for level in 0..self.depth as usize {
            let sibling_pos = position ^ 1;
            let sibling = usize::try_from(sibling_pos)
                .ok()
                .and_then(|i| self.layers[level].get(i).copied())
                .unwrap_or(self.zeros[level]);
            path.push(PathElement {
                sibling,
                is_right: position & 1 == 1,
            });
            position >>= 1;
        }
        Ok(MerkleProof {
            leaf,
            leaf_index: index,
            path,
        })
    }

    fn rebuild(&mut self) {
        for level in 0..self.depth as usize {
            let zero = self.zeros[level];
            let next: Vec<FieldElement> = self.layers[level]
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&zero);
                    self.hasher.hash2(&pair[0], right)
                })
                .collect();
            self.layers[level + 1] = next;
        }
    }
}

impl std::fmt::Debug for IncrementalMerkleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalMerkleTree")
            .field("depth", &self.depth)
            .field("len", &self.len())
            .field("root", &self.root())
            .finish()
    }
}
