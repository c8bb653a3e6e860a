use rayon::prelude::*;
use tracing::debug;

use crate::common::keccak256_hash;
use crate::error::EmptyInputError;
use crate::types::{Claim, Digest};

/// Layers smaller than this are combined on the calling thread.
const PARALLEL_LAYER_THRESHOLD: usize = 1 << 12;

/// Hashes two nodes into their parent. The pair is sorted first, so the
/// result does not depend on argument order.
pub fn hash_pair(a: Digest, b: Digest) -> Digest {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    Digest(keccak256_hash(left.0, right.0))
}

/// Combines two optional nodes. A missing partner promotes the other node
/// unchanged, which is how the trailing element of an odd layer moves up.
pub fn combine(a: Option<Digest>, b: Option<Digest>) -> Option<Digest> {
    match (a, b) {
        (Some(a), Some(b)) => Some(hash_pair(a, b)),
        (None, other) | (other, None) => other,
    }
}

fn combine_chunk(chunk: &[Digest]) -> Digest {
    match *chunk {
        [left, right] => hash_pair(left, right),
        [single] => single,
        _ => unreachable!("chunks(2) yields one or two nodes"),
    }
}

/// Derives the parent layer: consecutive pairs are combined and a trailing
/// singleton is carried up. The result has `ceil(n / 2)` nodes.
pub fn next_layer(layer: &[Digest]) -> Vec<Digest> {
    if layer.len() >= PARALLEL_LAYER_THRESHOLD {
        layer.par_chunks(2).map(combine_chunk).collect()
    } else {
        layer.chunks(2).map(combine_chunk).collect()
    }
}

/// A Merkle tree over sorted, deduplicated leaves with commutative pair
/// hashing. `layers[0]` holds the leaves and the last layer holds the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Builds the tree from leaf digests in any order.
    ///
    /// The leaves are sorted ascending and adjacent duplicates are dropped
    /// before layering, so identical claims collapse to a single leaf.
    pub fn from_leaves(mut leaves: Vec<Digest>) -> Result<Self, EmptyInputError> {
        if leaves.is_empty() {
            return Err(EmptyInputError);
        }

        leaves.par_sort_unstable();
        leaves.dedup();
        debug!(leaves = leaves.len(), "Building Merkle tree");

        let mut layers = vec![leaves];
        while let Some(top) = layers.last().filter(|layer| layer.len() > 1) {
            let parent = next_layer(top);
            debug!(level = layers.len(), nodes = parent.len(), "Derived layer");
            layers.push(parent);
        }

        Ok(Self { layers })
    }

    /// Encodes every claim (in parallel) and builds the tree over the leaves.
    pub fn from_claims(claims: &[Claim]) -> Result<Self, EmptyInputError> {
        let leaves = claims.par_iter().map(Claim::leaf).collect();
        Self::from_leaves(leaves)
    }

    pub fn root(&self) -> Digest {
        // from_leaves guarantees at least one layer ending in a single node
        self.layers[self.layers.len() - 1][0]
    }

    /// Sorted, deduplicated leaf layer.
    pub fn leaves(&self) -> &[Digest] {
        &self.layers[0]
    }

    pub fn layers(&self) -> &[Vec<Digest>] {
        &self.layers
    }

    /// Number of combination levels between the leaves and the root.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Returns the sibling path from `leaf` up to (excluding) the root, or
    /// `None` if `leaf` is not in the tree.
    ///
    /// A node without a sibling is promoted unchanged, so that level
    /// contributes nothing to the proof.
    pub fn proof(&self, leaf: &Digest) -> Option<Vec<Digest>> {
        let mut position = self.leaves().binary_search(leaf).ok()?;
        let mut proof = Vec::with_capacity(self.depth());

        for layer in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = layer.get(position ^ 1) {
                proof.push(*sibling);
            }
            position /= 2;
        }

        Some(proof)
    }
}

/// Reconstructs the root committed to by `claims`.
///
/// Each claim is encoded with its own `index` field.
pub fn build_root(claims: &[Claim]) -> Result<Digest, EmptyInputError> {
    MerkleTree::from_claims(claims).map(|tree| tree.root())
}
