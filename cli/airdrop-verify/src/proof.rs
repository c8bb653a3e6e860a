use rayon::prelude::*;

use crate::leaf::encode_leaf;
use crate::tree::hash_pair;
use crate::types::{Address, Claim, Digest, U256};

/// Checks that `proof` leads from the claim's leaf to `expected_root`.
///
/// Siblings carry no left/right flag; each step sorts the pair before
/// hashing. A mismatch is `false`, never an error.
pub fn verify(
    index: &U256,
    account: &Address,
    amount: &U256,
    proof: &[Digest],
    expected_root: &Digest,
) -> bool {
    let leaf = encode_leaf(index, account, amount);
    let computed = proof
        .iter()
        .fold(leaf, |node, sibling| hash_pair(node, *sibling));
    computed == *expected_root
}

/// A claim together with the sibling path published for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvenClaim {
    pub claim: Claim,
    pub proof: Vec<Digest>,
}

impl ProvenClaim {
    pub fn verify(&self, expected_root: &Digest) -> bool {
        verify(
            &self.claim.index,
            &self.claim.account,
            &self.claim.amount,
            &self.proof,
            expected_root,
        )
    }
}

/// Verifies every claim against `expected_root` on the rayon pool.
/// Results are returned in input order.
pub fn verify_all(claims: &[ProvenClaim], expected_root: &Digest) -> Vec<bool> {
    claims
        .par_iter()
        .map(|claim| claim.verify(expected_root))
        .collect()
}
