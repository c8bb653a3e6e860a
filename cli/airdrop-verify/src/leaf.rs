//! Leaf encoding: a claim becomes `keccak256(index ‖ account ‖ amount)`,
//! the tight (unpadded) packing of `(uint256, address, uint256)`.

use crate::common::keccak256;
use crate::types::{Address, Claim, Digest, U256};

/// Length of the packed leaf preimage: 32 + 20 + 32 bytes.
pub const PACKED_LEN: usize = U256::BYTES + Address::BYTES + U256::BYTES;

/// Packs a claim triple the way Solidity's `abi.encodePacked` does for
/// `(uint256, address, uint256)`.
pub fn pack_leaf(index: &U256, account: &Address, amount: &U256) -> [u8; PACKED_LEN] {
    let mut packed = [0u8; PACKED_LEN];
    packed[..U256::BYTES].copy_from_slice(&index.0);
    packed[U256::BYTES..U256::BYTES + Address::BYTES].copy_from_slice(&account.0);
    packed[U256::BYTES + Address::BYTES..].copy_from_slice(&amount.0);
    packed
}

/// Hashes a claim triple into its leaf digest.
pub fn encode_leaf(index: &U256, account: &Address, amount: &U256) -> Digest {
    Digest(keccak256(&pack_leaf(index, account, amount)))
}

impl Claim {
    pub fn leaf(&self) -> Digest {
        encode_leaf(&self.index, &self.account, &self.amount)
    }
}
