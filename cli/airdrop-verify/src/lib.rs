pub mod common;
pub mod distribution;
pub mod error;
pub mod leaf;
pub mod proof;
pub mod tree;
pub mod types;

pub use common::{hex_encode, keccak256, keccak256_hash, strip_hex_prefix, write_file_atomic};
pub use distribution::{
    verify_distribution, BalanceMap, ClaimOutcome, DistributionFile, IntegerField,
    VerificationReport,
};
pub use error::{BuildError, EmptyInputError, EncodingError};
pub use leaf::{encode_leaf, pack_leaf};
pub use proof::{verify, verify_all, ProvenClaim};
pub use tree::{build_root, combine, hash_pair, next_layer, MerkleTree};
pub use types::{Address, Claim, Digest, U256};
