use thiserror::Error;

/// A claim field that cannot be turned into its fixed-width binary form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid address length: expected 20 bytes, got {0}")]
    AddressLength(usize),

    #[error("invalid address length: expected 40 hex chars, got {0}")]
    AddressHexLength(usize),

    #[error("invalid address checksum: {0}")]
    AddressChecksum(String),

    #[error("invalid digest length: expected 32 bytes, got {0}")]
    DigestLength(usize),

    #[error("value does not fit in 256 bits")]
    Overflow,

    #[error("invalid unsigned integer: {0:?}")]
    InvalidInteger(String),

    #[error("malformed claim entry: {0}")]
    MalformedClaim(String),
}

/// Requested a root over zero claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot build a Merkle root from an empty claim set")]
pub struct EmptyInputError;

/// Failure while turning a balance map into a distribution file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid entry for {account}: {source}")]
    Encoding {
        account: String,
        #[source]
        source: EncodingError,
    },

    #[error("account {0} appears more than once")]
    DuplicateAccount(String),

    #[error("token total does not fit in 256 bits")]
    TotalOverflow,

    #[error(transparent)]
    Empty(#[from] EmptyInputError),
}
