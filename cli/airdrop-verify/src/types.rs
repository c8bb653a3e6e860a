use core::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Num;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::{hex_encode, keccak256, strip_hex_prefix};
use crate::error::EncodingError;

/// A 32-byte Keccak256 output. Leaves, inner nodes and roots are all digests.
///
/// Ordering is byte-lexicographic, which is the order used both to sort the
/// leaf layer and to arrange a pair before hashing it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(pub [u8; Digest::BYTES]);

impl Digest {
    pub const BYTES: usize = 32;

    pub const fn new(bytes: [u8; Self::BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; Self::BYTES] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(self.0))
    }
}

impl fmt::LowerHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; Digest::BYTES]> for Digest {
    fn from(bytes: [u8; Digest::BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = EncodingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; Self::BYTES]>::try_from(value)
            .map(Self)
            .map_err(|_| EncodingError::DigestLength(value.len()))
    }
}

impl FromStr for Digest {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s))?;
        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A 20-byte account address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; Address::BYTES]);

impl Address {
    pub const BYTES: usize = 20;

    pub const fn as_bytes(&self) -> &[u8; Self::BYTES] {
        &self.0
    }

    /// EIP-55 mixed-case rendering: a hex letter is uppercased when the
    /// matching nibble of `keccak256(lowercase_hex)` is 8 or more.
    pub fn to_checksum_string(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let checksummed: String = lower
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let nibble = (hash[i / 2] >> (4 * (1 - i % 2))) & 0x0f;
                if nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();
        format!("0x{checksummed}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_encode(self.0))
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = EncodingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; Self::BYTES]>::try_from(value)
            .map(Self)
            .map_err(|_| EncodingError::AddressLength(value.len()))
    }
}

/// Parses an address from a hex string, with or without "0x" prefix.
///
/// All-lowercase and all-uppercase input is taken as is; mixed-case input
/// must carry a valid EIP-55 checksum.
impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = strip_hex_prefix(s);
        if cleaned.len() != 2 * Self::BYTES {
            return Err(EncodingError::AddressHexLength(cleaned.len()));
        }
        let mut address = [0u8; Self::BYTES];
        hex::decode_to_slice(cleaned, &mut address)?;
        let address = Self(address);

        let has_lower = cleaned.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = cleaned.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum_string()[2..] != *cleaned {
            return Err(EncodingError::AddressChecksum(s.trim().to_string()));
        }
        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Unsigned 256-bit integer, held as 32 big-endian bytes (its ABI encoding).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256(pub [u8; U256::BYTES]);

impl U256 {
    pub const BYTES: usize = 32;
    pub const ZERO: Self = Self([0u8; Self::BYTES]);

    pub const fn to_be_bytes(self) -> [u8; Self::BYTES] {
        self.0
    }

    pub fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// Minimal even-length hex rendering, e.g. `0x64` for 100 and `0x00` for 0.
    pub fn to_hex_string(self) -> String {
        let first = self.0.iter().position(|&b| b != 0).unwrap_or(Self::BYTES - 1);
        hex_encode(&self.0[first..])
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; Self::BYTES];
        bytes[Self::BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl TryFrom<&BigUint> for U256 {
    type Error = EncodingError;

    fn try_from(value: &BigUint) -> Result<Self, Self::Error> {
        let raw = value.to_bytes_be();
        if raw.len() > Self::BYTES {
            return Err(EncodingError::Overflow);
        }
        let mut bytes = [0u8; Self::BYTES];
        bytes[Self::BYTES - raw.len()..].copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl From<U256> for BigUint {
    fn from(value: U256) -> Self {
        value.to_biguint()
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

/// Parses a decimal string, or a hex string when prefixed with "0x".
impl FromStr for U256 {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, radix) = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex_digits) => (hex_digits, 16),
            None => (trimmed, 10),
        };
        let valid = !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
        if !valid {
            return Err(EncodingError::InvalidInteger(s.to_string()));
        }
        let value = BigUint::from_str_radix(digits, radix)
            .map_err(|_| EncodingError::InvalidInteger(s.to_string()))?;
        Self::try_from(&value)
    }
}

/// One attested allocation: the triple that is hashed into a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Claim {
    pub index: U256,
    pub account: Address,
    pub amount: U256,
}

impl Claim {
    pub fn new(index: impl Into<U256>, account: Address, amount: impl Into<U256>) -> Self {
        Self {
            index: index.into(),
            account,
            amount: amount.into(),
        }
    }
}
