//! The distribution file: a committed root plus, per account, the claim
//! index, amount and sibling path.
//!
//! ```json
//! {
//!   "merkleRoot": "0x…",
//!   "tokenTotal": "0x…",
//!   "claims": {
//!     "0x…": { "index": 0, "amount": "0x…", "proof": ["0x…"] }
//!   }
//! }
//! ```
//!
//! Claim entries are decoded one at a time so that a malformed entry only
//! fails itself; a malformed `merkleRoot` fails the whole file.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{BuildError, EmptyInputError, EncodingError};
use crate::proof::{verify_all, ProvenClaim};
use crate::tree::MerkleTree;
use crate::types::{Address, Claim, Digest, U256};

/// An integer written either as a JSON number or as a decimal/hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntegerField {
    Number(u64),
    Text(String),
}

impl IntegerField {
    pub fn to_u256(&self) -> Result<U256, EncodingError> {
        match self {
            Self::Number(value) => Ok(U256::from(*value)),
            Self::Text(text) => text.parse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    pub index: IntegerField,
    pub amount: IntegerField,
    pub proof: Vec<String>,
}

impl ClaimEntry {
    fn decode(&self, account: &str) -> Result<ProvenClaim, EncodingError> {
        let claim = Claim {
            index: self.index.to_u256()?,
            account: account.parse()?,
            amount: self.amount.to_u256()?,
        };
        let proof = self
            .proof
            .iter()
            .map(|node| node.parse::<Digest>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProvenClaim { claim, proof })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionFile {
    pub merkle_root: Digest,
    /// Informational only; verification never reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_total: Option<IntegerField>,
    /// Account -> raw claim entry, in file order.
    pub claims: Map<String, Value>,
}

/// One `claims` entry after decoding, keyed by the account as written.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClaim {
    pub account: String,
    pub claim: Result<ProvenClaim, EncodingError>,
}

impl DistributionFile {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Decodes every entry of `claims`, keeping file order.
    pub fn decode_claims(&self) -> Vec<DecodedClaim> {
        self.claims
            .iter()
            .map(|(account, raw)| {
                let claim = ClaimEntry::deserialize(raw)
                    .map_err(|e| EncodingError::MalformedClaim(e.to_string()))
                    .and_then(|entry| entry.decode(account));
                if let Err(e) = &claim {
                    warn!(%account, error = %e, "Skipping undecodable claim");
                }
                DecodedClaim {
                    account: account.clone(),
                    claim,
                }
            })
            .collect()
    }

    /// Builds a distribution from an account -> amount map.
    ///
    /// Accounts are ordered by address bytes and numbered from zero in that
    /// order; each entry carries the proof for its leaf.
    pub fn from_balances(balances: &BalanceMap) -> Result<Self, BuildError> {
        let mut accounts: BTreeMap<Address, U256> = BTreeMap::new();
        let mut total = BigUint::default();

        for (account, amount) in &balances.0 {
            let encoding = |source: EncodingError| BuildError::Encoding {
                account: account.clone(),
                source,
            };
            let address: Address = account.parse().map_err(encoding)?;
            let amount = amount.to_u256().map_err(encoding)?;
            if accounts.insert(address, amount).is_some() {
                return Err(BuildError::DuplicateAccount(address.to_string()));
            }
            total += amount.to_biguint();
        }
        let token_total = U256::try_from(&total).map_err(|_| BuildError::TotalOverflow)?;

        let claims: Vec<Claim> = accounts
            .iter()
            .zip(0u64..)
            .map(|((account, amount), index)| Claim::new(index, *account, *amount))
            .collect();
        let tree = MerkleTree::from_claims(&claims)?;
        debug!(claims = claims.len(), depth = tree.depth(), "Built distribution tree");

        let mut entries = Map::with_capacity(claims.len());
        for (claim, index) in claims.iter().zip(0u64..) {
            // every claim's leaf is in the tree it was built into
            let proof = tree
                .proof(&claim.leaf())
                .unwrap_or_default()
                .iter()
                .map(Digest::to_string)
                .collect();
            let entry = ClaimEntry {
                index: IntegerField::Number(index),
                amount: IntegerField::Text(claim.amount.to_hex_string()),
                proof,
            };
            let value = serde_json::to_value(entry).map_err(|e| BuildError::Encoding {
                account: claim.account.to_string(),
                source: EncodingError::MalformedClaim(e.to_string()),
            })?;
            entries.insert(claim.account.to_string(), value);
        }

        Ok(Self {
            merkle_root: tree.root(),
            token_total: Some(IntegerField::Text(token_total.to_hex_string())),
            claims: entries,
        })
    }
}

/// Input to the generator: account -> amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceMap(pub BTreeMap<String, IntegerField>);

impl BalanceMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Verification outcome for one entry of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub account: String,
    /// `Ok(false)` is a proof that does not lead to the root; `Err` is an
    /// entry that could not be decoded at all.
    pub verified: Result<bool, EncodingError>,
}

impl ClaimOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self.verified, Ok(true))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub outcomes: Vec<ClaimOutcome>,
    pub expected_root: Digest,
    /// Root rebuilt from every decodable claim, ignoring the published proofs.
    pub reconstructed_root: Result<Digest, EmptyInputError>,
}

impl VerificationReport {
    pub fn failed_claims(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_verified()).count()
    }

    pub fn root_matches(&self) -> bool {
        self.reconstructed_root.as_ref() == Ok(&self.expected_root)
    }

    pub fn is_valid(&self) -> bool {
        self.failed_claims() == 0 && self.root_matches()
    }
}

/// Checks every published proof against the file's root and independently
/// rebuilds the root from the claims.
pub fn verify_distribution(file: &DistributionFile) -> VerificationReport {
    let decoded = file.decode_claims();
    let proven: Vec<ProvenClaim> = decoded
        .iter()
        .filter_map(|d| d.claim.as_ref().ok().cloned())
        .collect();

    let mut results = verify_all(&proven, &file.merkle_root).into_iter();
    let outcomes = decoded
        .into_iter()
        .map(|d| ClaimOutcome {
            verified: match d.claim {
                Ok(_) => Ok(results.next().unwrap_or(false)),
                Err(e) => Err(e),
            },
            account: d.account,
        })
        .collect();

    let claims: Vec<Claim> = proven.iter().map(|p| p.claim).collect();
    let reconstructed_root = MerkleTree::from_claims(&claims).map(|tree| tree.root());

    VerificationReport {
        outcomes,
        expected_root: file.merkle_root,
        reconstructed_root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_root;
    use serde_json::json;

    const ACCOUNT_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ACCOUNT_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn two_claim_file() -> DistributionFile {
        let a = Claim::new(0u64, ACCOUNT_A.parse().unwrap(), 100u64);
        let b = Claim::new(1u64, ACCOUNT_B.parse().unwrap(), 200u64);
        let root = build_root(&[a, b]).unwrap();
        let value = json!({
            "merkleRoot": root.to_string(),
            "claims": {
                ACCOUNT_A: { "index": 0, "amount": "100", "proof": [b.leaf().to_string()] },
                ACCOUNT_B: { "index": 1, "amount": "0xc8", "proof": [a.leaf().to_string()] },
            }
        });
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_verify_two_claim_file() {
        let report = verify_distribution(&two_claim_file());
        assert_eq!(report.failed_claims(), 0);
        assert!(report.root_matches());
        assert!(report.is_valid());
    }

    #[test]
    fn test_tampered_amount_fails_only_that_claim() {
        let mut file = two_claim_file();
        file.claims[ACCOUNT_A]["amount"] = json!("999");
        let report = verify_distribution(&file);

        assert_eq!(report.outcomes[0].verified, Ok(false));
        assert_eq!(report.outcomes[1].verified, Ok(true));
        assert!(!report.root_matches());
    }

    #[test]
    fn test_malformed_entry_is_isolated() {
        let mut file = two_claim_file();
        file.claims[ACCOUNT_B]["proof"] = json!(["0x1234"]);
        let report = verify_distribution(&file);

        assert!(report.outcomes[0].is_verified());
        assert_eq!(
            report.outcomes[1].verified,
            Err(EncodingError::DigestLength(2))
        );
        assert_eq!(report.failed_claims(), 1);
        // the root is rebuilt from the remaining claim only
        let a = Claim::new(0u64, ACCOUNT_A.parse().unwrap(), 100u64);
        assert_eq!(report.reconstructed_root, Ok(a.leaf()));
    }

    #[test]
    fn test_bad_account_key_is_isolated() {
        let mut file = two_claim_file();
        let entry = file.claims.remove(ACCOUNT_B).unwrap();
        file.claims.insert("0xnothex".to_string(), entry);
        let outcome = &verify_distribution(&file).outcomes[1];
        assert_eq!(outcome.account, "0xnothex");
        assert_eq!(outcome.verified, Err(EncodingError::AddressHexLength(6)));
    }

    #[test]
    fn test_entry_with_wrong_shape() {
        let mut file = two_claim_file();
        file.claims[ACCOUNT_A] = json!({ "index": 0 });
        let outcome = &verify_distribution(&file).outcomes[0];
        assert!(matches!(
            outcome.verified,
            Err(EncodingError::MalformedClaim(_))
        ));
    }

    #[test]
    fn test_amount_overflow_is_encoding_error() {
        let mut file = two_claim_file();
        file.claims[ACCOUNT_A]["amount"] = json!(format!("0x1{}", "00".repeat(32)));
        let outcome = &verify_distribution(&file).outcomes[0];
        assert_eq!(outcome.verified, Err(EncodingError::Overflow));
    }

    #[test]
    fn test_empty_claims_has_no_root() {
        let file: DistributionFile = serde_json::from_value(json!({
            "merkleRoot": format!("0x{}", "00".repeat(32)),
            "claims": {}
        }))
        .unwrap();
        let report = verify_distribution(&file);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.reconstructed_root, Err(EmptyInputError));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_numeric_token_total_is_accepted() {
        let json = format!(
            r#"{{"merkleRoot": "0x{}", "tokenTotal": 1000, "claims": {{}}}}"#,
            "00".repeat(32)
        );
        let file = DistributionFile::from_json(&json).unwrap();
        assert_eq!(file.token_total, Some(IntegerField::Number(1000)));

        let mut file = two_claim_file();
        file.token_total = Some(IntegerField::Number(300));
        let reparsed = DistributionFile::from_json(&file.to_json_pretty().unwrap()).unwrap();
        assert!(verify_distribution(&reparsed).is_valid());
    }

    #[test]
    fn test_malformed_root_rejects_file() {
        let result = DistributionFile::from_json(r#"{"merkleRoot": "0x1234", "claims": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_claims_keep_file_order() {
        let json = format!(
            r#"{{"merkleRoot": "0x{}", "claims": {{"{ACCOUNT_B}": {{}}, "{ACCOUNT_A}": {{}}}}}}"#,
            "00".repeat(32)
        );
        let file = DistributionFile::from_json(&json).unwrap();
        let accounts: Vec<_> = file.decode_claims().into_iter().map(|d| d.account).collect();
        assert_eq!(accounts, vec![ACCOUNT_B, ACCOUNT_A]);
    }

    #[test]
    fn test_from_balances() {
        let balances = BalanceMap::from_json(&format!(
            r#"{{"{ACCOUNT_B}": "200", "{ACCOUNT_A}": 100}}"#
        ))
        .unwrap();
        let file = DistributionFile::from_balances(&balances).unwrap();

        assert_eq!(
            file.token_total,
            Some(IntegerField::Text("0x012c".to_string()))
        );
        assert_eq!(file.claims[ACCOUNT_A]["index"], json!(0));
        assert_eq!(file.claims[ACCOUNT_B]["index"], json!(1));
        assert_eq!(file.claims[ACCOUNT_B]["amount"], json!("0xc8"));
        assert_eq!(file, two_claim_file_with_total());
        assert!(verify_distribution(&file).is_valid());
    }

    fn two_claim_file_with_total() -> DistributionFile {
        let mut file = two_claim_file();
        file.token_total = Some(IntegerField::Text("0x012c".to_string()));
        file.claims[ACCOUNT_A]["amount"] = json!("0x64");
        file
    }

    #[test]
    fn test_from_balances_duplicate_account() {
        let upper = ACCOUNT_A.to_uppercase().replacen("0X", "0x", 1);
        let balances = BalanceMap(BTreeMap::from([
            (ACCOUNT_A.to_string(), IntegerField::Number(1)),
            (upper, IntegerField::Number(2)),
        ]));
        assert_eq!(
            DistributionFile::from_balances(&balances),
            Err(BuildError::DuplicateAccount(ACCOUNT_A.to_string()))
        );
    }

    #[test]
    fn test_from_balances_empty() {
        assert_eq!(
            DistributionFile::from_balances(&BalanceMap::default()),
            Err(BuildError::Empty(EmptyInputError))
        );
    }

    #[test]
    fn test_from_balances_total_overflow() {
        let max = format!("0x{}", "ff".repeat(32));
        let balances = BalanceMap(BTreeMap::from([
            (ACCOUNT_A.to_string(), IntegerField::Text(max.clone())),
            (ACCOUNT_B.to_string(), IntegerField::Text(max)),
        ]));
        assert_eq!(
            DistributionFile::from_balances(&balances),
            Err(BuildError::TotalOverflow)
        );
    }

    #[test]
    fn test_from_balances_bad_amount() {
        let balances = BalanceMap(BTreeMap::from([(
            ACCOUNT_A.to_string(),
            IntegerField::Text("ten".to_string()),
        )]));
        assert!(matches!(
            DistributionFile::from_balances(&balances),
            Err(BuildError::Encoding { .. })
        ));
    }
}
