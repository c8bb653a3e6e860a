use anyhow::Context;
use sha3::{Digest as _, Keccak256};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Removes a leading "0x" (or "0X") from a trimmed hex string.
pub fn strip_hex_prefix(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Encodes bytes as lowercase hex with a "0x" prefix.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Computes the Keccak256 hash of a byte string.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Keccak256 of `left ‖ right`, in the order given.
pub fn keccak256_hash(left: [u8; 32], right: [u8; 32]) -> [u8; 32] {
    let hash = Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();
    hash.into()
}

/// Writes `contents` to `path` through a sibling temp file and a rename,
/// so readers never observe a half-written file.
pub fn write_file_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).context("Failed to create temp file")?;
    file.write_all(contents.as_bytes())
        .context("Failed to write to temp file")?;
    file.flush().context("Failed to flush temp file")?;
    file.sync_all().context("Failed to sync temp file")?;
    std::fs::rename(&temp_path, path).context("Failed to move temp file to output")?;
    Ok(())
}
