use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use airdrop_verify::{write_file_atomic, BalanceMap, DistributionFile};

#[derive(Args, Debug)]
pub struct Cli {
    /// Input JSON file mapping each account to its amount
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for the distribution (root, indices and proofs)
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(args: Cli) -> Result<()> {
    println!("Reading balances from {:?}...", args.input);
    let content = fs::read_to_string(&args.input).context("Failed to read balances file")?;
    let balances = BalanceMap::from_json(&content).context("Failed to parse balances JSON")?;
    println!("Total accounts: {}", balances.0.len());

    println!("Building Merkle tree...");
    let distribution =
        DistributionFile::from_balances(&balances).context("Failed to build distribution")?;
    println!("Merkle root: {}", distribution.merkle_root);
    if let Some(Ok(total)) = distribution.token_total.as_ref().map(|t| t.to_u256()) {
        println!("Token total: {}", total);
    }

    println!("Writing distribution to {:?}...", args.output);
    let json_output = distribution
        .to_json_pretty()
        .context("Failed to serialize JSON")?;
    write_file_atomic(&args.output, &json_output).context("Failed to write distribution file")?;

    println!("Done!");
    Ok(())
}
