use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use airdrop_verify::{verify_distribution, DistributionFile};

#[derive(Args, Debug)]
pub struct Cli {
    /// Input JSON file containing the Merkle root and a proof for each account
    #[arg(short, long)]
    input: PathBuf,
}

pub fn run(args: Cli) -> Result<()> {
    println!("Reading distribution from {:?}...", args.input);
    let content = fs::read_to_string(&args.input).context("Failed to read distribution file")?;
    let file =
        DistributionFile::from_json(&content).context("Failed to parse distribution JSON")?;

    let started = Instant::now();
    let report = verify_distribution(&file);
    info!(
        claims = report.outcomes.len(),
        elapsed = ?started.elapsed(),
        "Verified distribution"
    );

    for outcome in &report.outcomes {
        match &outcome.verified {
            Ok(true) => println!("Verified proof for {}", outcome.account),
            Ok(false) => println!("Verification for {} failed", outcome.account),
            Err(e) => println!("Verification for {} failed: {}", outcome.account, e),
        }
    }
    println!("Done!");

    let root = report
        .reconstructed_root
        .context("Failed to reconstruct Merkle root")?;
    println!("Reconstructed merkle root {}", root);
    println!(
        "Root matches the one read from the JSON? {}",
        report.root_matches()
    );

    let failed = report.failed_claims();
    if failed > 0 {
        anyhow::bail!(
            "{} of {} claims failed verification",
            failed,
            report.outcomes.len()
        );
    }
    if !report.root_matches() {
        anyhow::bail!(
            "Reconstructed root {} does not match {}",
            root,
            report.expected_root
        );
    }

    Ok(())
}
