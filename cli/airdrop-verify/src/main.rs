#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build_tree;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "airdrop")]
#[command(about = "Merkle airdrop distribution tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "info", "airdrop_verify=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Worker threads for hashing and verification (defaults to one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every proof in a distribution file and rebuild its root
    Verify(verify::Cli),
    /// Build a distribution file from an account -> amount map
    BuildTree(build_tree::Cli),
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    match cli.command {
        Commands::Verify(args) => verify::run(args)?,
        Commands::BuildTree(args) => build_tree::run(args)?,
    }

    Ok(())
}
