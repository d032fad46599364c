//! Quest Adjudicator CLI
//!
//! Hashes rules documents and replays proof fixtures through a contract.
//! Logs go to stderr; stdout carries only the requested output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quest_adjudicator::{
    host::fixtures::{load_batch, load_rules, run_flow},
    QuestContract, SimulatorConfig, VERSION,
};

/// Off-chain quest adjudication simulator
#[derive(Parser)]
#[command(name = "quest-adjudicator")]
#[command(about = "Rules hashing, proof admission and payout simulation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rules hash of a rules document
    Hash {
        /// Rules document (JSON)
        rules: PathBuf,

        /// Print the canonical encoding before the hash
        #[arg(long)]
        canonical: bool,
    },

    /// Submit a proof batch, settle the player and print its state
    Run {
        /// Rules document (JSON)
        rules: PathBuf,

        /// Proof batch: { "player": ..., "submissions": [...] }
        proofs: PathBuf,

        /// Log rejected submissions and continue instead of aborting
        #[arg(long)]
        keep_going: bool,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Quest Adjudicator v{}", VERSION);

    match cli.command {
        Command::Hash { rules, canonical } => hash(rules, canonical),
        Command::Run {
            rules,
            proofs,
            keep_going,
        } => run(rules, proofs, keep_going),
    }
}

fn hash(rules_path: PathBuf, canonical: bool) -> Result<()> {
    let rules = load_rules(&rules_path)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;

    if canonical {
        println!("{}", rules.canonical());
    }
    println!("{}", rules.hash());
    Ok(())
}

fn run(rules_path: PathBuf, proofs_path: PathBuf, keep_going: bool) -> Result<()> {
    let config = SimulatorConfig::from_env();
    let rules = load_rules(&rules_path)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;
    let batch = load_batch(&proofs_path)
        .with_context(|| format!("loading proofs from {}", proofs_path.display()))?;

    info!(
        rules_hash = %rules.hash(),
        player = %batch.player,
        submissions = batch.submissions.len(),
        "running flow"
    );

    let mut contract = QuestContract::new(rules, config);
    let outcome = run_flow(&mut contract, batch, keep_going).context("flow aborted")?;

    let state = serde_json::to_string_pretty(&outcome.state).context("serializing player state")?;
    println!("{state}");
    Ok(())
}
