// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Uses the `clap` crate
// to parse command line arguments; all work is delegated to
// Layer 2 (application).
//
//   seq2seq-transformer train --source en.txt --target de.txt
//   seq2seq-transformer train --config run.json
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs};

use crate::application::train_use_case::{TrainConfig, TrainUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "seq2seq-transformer",
    version,
    about = "Train an encoder-decoder transformer on a parallel text corpus."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI layer only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading training config from '{}'", path);
            TrainConfig::from_json_file(path)?
        }
        None => args.into(),
    };

    tracing::info!(
        "Starting training on '{}' / '{}'",
        config.source_path,
        config.target_path
    );

    let eval_loss = TrainUseCase::new(config).execute()?;
    println!("Training complete. Final eval loss: {eval_loss:.4}");
    Ok(())
}
