// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train` subcommand and all its flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{ArgAction, Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the translation model on a parallel corpus
    Train(TrainArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON file with a full or partial TrainConfig.
    /// When given, the other flags are ignored.
    #[arg(long)]
    pub config: Option<String>,

    /// Source-language file, one sentence per line
    #[arg(long, default_value = "data/train.src")]
    pub source: String,

    /// Target-language file, aligned line by line with --source
    #[arg(long, default_value = "data/train.tgt")]
    pub target: String,

    /// Separate evaluation source file (requires --eval-target)
    #[arg(long)]
    pub eval_source: Option<String>,

    /// Separate evaluation target file (requires --eval-source)
    #[arg(long)]
    pub eval_target: Option<String>,

    /// Share of the corpus used for training when no eval files are given
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Directory for the tokenizer and metrics.csv
    #[arg(long, default_value = "runs")]
    pub output_dir: String,

    /// Upper bound on the vocabulary, special tokens included
    #[arg(long, default_value_t = 8000)]
    pub vocab_size: usize,

    /// Number of attention heads; must divide --model-dim
    #[arg(long, default_value_t = 2)]
    pub nheads: usize,

    /// Width of every token representation
    #[arg(long, default_value_t = 10)]
    pub model_dim: usize,

    /// Inner width of the feed-forward networks
    #[arg(long, default_value_t = 10)]
    pub hidden_dim: usize,

    /// Number of encoder layers (and of decoder layers)
    #[arg(long, default_value_t = 2)]
    pub depth: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Run an evaluation every N training batches
    #[arg(long, default_value_t = 100)]
    pub eval_rate: usize,

    /// Shuffle the training set each epoch (`--train-shuffle false` to disable)
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub train_shuffle: bool,

    /// DataLoader worker threads; 0 batches on the calling thread
    #[arg(long, default_value_t = 0)]
    pub num_workers: usize,

    /// Seeds the backend RNG, the split and the shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            source_path:      a.source,
            target_path:      a.target,
            eval_source_path: a.eval_source,
            eval_target_path: a.eval_target,
            train_fraction:   a.train_fraction,
            output_dir:       a.output_dir,
            vocab_size:       a.vocab_size,
            nheads:           a.nheads,
            model_dim:        a.model_dim,
            hidden_dim:       a.hidden_dim,
            depth:            a.depth,
            dropout:          a.dropout,
            epochs:           a.epochs,
            lr:               a.lr,
            batch_size:       a.batch_size,
            eval_rate:        a.eval_rate,
            train_shuffle:    a.train_shuffle,
            num_workers:      a.num_workers,
            seed:             a.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> TrainArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Train(args) => args,
        }
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let cfg: TrainConfig = parse(&["seq2seq-transformer", "train"]).into();
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn test_flags_reach_config() {
        let cfg: TrainConfig = parse(&[
            "seq2seq-transformer", "train",
            "--source", "a.en", "--target", "a.de",
            "--nheads", "4", "--model-dim", "32",
            "--train-shuffle", "false",
        ])
        .into();

        assert_eq!(cfg.source_path, "a.en");
        assert_eq!(cfg.target_path, "a.de");
        assert_eq!(cfg.nheads, 4);
        assert_eq!(cfg.model_dim, 32);
        assert!(!cfg.train_shuffle);
    }
}
