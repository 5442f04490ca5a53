// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the parallel corpus       (Layer 4 - data)
//   Step 2: Load or split the eval corpus  (Layer 4 - data)
//   Step 3: Build tokenizer                (Layer 6 - infra)
//   Step 4: Build datasets                 (Layer 4 - data)
//   Step 5: Device, seed and model         (Layer 5 - ml)
//   Step 6: Trainer with Adam and metrics  (Layer 5 / 6)
//   Step 7: Fit, final evaluation, sample  (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{anyhow, bail, Context, Result};
use burn::{optim::Optimizer, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::TranslationDataset,
    loader::ParallelCorpusLoader,
    splitter::split_train_val,
};
use crate::domain::{
    sentence_pair::SentencePair,
    traits::{CorpusSource, MetricsSink},
};
use crate::infra::{metrics::MetricsLogger, tokenizer_store::TokenizerStore};
use crate::ml::{
    trainer::{adam, Trainer},
    transformer::{one_hot, Transformer, TransformerConfig},
    ComputeBackend,
    TrainingBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters and paths for a training run. Built from
// CLI flags or loaded from a JSON file; missing JSON fields fall
// back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    // ── Data ──
    pub source_path:      String,
    pub target_path:      String,
    pub eval_source_path: Option<String>,
    pub eval_target_path: Option<String>,
    /// Share of the corpus used for training when no eval corpus is given
    pub train_fraction:   f64,
    /// Tokenizer and metrics are written here
    pub output_dir:       String,
    pub vocab_size:       usize,

    // ── Model ──
    pub nheads:     usize,
    pub model_dim:  usize,
    pub hidden_dim: usize,
    pub depth:      usize,
    pub dropout:    f64,

    // ── Optimisation ──
    pub epochs:        usize,
    pub lr:            f64,
    pub batch_size:    usize,
    /// Evaluate every N training batches
    pub eval_rate:     usize,
    pub train_shuffle: bool,
    pub num_workers:   usize,
    pub seed:          u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            source_path:      "data/train.src".to_string(),
            target_path:      "data/train.tgt".to_string(),
            eval_source_path: None,
            eval_target_path: None,
            train_fraction:   0.9,
            output_dir:       "runs".to_string(),
            vocab_size:       8000,
            nheads:           2,
            model_dim:        10,
            hidden_dim:       10,
            depth:            2,
            dropout:          0.1,
            epochs:           1,
            lr:               1e-3,
            batch_size:       8,
            eval_rate:        100,
            train_shuffle:    true,
            num_workers:      0,
            seed:             42,
        }
    }
}

impl TrainConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config JSON in '{}'", path.display()))
    }

    /// Reject settings that would fail deep inside training.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("nheads", self.nheads),
            ("model_dim", self.model_dim),
            ("hidden_dim", self.hidden_dim),
            ("depth", self.depth),
            ("batch_size", self.batch_size),
            ("eval_rate", self.eval_rate),
            ("vocab_size", self.vocab_size),
        ] {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }
        if self.model_dim % self.nheads != 0 {
            bail!("model_dim ({}) must be divisible by nheads ({})", self.model_dim, self.nheads);
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            bail!("lr must be a positive number, got {}", self.lr);
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            bail!("train_fraction must be in (0, 1], got {}", self.train_fraction);
        }
        if self.eval_source_path.is_some() != self.eval_target_path.is_some() {
            bail!("eval_source_path and eval_target_path must be given together");
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end and return
    /// the final evaluation loss.
    pub fn execute(&self) -> Result<f64> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load the training corpus ──────────────────────────────────
        let pairs = ParallelCorpusLoader::new(&cfg.source_path, &cfg.target_path).load_pairs()?;
        if pairs.is_empty() {
            bail!("No usable sentence pairs in '{}'", cfg.source_path);
        }

        // ── Step 2: Evaluation corpus (separate files, or a split) ────────────
        let (train_pairs, eval_pairs) = match (&cfg.eval_source_path, &cfg.eval_target_path) {
            (Some(src), Some(tgt)) => (pairs, ParallelCorpusLoader::new(src, tgt).load_pairs()?),
            _ => split_train_val(pairs, cfg.train_fraction, cfg.seed),
        };
        if train_pairs.is_empty() {
            bail!(
                "Training split is empty: {} evaluation pair(s) with train_fraction={}",
                eval_pairs.len(),
                cfg.train_fraction,
            );
        }
        tracing::info!("Split: {} train, {} evaluation", train_pairs.len(), eval_pairs.len());

        // ── Step 3: Build / load tokenizer ────────────────────────────────────
        let texts: Vec<String> = train_pairs
            .iter()
            .flat_map(|p| [p.source.clone(), p.target.clone()])
            .collect();
        let tokenizer  = TokenizerStore::new(&cfg.output_dir).load_or_build(&texts, cfg.vocab_size)?;
        let vocab_size = tokenizer.get_vocab_size(false);

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        let train_dataset = TranslationDataset::from_pairs(&train_pairs, &tokenizer)?;
        let eval_dataset  = TranslationDataset::from_pairs(&eval_pairs, &tokenizer)?;
        let max_len       = train_dataset.max_len().max(eval_dataset.max_len());

        // ── Step 5: Device, seed and model ────────────────────────────────────
        let device = <TrainingBackend as Backend>::Device::default();
        TrainingBackend::seed(cfg.seed);
        tracing::info!("Using device: {:?}", device);

        let model = TransformerConfig::new(
            vocab_size, cfg.model_dim, cfg.hidden_dim, cfg.nheads, max_len, cfg.depth,
        )
        .with_dropout(cfg.dropout)
        .init::<TrainingBackend>(&device)?;
        tracing::info!(
            "Model ready: depth={}, model_dim={}, nheads={}, vocab_size={}, max_len={}",
            model.depth(), cfg.model_dim, cfg.nheads, model.vocab_size(), model.max_len(),
        );

        // ── Step 6: Trainer ───────────────────────────────────────────────────
        let logger       = MetricsLogger::new(&cfg.output_dir)?;
        let metrics_path = logger.csv_path().to_path_buf();
        let metrics: Box<dyn MetricsSink> = Box::new(logger);
        let mut trainer = Trainer::new(
            cfg.clone(),
            model,
            adam::<TrainingBackend>(),
            train_dataset,
            eval_dataset,
            Some(metrics),
            device.clone(),
        );

        // ── Step 7: Fit, evaluate, show one prediction ────────────────────────
        trainer.fit()?;
        let eval_loss = trainer.evaluate()?;
        tracing::info!(
            "Training finished after {} steps, metrics in '{}'",
            trainer.step_count(),
            metrics_path.display(),
        );

        if let Some(pair) = eval_pairs.first() {
            let prediction = sample_prediction(&trainer, &tokenizer, pair, &device)?;
            tracing::info!(
                "Sample | source: {:?} | reference: {:?} | prediction: {:?}",
                pair.source,
                pair.target,
                prediction,
            );
        }

        Ok(eval_loss)
    }
}

/// Greedy read-out of `Trainer::predict` for one sentence.
fn sample_prediction<O>(
    trainer:   &Trainer<TrainingBackend, O>,
    tokenizer: &Tokenizer,
    pair:      &SentencePair,
    device:    &<ComputeBackend as Backend>::Device,
) -> Result<String>
where
    O: Optimizer<Transformer<TrainingBackend>, TrainingBackend>,
{
    let encoding = tokenizer
        .encode(pair.source.as_str(), false)
        .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
    let ids: Vec<i32> = encoding.get_ids().iter().map(|&id| id as i32).collect();
    if ids.is_empty() {
        return Ok(String::new());
    }

    let source = Tensor::<ComputeBackend, 1, Int>::from_ints(ids.as_slice(), device)
        .reshape([1, ids.len()]);
    let inputs = one_hot(source, trainer.model().vocab_size())?;
    let logits = trainer.predict(inputs)?;

    let predicted: Vec<u32> = logits
        .argmax(2)
        .into_data()
        .iter::<i64>()
        .map(|id| id as u32)
        .collect();

    tokenizer
        .decode(&predicted, true)
        .map_err(|e| anyhow!("Cannot decode prediction: {e}"))
}
