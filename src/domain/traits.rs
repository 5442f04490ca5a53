// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources and metric
// writers only through these traits:
//
//   CorpusSource — ParallelCorpusLoader reads two aligned text
//                  files
//   MetricsSink  — MetricsLogger appends scalars to a CSV; the
//                  Trainer receives one by injection
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::sentence_pair::SentencePair;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce aligned sentence pairs.
pub trait CorpusSource {
    fn load_pairs(&self) -> Result<Vec<SentencePair>>;
}

// ─── MetricsSink ──────────────────────────────────────────────────────────────
/// Receives scalar training metrics, e.g. `("train/loss", 2.31, 4)`.
///
/// `step` is the number of optimiser steps taken so far.
pub trait MetricsSink {
    fn log_scalar(&self, tag: &str, value: f64, step: usize) -> Result<()>;
}
