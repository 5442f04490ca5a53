// ============================================================
// Layer 4 — Train/Evaluation Splitter
// ============================================================
// Shuffles sentence pairs and splits them into two sets when
// no separate evaluation corpus is given:
//   - Training set:   drives the optimiser
//   - Evaluation set: measured by Trainer::evaluate
//
// The shuffle is seeded from TrainConfig::seed, so the same
// config always produces the same split.
//
// Reference: rand crate documentation (StdRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with a seeded RNG and split into (train, eval).
///
/// `train_fraction` is clamped into [0, 1].
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    let split_at = ((total as f64) * fraction).round() as usize;
    let split_at = split_at.min(total);

    let eval = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} evaluation",
        samples.len(),
        eval.len(),
    );

    (samples, eval)
}
