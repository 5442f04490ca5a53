// ============================================================
// Layer 5 — Model Errors
// ============================================================
// Contract violations raised by the model layer. These are
// programming errors (wrong shapes, bad hyperparameters), so
// nothing in the crate tries to recover from them. They are
// surfaced to the caller and the current step is abandoned.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model_dim ({model_dim}) must be divisible by nheads ({nheads})")]
    HeadsDoNotDivide { model_dim: usize, nheads: usize },

    #[error("{0} must be greater than zero")]
    ZeroDimension(&'static str),

    #[error("last dimension {found} matches neither vocab_size ({vocab_size}) nor model_dim ({model_dim})")]
    ProjectionMismatch {
        found:      usize,
        vocab_size: usize,
        model_dim:  usize,
    },

    #[error("expected last dimension {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("sequence length {len} exceeds positional table length {max_len}")]
    SequenceTooLong { len: usize, max_len: usize },

    #[error("token id {token} is outside the vocabulary (size {vocab_size})")]
    TokenOutOfRange { token: i64, vocab_size: usize },

    #[error("source batch ({source_batch}) and target batch ({target_batch}) differ")]
    BatchMismatch {
        source_batch: usize,
        target_batch: usize,
    },
}
