// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// One aligned translation example: line N of the source file
// and line N of the target file, already cleaned.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    /// Sentence in the source language
    pub source: String,

    /// Reference translation in the target language
    pub target: String,
}

impl SentencePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// A pair is usable only when both sides carry text
    pub fn is_complete(&self) -> bool {
        !self.source.trim().is_empty() && !self.target.trim().is_empty()
    }
}
