// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a
// Vec<TranslationItem> into two padded id tensors.
//
// Source and target sides are padded independently, each to
// the longest sequence of its side within the batch:
//
//   source: [4, 9]      → [4, 9, 0]        target: [7, 3]     → [7, 3, 0, 0]
//           [5, 6, 8]   → [5, 6, 8]                [6, 5, 8, 3] → [6, 5, 8, 3]
//
// Padding uses PAD_ID (0). Flattened ids are turned into a 1D
// tensor and reshaped to [batch, seq].
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationItem;
use crate::domain::special_tokens::PAD_ID;

// ─── TranslationBatch ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// Source token ids — shape: [batch_size, source_len]
    pub source: Tensor<B, 2, Int>,

    /// Target token ids (EOS-terminated) — shape: [batch_size, target_len]
    pub target: Tensor<B, 2, Int>,
}

// ─── TranslationBatcher ───────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn padded(&self, rows: Vec<&[u32]>) -> Tensor<B, 2, Int> {
        let batch_size = rows.len();
        let seq_len    = rows.iter().map(|r| r.len()).max().unwrap_or(0);

        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|row| {
                row.iter()
                    .map(|&id| id as i32)
                    .chain(std::iter::repeat(PAD_ID as i32).take(seq_len - row.len()))
            })
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([batch_size, seq_len])
    }
}

impl<B: Backend> Batcher<TranslationItem, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationItem>) -> TranslationBatch<B> {
        let source = self.padded(items.iter().map(|i| i.source_ids.as_slice()).collect());
        let target = self.padded(items.iter().map(|i| i.target_ids.as_slice()).collect());

        TranslationBatch { source, target }
    }
}
