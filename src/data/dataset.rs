// ============================================================
// Layer 4 — Translation Dataset
// ============================================================
// Holds tokenised sentence pairs and exposes them through
// Burn's Dataset trait so the DataLoader can index, shuffle
// and batch them.
//
// Every target sequence ends with [EOS]; the Trainer builds the
// decoder input by shifting the target right behind [BOS], so
// the model learns to emit [EOS] after the last word.
//
// Items are stored unpadded. Padding happens per batch in
// TranslationBatcher, so short batches stay short.

use anyhow::{anyhow, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::{sentence_pair::SentencePair, special_tokens::EOS_ID};

/// One tokenised translation example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub source_ids: Vec<u32>,
    /// Always terminated by EOS_ID
    pub target_ids: Vec<u32>,
}

pub struct TranslationDataset {
    items: Vec<TranslationItem>,
}

impl TranslationDataset {
    pub fn new(items: Vec<TranslationItem>) -> Self {
        Self { items }
    }

    /// Tokenise every pair. Pairs whose source encodes to nothing
    /// are skipped.
    pub fn from_pairs(pairs: &[SentencePair], tokenizer: &Tokenizer) -> Result<Self> {
        let mut items = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let source_ids = encode(tokenizer, &pair.source)?;
            if source_ids.is_empty() {
                tracing::debug!("Skipping pair with empty source: {:?}", pair.target);
                continue;
            }

            let mut target_ids = encode(tokenizer, &pair.target)?;
            target_ids.push(EOS_ID);

            items.push(TranslationItem { source_ids, target_ids });
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[TranslationItem] {
        &self.items
    }

    /// Longest source or target sequence, used to size the
    /// positional encoding table.
    pub fn max_len(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.source_ids.len().max(item.target_ids.len()))
            .max()
            .unwrap_or(0)
    }
}

impl Dataset<TranslationItem> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow!("Cannot tokenise {text:?}: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;
    use tempfile::TempDir;

    fn pairs() -> Vec<SentencePair> {
        vec![
            SentencePair::new("the house", "das haus"),
            SentencePair::new("the small house", "das kleine haus ist"),
        ]
    }

    fn tokenizer(dir: &TempDir) -> Tokenizer {
        let texts: Vec<String> = pairs()
            .iter()
            .flat_map(|p| [p.source.clone(), p.target.clone()])
            .collect();
        TokenizerStore::new(dir.path()).load_or_build(&texts, 64).unwrap()
    }

    #[test]
    fn test_targets_end_with_eos() {
        let dir     = TempDir::new().unwrap();
        let dataset = TranslationDataset::from_pairs(&pairs(), &tokenizer(&dir)).unwrap();

        assert_eq!(dataset.len(), 2);
        for item in dataset.items() {
            assert_eq!(item.target_ids.last(), Some(&EOS_ID));
            assert!(!item.source_ids.contains(&EOS_ID));
        }
        assert_eq!(dataset.get(0).unwrap().source_ids.len(), 2);
        assert_eq!(dataset.get(0).unwrap().target_ids.len(), 3);
    }

    #[test]
    fn test_max_len() {
        let dir     = TempDir::new().unwrap();
        let dataset = TranslationDataset::from_pairs(&pairs(), &tokenizer(&dir)).unwrap();

        // "das kleine haus ist" + EOS
        assert_eq!(dataset.max_len(), 5);
        assert_eq!(TranslationDataset::new(Vec::new()).max_len(), 0);
    }

    #[test]
    fn test_get_out_of_range() {
        let dataset = TranslationDataset::new(vec![TranslationItem {
            source_ids: vec![4],
            target_ids: vec![5, EOS_ID],
        }]);
        assert!(dataset.get(1).is_none());
    }
}
