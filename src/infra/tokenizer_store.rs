// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level tokenizer shared by
// both sides of the corpus.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. Instead of going through the trainer,
// the vocabulary is counted here and written straight into a
// HuggingFace tokenizer JSON, which Tokenizer::from_file loads.
// Counting runs the same normalizer and pre-tokenizer objects
// that are serialized into that JSON, so every counted word is
// found again by `Tokenizer::encode`.
//
// Vocabulary layout (ids are contiguous):
//
//   0 [PAD]  1 [UNK]  2 [BOS]  3 [EOS]  4.. words by frequency
//
// so `get_vocab_size(false)` is an upper bound for every id and
// can be used directly as the model's vocab_size.

use anyhow::{anyhow, Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
};
use tokenizers::{
    normalizers::bert::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer, Tokenizer,
};

use crate::domain::special_tokens::{SPECIAL_TOKENS, UNK_TOKEN};

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if self.dir.join(TOKENIZER_FILE).exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.dir.display());
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // clean_text, no CJK splitting, keep accents, lowercase
        let normalizer    = BertNormalizer::new(true, false, Some(false), true);
        let pre_tokenizer = Whitespace::default();

        // ── Step 1: Count words ───────────────────────────────────────────────
        let freq = count_words(texts, &normalizer, &pre_tokenizer)?;

        // Most frequent first; ties broken alphabetically so the
        // same corpus always yields the same ids
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Vocab JSON ────────────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (token, id) in SPECIAL_TOKENS {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        let mut next_id = SPECIAL_TOKENS.len();
        for (word, _) in words {
            vocab.insert(word, serde_json::json!(next_id));
            next_id += 1;
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .map(|(token, id)| {
                serde_json::json!({
                    "id": id, "content": token, "single_word": false, "lstrip": false,
                    "rstrip": false, "normalized": false, "special": true
                })
            })
            .collect();

        // ── Step 3: Tokenizer JSON in HuggingFace format ──────────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": serde_json::to_value(&normalizer)?,
            "pre_tokenizer": serde_json::to_value(&pre_tokenizer)?,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            tok_path.display()
        );

        self.load()
    }
}

/// Word frequencies over `texts`, split exactly as `Tokenizer::encode`
/// splits them.
fn count_words(
    texts: &[String],
    normalizer: &BertNormalizer,
    pre_tokenizer: &Whitespace,
) -> Result<HashMap<String, usize>> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        let mut normalized = NormalizedString::from(text.as_str());
        normalizer
            .normalize(&mut normalized)
            .map_err(|e| anyhow!("Cannot normalize '{}': {}", text, e))?;

        let mut pre = PreTokenizedString::from(normalized);
        pre_tokenizer
            .pre_tokenize(&mut pre)
            .map_err(|e| anyhow!("Cannot pre-tokenize '{}': {}", text, e))?;

        for (word, _, _) in pre.get_splits(OffsetReferential::Original, OffsetType::Byte) {
            *freq.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    Ok(freq)
}
