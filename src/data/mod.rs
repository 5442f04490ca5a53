// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from two aligned text files
// all the way to padded token-id batches.
//
// The pipeline flows in this order:
//
//   source.txt + target.txt
//       │
//       ▼
//   ParallelCorpusLoader → pairs line N with line N
//       │
//       ▼
//   Preprocessor         → cleans each line (whitespace, encoding)
//       │
//       ▼
//   Tokenizer            → converts words to token ID numbers
//       │
//       ▼
//   TranslationDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   TranslationBatcher   → pads and stacks items into batches
//       │
//       ▼
//   DataLoader           → feeds batches to the Trainer
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads aligned source/target text files
pub mod loader;

/// Cleans and normalises raw lines
pub mod preprocessor;

/// Implements Burn's Dataset trait for tokenised pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create padded batches
pub mod batcher;

/// Seeded shuffle and train/evaluation split
pub mod splitter;
