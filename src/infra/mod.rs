// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   tokenizer_store.rs — Tokenizer persistence
//                        Builds a word-level tokenizer from the
//                        corpus if none exists, or loads a
//                        previously saved one, so repeated runs
//                        share one vocabulary.
//
//   metrics.rs         — Training metrics logging
//                        Implements the MetricsSink trait by
//                        appending (step, tag, value) rows to a
//                        CSV file.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
