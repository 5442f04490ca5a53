// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: aligned sentence pairs, the reserved token ids
// shared by the tokenizer, dataset and trainer, and the two
// seams other layers plug into (corpus sources, metric sinks).
//
// Nothing in here depends on Burn or touches the filesystem.

// An aligned source/target sentence pair
pub mod sentence_pair;

// Reserved vocabulary ids
pub mod special_tokens;

// Core abstractions (traits) that other layers implement
pub mod traits;
