// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives here. The data layer
// only touches Burn through the Dataset and Batcher traits.
//
// What's in this layer:
//
//   error.rs       — ModelError, the typed failures of model
//                    construction and forward passes
//
//   positional.rs  — Fixed sinusoidal positional encoding
//
//   embedding.rs   — One weight matrix used both to embed token
//                    distributions and to project hidden states
//                    back to vocabulary logits
//
//   attention.rs   — Multi-head scaled dot-product attention
//                    with an optional causal mask
//
//   encoder.rs     — Post-norm encoder block and the shared
//                    position-wise feed-forward network
//
//   decoder.rs     — Post-norm decoder block: causal self
//                    attention, cross attention, feed-forward
//
//   transformer.rs — The full encoder-decoder stack
//
//   trainer.rs     — Training loop, evaluation and the
//                    prediction loop
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod error;
pub mod positional;
pub mod embedding;
pub mod attention;
pub mod encoder;
pub mod decoder;
pub mod transformer;
pub mod trainer;

// ─── Backends ─────────────────────────────────────────────────────────────────
// CPU (ndarray) by default; `--features wgpu` moves everything
// to the GPU. Training always wraps the compute backend in
// Autodiff; evaluation runs on the bare compute backend.

#[cfg(not(feature = "wgpu"))]
pub type ComputeBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type ComputeBackend = burn::backend::Wgpu;

pub type TrainingBackend = burn::backend::Autodiff<ComputeBackend>;
