// ============================================================
// Layer 5 — Weight-Tied Embedding
// ============================================================
// One (vocab_size × model_dim) matrix W plays two roles:
//
//   encode: token distribution  [.., vocab_size] @ W   → [.., model_dim]
//   decode: hidden state        [.., model_dim]  @ Wᵀ  → [.., vocab_size]
//
// Both projections read the same Param, so gradients from the
// input side and the output side accumulate into one tensor and
// a single optimiser step moves both roles together.
//
// Reference: Press & Wolf (2017) Using the Output Embedding
//            Vaswani et al. (2017) §3.4

use burn::{module::Param, nn::Initializer, prelude::*};

use crate::ml::error::ModelError;

#[derive(Config, Debug)]
pub struct EmbeddingConfig {
    pub vocab_size: usize,
    pub model_dim:  usize,
    /// Small init keeps logits near-uniform before training
    #[config(default = "Initializer::Normal{mean:0.0, std:0.02}")]
    pub initializer: Initializer,
}

impl EmbeddingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Embedding<B>, ModelError> {
        if self.vocab_size == 0 {
            return Err(ModelError::ZeroDimension("vocab_size"));
        }
        if self.model_dim == 0 {
            return Err(ModelError::ZeroDimension("model_dim"));
        }

        let weight = self.initializer.init([self.vocab_size, self.model_dim], device);
        Ok(Embedding {
            weight,
            vocab_size: self.vocab_size,
            model_dim:  self.model_dim,
        })
    }
}

#[derive(Module, Debug)]
pub struct Embedding<B: Backend> {
    weight:     Param<Tensor<B, 2>>,
    vocab_size: usize,
    model_dim:  usize,
}

impl<B: Backend> Embedding<B> {
    /// Input path: `x @ W`.
    pub fn encode<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        x.matmul(self.encoder_weight().unsqueeze())
    }

    /// Output path: `h @ Wᵀ`.
    pub fn decode<const D: usize>(&self, h: Tensor<B, D>) -> Tensor<B, D> {
        h.matmul(self.decoder_weight().transpose().unsqueeze())
    }

    /// Picks the projection from the size of the last dimension.
    /// When vocab_size == model_dim the input path is taken.
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Result<Tensor<B, D>, ModelError> {
        let last = x.dims()[D - 1];
        if last == self.vocab_size {
            Ok(self.encode(x))
        } else if last == self.model_dim {
            Ok(self.decode(x))
        } else {
            Err(ModelError::ProjectionMismatch {
                found:      last,
                vocab_size: self.vocab_size,
                model_dim:  self.model_dim,
            })
        }
    }

    /// The shared matrix, shape [vocab_size, model_dim].
    pub fn weight(&self) -> Tensor<B, 2> {
        self.weight.val()
    }

    /// Weight as seen by the input projection.
    pub fn encoder_weight(&self) -> Tensor<B, 2> {
        self.weight()
    }

    /// Weight as seen by the output projection (used transposed).
    pub fn decoder_weight(&self) -> Tensor<B, 2> {
        self.weight()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}
