// ============================================================
// Layer 5 — Encoder Layer
// ============================================================
// Post-norm encoder block:
//
//   y   = LayerNorm(x + SelfAttention(x, x, x))
//   out = LayerNorm(y + FFN(y))
//
// FFN is Linear(model_dim → hidden_dim) → ReLU → Linear(back).
// Dropout only fires on the autodiff (training) backend.

use burn::{
    nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::{
    attention::{MultiHeadAttention, MultiHeadAttentionConfig},
    error::ModelError,
};

#[derive(Config, Debug)]
pub struct EncoderLayerConfig {
    pub model_dim:  usize,
    pub hidden_dim: usize,
    pub nheads:     usize,
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl EncoderLayerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<EncoderLayer<B>, ModelError> {
        if self.hidden_dim == 0 {
            return Err(ModelError::ZeroDimension("hidden_dim"));
        }
        let self_attn = MultiHeadAttentionConfig::new(self.model_dim, self.nheads).init(device)?;

        Ok(EncoderLayer {
            self_attn,
            feed_forward: FeedForwardConfig::new(self.model_dim, self.hidden_dim).init(device),
            norm1:        LayerNormConfig::new(self.model_dim).init(device),
            norm2:        LayerNormConfig::new(self.model_dim).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    self_attn:    MultiHeadAttention<B>,
    feed_forward: FeedForward<B>,
    norm1:        LayerNorm<B>,
    norm2:        LayerNorm<B>,
    dropout:      Dropout,
}

impl<B: Backend> EncoderLayer<B> {
    /// x: [batch, seq, model_dim] → [batch, seq, model_dim]
    pub fn forward(&self, x: Tensor<B, 3>) -> Result<Tensor<B, 3>, ModelError> {
        let attn = self.self_attn.forward(x.clone(), x.clone(), x.clone())?;
        let x    = self.norm1.forward(x + self.dropout.forward(attn));

        let ffn = self.feed_forward.forward(x.clone());
        Ok(self.norm2.forward(x + self.dropout.forward(ffn)))
    }
}

// ─── Position-wise feed-forward ───────────────────────────────────────────────
// Shared by the encoder and decoder blocks.

#[derive(Config, Debug)]
pub struct FeedForwardConfig {
    pub model_dim:  usize,
    pub hidden_dim: usize,
}

impl FeedForwardConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeedForward<B> {
        FeedForward {
            expand:  LinearConfig::new(self.model_dim, self.hidden_dim).init(device),
            project: LinearConfig::new(self.hidden_dim, self.model_dim).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    expand:  Linear<B>,
    project: Linear<B>,
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.project.forward(relu(self.expand.forward(x)))
    }
}
