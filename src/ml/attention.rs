// ============================================================
// Layer 5 — Multi-Head Attention
// ============================================================
// Scaled dot-product attention split across `nheads` heads,
// each of width d_key = model_dim / nheads.
//
//   scores  = Q Kᵀ / sqrt(d_key)          [batch, heads, q, k]
//   scores  = -inf where j > i            (only when masked)
//   weights = softmax(scores, key axis)   rows sum to 1
//   output  = weights V                   [batch, q, heads, d_key]
//
// The mask is fixed at construction: decoder self-attention is
// built with `masked = true`, everything else with `false`.
// Inputs whose last dimension is not model_dim are rejected
// before any projection runs.
//
// Reference: Vaswani et al. (2017) §3.2

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::error::ModelError;

#[derive(Config, Debug)]
pub struct MultiHeadAttentionConfig {
    pub model_dim: usize,
    pub nheads:    usize,
    #[config(default = false)]
    pub masked:    bool,
}

impl MultiHeadAttentionConfig {
    pub fn validate(&self) -> Result<usize, ModelError> {
        if self.model_dim == 0 {
            return Err(ModelError::ZeroDimension("model_dim"));
        }
        if self.nheads == 0 {
            return Err(ModelError::ZeroDimension("nheads"));
        }
        if self.model_dim % self.nheads != 0 {
            return Err(ModelError::HeadsDoNotDivide {
                model_dim: self.model_dim,
                nheads:    self.nheads,
            });
        }
        Ok(self.model_dim / self.nheads)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<MultiHeadAttention<B>, ModelError> {
        let d_key = self.validate()?;
        let projection = || LinearConfig::new(self.model_dim, self.model_dim).init(device);

        Ok(MultiHeadAttention {
            query:  projection(),
            key:    projection(),
            value:  projection(),
            output: projection(),
            model_dim: self.model_dim,
            nheads: self.nheads,
            d_key,
            masked: self.masked,
        })
    }
}

#[derive(Module, Debug)]
pub struct MultiHeadAttention<B: Backend> {
    query:  Linear<B>,
    key:    Linear<B>,
    value:  Linear<B>,
    output: Linear<B>,
    model_dim: usize,
    nheads: usize,
    d_key:  usize,
    masked: bool,
}

impl<B: Backend> MultiHeadAttention<B> {
    /// q: [batch, seq_q, heads, d_key], k/v: [batch, seq_k, heads, d_key]
    ///
    /// Returns (output [batch, seq_q, heads, d_key],
    ///          weights [batch, heads, seq_q, seq_k]).
    pub fn attention(
        &self,
        q: Tensor<B, 4>,
        k: Tensor<B, 4>,
        v: Tensor<B, 4>,
    ) -> (Tensor<B, 4>, Tensor<B, 4>) {
        // Heads move next to batch so matmul runs per head
        let q = q.swap_dims(1, 2);
        let k = k.swap_dims(1, 2);
        let v = v.swap_dims(1, 2);

        let scale  = (self.d_key as f64).sqrt();
        let scores = q.matmul(k.transpose()).div_scalar(scale);

        let scores = if self.masked {
            let mask = causal_mask::<B>(scores.dims(), &scores.device());
            scores.mask_fill(mask, f32::NEG_INFINITY)
        } else {
            scores
        };

        let weights = softmax(scores, 3);
        let output  = weights.clone().matmul(v).swap_dims(1, 2);

        (output, weights)
    }

    /// query: [batch, seq_q, model_dim], key/value: [batch, seq_k, model_dim]
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key:   Tensor<B, 3>,
        value: Tensor<B, 3>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        Ok(self.forward_with_weights(query, key, value)?.0)
    }

    /// Same as `forward`, also returning the attention weights.
    pub fn forward_with_weights(
        &self,
        query: Tensor<B, 3>,
        key:   Tensor<B, 3>,
        value: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 4>), ModelError> {
        for input in [&query, &key, &value] {
            let [_, _, found] = input.dims();
            if found != self.model_dim {
                return Err(ModelError::DimensionMismatch { expected: self.model_dim, found });
            }
        }

        let q = self.split_heads(self.query.forward(query));
        let k = self.split_heads(self.key.forward(key));
        let v = self.split_heads(self.value.forward(value));

        let (context, weights) = self.attention(q, k, v);

        let [batch, seq_q, _, _] = context.dims();
        let merged = context.reshape([batch, seq_q, self.nheads * self.d_key]);

        Ok((self.output.forward(merged), weights))
    }

    /// [batch, seq, model_dim] → [batch, seq, heads, d_key]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, seq, _] = x.dims();
        x.reshape([batch, seq, self.nheads, self.d_key])
    }
}

/// `true` where key position j lies after query position i,
/// broadcast over batch and heads.
fn causal_mask<B: Backend>(dims: [usize; 4], device: &B::Device) -> Tensor<B, 4, Bool> {
    let [batch, heads, seq_q, seq_k] = dims;
    Tensor::<B, 2, Bool>::tril_mask([seq_q, seq_k], 0, device)
        .unsqueeze::<4>()
        .expand([batch, heads, seq_q, seq_k])
}
