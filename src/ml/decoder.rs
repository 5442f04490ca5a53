// ============================================================
// Layer 5 — Decoder Layer
// ============================================================
// Post-norm decoder block with three sublayers:
//
//   y   = LayerNorm(x + MaskedSelfAttention(x, x, x))
//   z   = LayerNorm(y + CrossAttention(y, memory, memory))
//   out = LayerNorm(z + FFN(z))
//
// The self-attention is always causal; cross-attention sees the
// whole encoder output.

use burn::{
    nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig},
    prelude::*,
};

use crate::ml::{
    attention::{MultiHeadAttention, MultiHeadAttentionConfig},
    encoder::{FeedForward, FeedForwardConfig},
    error::ModelError,
};

#[derive(Config, Debug)]
pub struct DecoderLayerConfig {
    pub model_dim:  usize,
    pub hidden_dim: usize,
    pub nheads:     usize,
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl DecoderLayerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<DecoderLayer<B>, ModelError> {
        if self.hidden_dim == 0 {
            return Err(ModelError::ZeroDimension("hidden_dim"));
        }
        let self_attn = MultiHeadAttentionConfig::new(self.model_dim, self.nheads)
            .with_masked(true)
            .init(device)?;
        let cross_attn = MultiHeadAttentionConfig::new(self.model_dim, self.nheads).init(device)?;

        Ok(DecoderLayer {
            self_attn,
            cross_attn,
            feed_forward: FeedForwardConfig::new(self.model_dim, self.hidden_dim).init(device),
            norm1:        LayerNormConfig::new(self.model_dim).init(device),
            norm2:        LayerNormConfig::new(self.model_dim).init(device),
            norm3:        LayerNormConfig::new(self.model_dim).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct DecoderLayer<B: Backend> {
    self_attn:    MultiHeadAttention<B>,
    cross_attn:   MultiHeadAttention<B>,
    feed_forward: FeedForward<B>,
    norm1:        LayerNorm<B>,
    norm2:        LayerNorm<B>,
    norm3:        LayerNorm<B>,
    dropout:      Dropout,
}

impl<B: Backend> DecoderLayer<B> {
    /// x: [batch, seq_tgt, model_dim], memory: [batch, seq_src, model_dim]
    ///
    /// Returns the block output and the cross-attention weights
    /// [batch, heads, seq_tgt, seq_src].
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        memory: Tensor<B, 3>,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 4>), ModelError> {
        let attn = self.self_attn.forward(x.clone(), x.clone(), x.clone())?;
        let x    = self.norm1.forward(x + self.dropout.forward(attn));

        let (cross, weights) = self
            .cross_attn
            .forward_with_weights(x.clone(), memory.clone(), memory)?;
        let x = self.norm2.forward(x + self.dropout.forward(cross));

        let ffn = self.feed_forward.forward(x.clone());
        Ok((self.norm3.forward(x + self.dropout.forward(ffn)), weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        tensor::Distribution,
    };

    type TestBackend         = NdArray;
    type TestAutodiffBackend = Autodiff<NdArray>;

    #[test]
    fn test_decoder_shape() {
        let device  = Default::default();
        let decoder = DecoderLayerConfig::new(8, 16, 2).init::<TestBackend>(&device).unwrap();

        let a = Tensor::<TestBackend, 3>::ones([24, 16, 8], &device);
        let b = Tensor::<TestBackend, 3>::ones([24, 8, 8], &device);

        let (dec, weights) = decoder.forward(a, b).unwrap();

        assert_eq!(dec.dims(), [24, 16, 8]);
        assert_eq!(weights.dims(), [24, 2, 16, 8]);
    }

    #[test]
    fn test_self_attention_is_causal() {
        let device  = Default::default();
        let decoder = DecoderLayerConfig::new(8, 16, 2).init::<TestAutodiffBackend>(&device).unwrap();

        let x      = Tensor::<TestAutodiffBackend, 3>::random([2, 6, 8], Distribution::Default, &device).require_grad();
        let memory = Tensor::<TestAutodiffBackend, 3>::random([2, 4, 8], Distribution::Default, &device);

        // Random weights: the plain sum of a LayerNorm output is constant
        let weights = Tensor::<TestAutodiffBackend, 3>::random([2, 1, 8], Distribution::Default, &device);

        let (out, _) = decoder.forward(x.clone(), memory).unwrap();
        let grads    = (out.slice([0..2, 2..3, 0..8]) * weights).sum().backward();
        let grad     = x.grad(&grads).unwrap();

        let future = grad.clone().slice([0..2, 3..6, 0..8]).abs().sum().into_scalar();
        let own    = grad.slice([0..2, 2..3, 0..8]).abs().sum().into_scalar();
        assert_eq!(future, 0.0);
        assert!(own > 0.0);
    }

    #[test]
    fn test_memory_width_is_checked() {
        let device  = Default::default();
        let decoder = DecoderLayerConfig::new(8, 16, 2).init::<TestBackend>(&device).unwrap();

        let x      = Tensor::<TestBackend, 3>::ones([1, 3, 8], &device);
        let memory = Tensor::<TestBackend, 3>::ones([1, 5, 4], &device);

        let err = decoder.forward(x, memory).unwrap_err();
        assert_eq!(err, ModelError::DimensionMismatch { expected: 8, found: 4 });
    }

    #[test]
    fn test_cross_attention_sees_all_memory() {
        let device  = Default::default();
        let decoder = DecoderLayerConfig::new(8, 16, 2).init::<TestAutodiffBackend>(&device).unwrap();

        let x      = Tensor::<TestAutodiffBackend, 3>::random([1, 3, 8], Distribution::Default, &device);
        let memory = Tensor::<TestAutodiffBackend, 3>::random([1, 5, 8], Distribution::Default, &device).require_grad();

        let weights = Tensor::<TestAutodiffBackend, 3>::random([1, 1, 8], Distribution::Default, &device);

        let (out, _) = decoder.forward(x, memory.clone()).unwrap();
        let grads    = (out.slice([0..1, 0..1, 0..8]) * weights).sum().backward();
        let last     = memory.grad(&grads).unwrap().slice([0..1, 4..5, 0..8]).abs().sum().into_scalar();
        assert!(last > 0.0);
    }
}
