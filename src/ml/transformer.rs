// ============================================================
// Layer 5 — Encoder-Decoder Transformer
// ============================================================
// Composition of the building blocks in this layer:
//
//   src ─► Embedding.encode ─► +PE ─► EncoderLayer × depth ─► memory
//                                                               │
//   tgt ─► Embedding.encode ─► +PE ─► DecoderLayer × depth ◄────┘
//                                          │
//                                          ▼
//                               Embedding.decode ─► logits
//
// `src` and `tgt` are token distributions over the vocabulary
// (one-hot rows for real data). `forward_tokens` takes integer
// ids and does the one-hot step itself.
//
// During training `tgt` is the gold sequence shifted right
// (teacher forcing); the causal mask in every decoder block
// keeps position i from reading positions > i.
//
// Reference: Vaswani et al. (2017) §3.1

use burn::{
    nn::{Dropout, DropoutConfig},
    prelude::*,
};

use crate::ml::{
    decoder::{DecoderLayer, DecoderLayerConfig},
    embedding::{Embedding, EmbeddingConfig},
    encoder::{EncoderLayer, EncoderLayerConfig},
    error::ModelError,
    positional::{PositionalEncoder, PositionalEncoderConfig},
};

#[derive(Config, Debug)]
pub struct TransformerConfig {
    pub vocab_size: usize,
    pub model_dim:  usize,
    pub hidden_dim: usize,
    pub nheads:     usize,
    pub max_len:    usize,
    pub depth:      usize,
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl TransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Transformer<B>, ModelError> {
        if self.depth == 0 {
            return Err(ModelError::ZeroDimension("depth"));
        }

        let embedding  = EmbeddingConfig::new(self.vocab_size, self.model_dim).init(device)?;
        let positional = PositionalEncoderConfig::new(self.model_dim, self.max_len).init(device)?;

        let encoder = (0..self.depth)
            .map(|_| {
                EncoderLayerConfig::new(self.model_dim, self.hidden_dim, self.nheads)
                    .with_dropout(self.dropout)
                    .init(device)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let decoder = (0..self.depth)
            .map(|_| {
                DecoderLayerConfig::new(self.model_dim, self.hidden_dim, self.nheads)
                    .with_dropout(self.dropout)
                    .init(device)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Transformer {
            embedding,
            positional,
            encoder,
            decoder,
            dropout:    DropoutConfig::new(self.dropout).init(),
        })
    }
}

/// Decoder stack output plus the cross-attention weights of every
/// block, [batch, heads, seq_tgt, seq_src] each.
pub struct DecoderOutput<B: Backend> {
    pub hidden:          Tensor<B, 3>,
    pub cross_attention: Vec<Tensor<B, 4>>,
}

#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    embedding:  Embedding<B>,
    positional: PositionalEncoder<B>,
    encoder:    Vec<EncoderLayer<B>>,
    decoder:    Vec<DecoderLayer<B>>,
    dropout:    Dropout,
}

impl<B: Backend> Transformer<B> {
    /// src: [batch, seq_src, vocab], tgt: [batch, seq_tgt, vocab]
    /// → logits [batch, seq_tgt, vocab]
    pub fn forward(&self, src: Tensor<B, 3>, tgt: Tensor<B, 3>) -> Result<Tensor<B, 3>, ModelError> {
        let source_batch = src.dims()[0];
        let target_batch = tgt.dims()[0];
        if source_batch != target_batch {
            return Err(ModelError::BatchMismatch { source_batch, target_batch });
        }

        let memory = self.encode(src)?;
        let output = self.decode(tgt, memory)?;
        Ok(self.embedding.decode(output.hidden))
    }

    /// Integer-id entry point: src [batch, seq_src], tgt [batch, seq_tgt].
    pub fn forward_tokens(
        &self,
        src: Tensor<B, 2, Int>,
        tgt: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let src = one_hot(src, self.vocab_size())?;
        let tgt = one_hot(tgt, self.vocab_size())?;
        self.forward(src, tgt)
    }

    /// Runs the encoder stack and returns `memory`.
    pub fn encode(&self, src: Tensor<B, 3>) -> Result<Tensor<B, 3>, ModelError> {
        let mut x = self.embed(src)?;
        for layer in &self.encoder {
            x = layer.forward(x)?;
        }
        Ok(x)
    }

    /// Runs the decoder stack against `memory`.
    pub fn decode(&self, tgt: Tensor<B, 3>, memory: Tensor<B, 3>) -> Result<DecoderOutput<B>, ModelError> {
        let mut x = self.embed(tgt)?;
        let mut cross_attention = Vec::with_capacity(self.decoder.len());
        for layer in &self.decoder {
            let (next, weights) = layer.forward(x, memory.clone())?;
            cross_attention.push(weights);
            x = next;
        }
        Ok(DecoderOutput { hidden: x, cross_attention })
    }

    pub fn vocab_size(&self) -> usize {
        self.embedding.vocab_size()
    }

    pub fn max_len(&self) -> usize {
        self.positional.max_len()
    }

    pub fn depth(&self) -> usize {
        self.encoder.len()
    }

    pub fn embedding(&self) -> &Embedding<B> {
        &self.embedding
    }

    fn embed(&self, x: Tensor<B, 3>) -> Result<Tensor<B, 3>, ModelError> {
        let last = x.dims()[2];
        if last != self.vocab_size() {
            return Err(ModelError::DimensionMismatch { expected: self.vocab_size(), found: last });
        }
        let x = self.positional.forward(self.embedding.forward(x)?)?;
        Ok(self.dropout.forward(x))
    }
}

/// [batch, seq] ids → [batch, seq, vocab_size] one-hot rows.
pub fn one_hot<B: Backend>(ids: Tensor<B, 2, Int>, vocab_size: usize) -> Result<Tensor<B, 3>, ModelError> {
    let [batch, seq] = ids.dims();
    let device       = ids.device();

    let mut values = vec![0.0f32; batch * seq * vocab_size];
    for (pos, token) in ids.into_data().iter::<i64>().enumerate() {
        if token < 0 || token as usize >= vocab_size {
            return Err(ModelError::TokenOutOfRange { token, vocab_size });
        }
        values[pos * vocab_size + token as usize] = 1.0;
    }

    Ok(Tensor::from_data(TensorData::new(values, [batch, seq, vocab_size]), &device))
}
