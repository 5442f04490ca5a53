// ============================================================
// Layer 5 — Sinusoidal Positional Encoder
// ============================================================
// Attention has no notion of token order, so a fixed signal is
// added to every embedding:
//
//   PE[pos, 2i]   = sin(pos / 10000^(2i/d))
//   PE[pos, 2i+1] = cos(pos / 10000^(2i/d))
//
// The table is computed once on the host and stored as a plain
// constant tensor inside the module. It is not a Param, so the
// optimiser never sees it.
//
// Reference: Vaswani et al. (2017) §3.5

use burn::prelude::*;

use crate::ml::error::ModelError;

#[derive(Config, Debug)]
pub struct PositionalEncoderConfig {
    pub model_dim: usize,
    pub max_len:   usize,
}

impl PositionalEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<PositionalEncoder<B>, ModelError> {
        if self.model_dim == 0 {
            return Err(ModelError::ZeroDimension("model_dim"));
        }
        if self.max_len == 0 {
            return Err(ModelError::ZeroDimension("max_len"));
        }

        let values = sinusoid_table(self.max_len, self.model_dim);
        let table  = Tensor::<B, 2>::from_data(
            TensorData::new(values, [self.max_len, self.model_dim]),
            device,
        );

        Ok(PositionalEncoder {
            table,
            model_dim: self.model_dim,
            max_len:   self.max_len,
        })
    }
}

/// Row-major (max_len × model_dim) table of interleaved sin/cos values.
fn sinusoid_table(max_len: usize, model_dim: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(max_len * model_dim);
    for pos in 0..max_len {
        for k in 0..model_dim {
            // k and k+1 share one angular frequency
            let pair     = (k / 2) as f64;
            let exponent = 2.0 * pair / model_dim as f64;
            let angle    = pos as f64 / 10000f64.powf(exponent);
            let value    = if k % 2 == 0 { angle.sin() } else { angle.cos() };
            values.push(value as f32);
        }
    }
    values
}

#[derive(Module, Debug)]
pub struct PositionalEncoder<B: Backend> {
    table:     Tensor<B, 2>,
    model_dim: usize,
    max_len:   usize,
}

impl<B: Backend> PositionalEncoder<B> {
    /// x: [batch, seq_len, model_dim] → same shape, with PE[0..seq_len] added
    pub fn forward(&self, x: Tensor<B, 3>) -> Result<Tensor<B, 3>, ModelError> {
        let [_, seq_len, dim] = x.dims();
        if dim != self.model_dim {
            return Err(ModelError::DimensionMismatch { expected: self.model_dim, found: dim });
        }
        if seq_len > self.max_len {
            return Err(ModelError::SequenceTooLong { len: seq_len, max_len: self.max_len });
        }

        let rows = self.table.clone().slice([0..seq_len, 0..dim]).unsqueeze::<3>();
        Ok(x + rows)
    }

    pub fn table(&self) -> Tensor<B, 2> {
        self.table.clone()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
