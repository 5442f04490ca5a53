// ============================================================
// Layer 5 — Trainer
// ============================================================
// Owns everything a training run mutates: the model, the
// optimiser, both data loaders and the step counter.
//
//   fit()       — epochs × batches of teacher-forced updates,
//                 evaluating every `eval_rate` batches
//   evaluate()  — mean loss over the evaluation set, using the
//                 prediction loop instead of teacher forcing
//   predict()   — prediction loop from an all-zero buffer
//
// Backend split:
//   - Training runs on B (an AutodiffBackend) so loss.backward()
//     has a graph to walk
//   - model.valid() returns the model on B::InnerBackend:
//     no gradient tracking, dropout disabled
//   - The evaluation batcher therefore also uses B::InnerBackend
//
// Teacher forcing: the decoder input is the target shifted one
// position to the right behind [BOS]:
//
//   target        : w1  w2  w3  [EOS]
//   decoder input : [BOS] w1  w2  w3
//
// so position i predicts token i having seen only tokens < i.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::{bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslationBatch, TranslationBatcher},
    dataset::TranslationDataset,
};
use crate::domain::{special_tokens::BOS_ID, traits::MetricsSink};
use crate::ml::{
    error::ModelError,
    transformer::{one_hot, Transformer},
};

/// Adam with the run's default hyperparameters.
pub fn adam<B: AutodiffBackend>() -> impl Optimizer<Transformer<B>, B> {
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    AdamConfig::new().with_epsilon(1e-8).init()
}

pub struct Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Transformer<B>, B>,
{
    config:       TrainConfig,
    model:        Transformer<B>,
    optimizer:    O,
    loss_fn:      CrossEntropyLoss<B>,
    eval_loss_fn: CrossEntropyLoss<B::InnerBackend>,
    train_loader: Arc<dyn DataLoader<TranslationBatch<B>>>,
    eval_loader:  Arc<dyn DataLoader<TranslationBatch<B::InnerBackend>>>,
    metrics:      Option<Box<dyn MetricsSink>>,
    device:       B::Device,
    steps:        usize,
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Transformer<B>, B>,
{
    pub fn new(
        config:        TrainConfig,
        model:         Transformer<B>,
        optimizer:     O,
        train_dataset: TranslationDataset,
        eval_dataset:  TranslationDataset,
        metrics:       Option<Box<dyn MetricsSink>>,
        device:        B::Device,
    ) -> Self {
        // ── Training data loader (AutodiffBackend) ────────────────────────────
        let mut train_builder = DataLoaderBuilder::new(TranslationBatcher::<B>::new(device.clone()))
            .batch_size(config.batch_size);
        if config.train_shuffle {
            train_builder = train_builder.shuffle(config.seed);
        }
        if config.num_workers > 0 {
            train_builder = train_builder.num_workers(config.num_workers);
        }
        let train_loader = train_builder.build(train_dataset);

        // ── Evaluation data loader (InnerBackend, never shuffled) ─────────────
        let mut eval_builder =
            DataLoaderBuilder::new(TranslationBatcher::<B::InnerBackend>::new(device.clone()))
                .batch_size(config.batch_size);
        if config.num_workers > 0 {
            eval_builder = eval_builder.num_workers(config.num_workers);
        }
        let eval_loader = eval_builder.build(eval_dataset);

        Self {
            loss_fn:      CrossEntropyLossConfig::new().init(&device),
            eval_loss_fn: CrossEntropyLossConfig::new().init(&device),
            config,
            model,
            optimizer,
            train_loader,
            eval_loader,
            metrics,
            device,
            steps: 0,
        }
    }

    /// Train for `config.epochs` epochs. Stops with an error as soon
    /// as a batch produces a non-finite loss.
    pub fn fit(&mut self) -> Result<()> {
        let eval_rate = self.config.eval_rate.max(1);

        for epoch in 1..=self.config.epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            let loader = Arc::clone(&self.train_loader);
            for (batch_idx, batch) in loader.iter().enumerate() {
                loss_sum += self.train_step(batch)?;
                batches  += 1;

                if (batch_idx + 1) % eval_rate == 0 {
                    self.evaluate()?;
                }
            }

            let avg_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | steps={}",
                epoch,
                self.config.epochs,
                avg_loss,
                self.steps,
            );
            self.log_metric("train/loss", avg_loss)?;
        }

        tracing::info!("Training complete after {} steps", self.steps);
        Ok(())
    }

    /// Mean per-batch loss of the prediction loop against the
    /// evaluation targets. NaN when the evaluation set is empty.
    pub fn evaluate(&self) -> Result<f64> {
        let model = self.model.valid();

        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in self.eval_loader.iter() {
            let vocab_size = model.vocab_size();
            let source     = one_hot(batch.source, vocab_size)?;

            let [batch_size, target_len] = batch.target.dims();
            let buffer = Tensor::zeros([batch_size, target_len, vocab_size], &self.device);
            let logits = predict_loop(&model, source, buffer)?;

            let loss = self.eval_loss_fn.forward(
                logits.reshape([batch_size * target_len, vocab_size]),
                batch.target.reshape([batch_size * target_len]),
            );
            loss_sum += loss.into_scalar().elem::<f64>();
            batches  += 1;
        }

        let avg_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        tracing::info!("Evaluation | eval_loss={:.4} | batches={}", avg_loss, batches);
        self.log_metric("eval/loss", avg_loss)?;
        Ok(avg_loss)
    }

    /// inputs: one-hot source [batch, seq, vocab] → logits of the
    /// same shape, produced from an all-zero decoder buffer.
    pub fn predict(&self, inputs: Tensor<B::InnerBackend, 3>) -> Result<Tensor<B::InnerBackend, 3>> {
        let buffer = Tensor::zeros(inputs.dims(), &self.device);
        self.predict_loop(inputs, buffer)
    }

    /// Prediction loop on the current weights in inference mode.
    pub fn predict_loop(
        &self,
        source: Tensor<B::InnerBackend, 3>,
        buffer: Tensor<B::InnerBackend, 3>,
    ) -> Result<Tensor<B::InnerBackend, 3>> {
        Ok(predict_loop(&self.model.valid(), source, buffer)?)
    }

    pub fn step_count(&self) -> usize {
        self.steps
    }

    pub fn model(&self) -> &Transformer<B> {
        &self.model
    }

    pub fn into_model(self) -> Transformer<B> {
        self.model
    }

    fn train_step(&mut self, batch: TranslationBatch<B>) -> Result<f64> {
        let vocab_size = self.model.vocab_size();
        let [batch_size, target_len] = batch.target.dims();

        let decoder_input = shift_right(batch.target.clone(), BOS_ID);
        let logits = self.model.forward(
            one_hot(batch.source, vocab_size)?,
            one_hot(decoder_input, vocab_size)?,
        )?;

        let loss = self.loss_fn.forward(
            logits.reshape([batch_size * target_len, vocab_size]),
            batch.target.reshape([batch_size * target_len]),
        );

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            bail!("Non-finite training loss {loss_val} at step {}", self.steps + 1);
        }

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optimizer.step(self.config.lr, self.model.clone(), grads);
        self.steps += 1;

        tracing::debug!("step {} loss={:.4}", self.steps, loss_val);
        Ok(loss_val)
    }

    fn log_metric(&self, tag: &str, value: f64) -> Result<()> {
        match &self.metrics {
            Some(sink) => sink.log_scalar(tag, value, self.steps),
            None       => Ok(()),
        }
    }
}

/// Runs the full model once per buffer position, each time
/// feeding the previous logits back in as the decoder input.
///
/// Nothing is cached between iterations and the buffer is
/// overwritten wholesale with raw logits, not argmax tokens;
/// the result is the logits of the final pass.
pub fn predict_loop<B: Backend>(
    model:  &Transformer<B>,
    source: Tensor<B, 3>,
    buffer: Tensor<B, 3>,
) -> Result<Tensor<B, 3>, ModelError> {
    let positions  = buffer.dims()[1];
    let mut buffer = buffer;
    for _ in 0..positions {
        buffer = model.forward(source.clone(), buffer)?;
    }
    Ok(buffer)
}

/// [batch, seq] → [batch, seq] with `start` in column 0 and the
/// last column dropped.
pub fn shift_right<B: Backend>(ids: Tensor<B, 2, Int>, start: u32) -> Tensor<B, 2, Int> {
    let [batch, seq] = ids.dims();
    let device = ids.device();
    let head   = Tensor::<B, 2, Int>::full([batch, 1], start as i64, &device);

    if seq <= 1 {
        return head.slice([0..batch, 0..seq]);
    }
    Tensor::cat(vec![head, ids.slice([0..batch, 0..seq - 1])], 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TranslationItem;
    use crate::domain::special_tokens::EOS_ID;
    use crate::ml::transformer::TransformerConfig;
    use burn::backend::{Autodiff, NdArray};
    use std::sync::Mutex;

    type TestBackend = Autodiff<NdArray>;

    const VOCAB: usize = 10;

    fn config() -> TrainConfig {
        TrainConfig {
            nheads:        2,
            model_dim:     8,
            hidden_dim:    16,
            depth:         1,
            dropout:       0.0,
            epochs:        1,
            lr:            1e-2,
            batch_size:    2,
            eval_rate:     100,
            train_shuffle: false,
            num_workers:   0,
            ..TrainConfig::default()
        }
    }

    fn model(device: &<TestBackend as Backend>::Device) -> Transformer<TestBackend> {
        TransformerConfig::new(VOCAB, 8, 16, 2, 8, 1).init(device).unwrap()
    }

    fn corpus(copies: usize) -> TranslationDataset {
        let items = (0..copies)
            .flat_map(|_| {
                [
                    TranslationItem { source_ids: vec![4, 5, 6], target_ids: vec![7, 8, EOS_ID] },
                    TranslationItem { source_ids: vec![6, 5],    target_ids: vec![9, EOS_ID] },
                ]
            })
            .collect();
        TranslationDataset::new(items)
    }

    /// Collects (tag, step, value) rows in memory.
    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<(String, usize, f64)>>>);

    impl Recorder {
        fn tagged(&self, tag: &str) -> Vec<(usize, f64)> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(t, _, _)| t == tag)
                .map(|(_, step, value)| (*step, *value))
                .collect()
        }
    }

    impl MetricsSink for Recorder {
        fn log_scalar(&self, tag: &str, value: f64, step: usize) -> Result<()> {
            self.0.lock().unwrap().push((tag.to_string(), step, value));
            Ok(())
        }
    }

    #[test]
    fn test_shift_right() {
        let device = Default::default();
        let ids    = Tensor::<NdArray, 2, Int>::from_ints([[7, 8, 3], [9, 3, 0]], &device);

        let shifted: Vec<i64> = shift_right(ids, BOS_ID).into_data().iter::<i64>().collect();
        assert_eq!(shifted, vec![2, 7, 8, 2, 9, 3]);
    }

    #[test]
    fn test_shift_right_single_column() {
        let device = Default::default();
        let ids    = Tensor::<NdArray, 2, Int>::from_ints([[3], [3]], &device);

        let shifted: Vec<i64> = shift_right(ids, BOS_ID).into_data().iter::<i64>().collect();
        assert_eq!(shifted, vec![2, 2]);
    }

    #[test]
    fn test_loss_decreases_on_repeated_corpus() {
        let device   = Default::default();
        let recorder = Recorder::default();
        TestBackend::seed(7);

        let mut cfg = config();
        cfg.epochs  = 5;

        let mut trainer = Trainer::new(
            cfg,
            model(&device),
            adam::<TestBackend>(),
            corpus(4),
            corpus(1),
            Some(Box::new(recorder.clone())),
            device,
        );
        trainer.fit().unwrap();

        // 4 batches of 2 per epoch
        assert_eq!(trainer.step_count(), 20);

        let losses = recorder.tagged("train/loss");
        assert_eq!(losses.len(), 5);
        let (first, last) = (losses[0].1, losses[4].1);
        assert!(first.is_finite());
        assert!(last < first, "train loss went from {first} to {last}");
    }

    #[test]
    fn test_eval_rate_triggers_evaluation() {
        let device   = Default::default();
        let recorder = Recorder::default();

        let mut cfg = config();
        cfg.eval_rate = 2;
        cfg.epochs    = 2;

        let mut trainer = Trainer::new(
            cfg,
            model(&device),
            adam::<TestBackend>(),
            corpus(2),
            corpus(1),
            Some(Box::new(recorder.clone())),
            device,
        );
        trainer.fit().unwrap();

        let order: Vec<(String, usize)> = recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|(tag, step, _)| (tag.clone(), *step))
            .collect();
        let expected: Vec<(String, usize)> = vec![
            ("eval/loss".into(), 2),
            ("train/loss".into(), 2),
            ("eval/loss".into(), 4),
            ("train/loss".into(), 4),
        ];
        assert_eq!(order, expected);
        assert!(recorder.tagged("eval/loss").iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_evaluate_empty_set_is_nan() {
        let device  = Default::default();
        let trainer = Trainer::new(
            config(),
            model(&device),
            adam::<TestBackend>(),
            corpus(1),
            TranslationDataset::new(Vec::new()),
            None,
            device,
        );
        assert!(trainer.evaluate().unwrap().is_nan());
    }

    #[test]
    fn test_predict_shape() {
        let device  = Default::default();
        let trainer = Trainer::new(
            config(),
            model(&device),
            adam::<TestBackend>(),
            corpus(1),
            corpus(1),
            None,
            device,
        );

        let ids    = Tensor::<NdArray, 2, Int>::from_ints([[4, 5, 6, 7, 8]], &device);
        let inputs = one_hot(ids, VOCAB).unwrap();
        let logits = trainer.predict(inputs).unwrap();

        assert_eq!(logits.dims(), [1, 5, VOCAB]);
        assert_eq!(trainer.step_count(), 0);
    }

    #[test]
    fn test_predict_loop_runs_once_per_position() {
        let device = Default::default();
        let model  = model(&device).valid();

        let source = one_hot(Tensor::<NdArray, 2, Int>::from_ints([[4, 5]], &device), VOCAB).unwrap();
        let buffer = Tensor::<NdArray, 3>::zeros([1, 1, VOCAB], &device);

        // One position: one full forward pass on the zero buffer
        let looped = predict_loop(&model, source.clone(), buffer.clone()).unwrap();
        let direct = model.forward(source, buffer).unwrap();

        let a: Vec<f32> = looped.into_data().iter::<f32>().collect();
        let b: Vec<f32> = direct.into_data().iter::<f32>().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_loop_feeds_logits_back() {
        let device = Default::default();
        let model  = model(&device).valid();

        let source = one_hot(Tensor::<NdArray, 2, Int>::from_ints([[4, 5, 6]], &device), VOCAB).unwrap();
        let zeros  = Tensor::<NdArray, 3>::zeros([1, 3, VOCAB], &device);

        let looped = predict_loop(&model, source.clone(), zeros.clone()).unwrap();

        let once   = model.forward(source.clone(), zeros).unwrap();
        let twice  = model.forward(source.clone(), once.clone()).unwrap();
        let thrice = model.forward(source, twice.clone()).unwrap();

        let a: Vec<f32> = looped.into_data().iter::<f32>().collect();
        let b: Vec<f32> = thrice.into_data().iter::<f32>().collect();
        assert_eq!(a, b);

        // A single or double pass gives different logits
        let c: Vec<f32> = twice.into_data().iter::<f32>().collect();
        let d: Vec<f32> = once.into_data().iter::<f32>().collect();
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_into_model_returns_trained_weights() {
        let device  = Default::default();
        let initial = model(&device);
        let before: Vec<f32> = initial.embedding().weight().into_data().iter::<f32>().collect();

        let mut trainer = Trainer::new(
            config(),
            initial,
            adam::<TestBackend>(),
            corpus(2),
            corpus(1),
            None,
            device,
        );
        trainer.fit().unwrap();
        let steps = trainer.step_count();

        let trained = trainer.into_model();
        let after: Vec<f32> = trained.embedding().weight().into_data().iter::<f32>().collect();
        assert!(steps > 0);
        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
    }
}
