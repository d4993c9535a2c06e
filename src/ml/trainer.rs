// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backend split, same as everywhere else in this layer:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on MyInnerBackend (Wgpu)
//   - The validation batcher must also use MyInnerBackend
//
// Per epoch:
//   1. learning rate from the epoch-indexed schedule
//   2. one pass over the training loader, Adam updates
//   3. one pass over the validation loader: loss, accuracy, and a
//      full confusion matrix (logged so per-word regressions are
//      visible immediately)
//   4. metrics row appended to metrics.csv
//   5. checkpoint written, named by epoch and validation loss
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SpeechBatcher, dataset::SpeechDataset};
use crate::domain::vocabulary::Vocabulary;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{ConfusionMatrix, EpochMetrics, MetricsLogger};
use crate::ml::model::{Arch, KwsModel, KwsModelConfig};

type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
type MyInnerBackend = burn::backend::Wgpu;

/// Epoch-indexed learning-rate schedule: hold the base rate for the
/// first 20 epochs, then drop to a fifth, then to a tenth.
pub fn lr_schedule(epoch: usize, base_lr: f64) -> f64 {
    if epoch <= 20 {
        base_lr
    } else if epoch <= 30 {
        base_lr / 5.0
    } else {
        base_lr / 10.0
    }
}

pub fn run_training(
    cfg:           &TrainConfig,
    vocab:         Arc<Vocabulary>,
    train_dataset: SpeechDataset,
    val_dataset:   SpeechDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    // ── Build model ───────────────────────────────────────────────────────────
    let arch: Arch = cfg.model.parse()?;
    let mut model: KwsModel<MyBackend> =
        KwsModelConfig::new(arch, vocab.len(), cfg.dropout).init(&device);
    tracing::info!("Model ready: {} ({} classes)", arch, vocab.len());

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = SpeechBatcher::<MyBackend>::new(device.clone(), &cfg.features);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, fixed order) ────────────────────
    let val_batcher = SpeechBatcher::<MyInnerBackend>::new(device.clone(), &cfg.features);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics_logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
    let mut best_val_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let lr = lr_schedule(epoch, cfg.base_lr);

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.features, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → KwsModel<MyInnerBackend>, dropout disabled
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut confusion    = ConfusionMatrix::new(vocab.labels());

        for batch in val_loader.iter() {
            let logits = model_valid.forward(batch.features);

            let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(&logits.device());
            let batch_loss: f64 = ce
                .forward(logits.clone(), batch.targets.clone())
                .into_scalar()
                .elem::<f64>();
            val_loss_sum += batch_loss;
            val_batches  += 1;

            // argmax(1) returns shape [batch, 1] — flatten to [batch]
            // before reading it back out
            let predicted: Vec<i64> = logits
                .argmax(1)
                .flatten::<1>(0, 1)
                .into_data()
                .convert::<i64>()
                .to_vec()
                .unwrap_or_default();
            let actual: Vec<i64> = batch
                .targets
                .into_data()
                .convert::<i64>()
                .to_vec()
                .unwrap_or_default();

            for (&a, &p) in actual.iter().zip(&predicted) {
                confusion.record(a as usize, p as usize);
            }
        }

        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let val_acc      = confusion.accuracy();

        println!(
            "Epoch {:>3}/{} | lr={:.0e} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, lr, avg_train_loss, avg_val_loss, val_acc * 100.0,
        );
        tracing::info!("Validation confusion matrix:\n{}", confusion.to_table());

        let metrics = EpochMetrics::new(epoch, lr, avg_train_loss, avg_val_loss, val_acc);
        if metrics.is_improvement(best_val_loss) {
            best_val_loss = avg_val_loss;
        }
        metrics_logger.log(&metrics)?;

        let stem = ckpt_manager.save_model(&model, epoch, avg_val_loss)?;
        tracing::info!("Checkpoint saved: {}", stem);
    }

    tracing::info!("Training complete (best val_loss={:.4})", best_val_loss);
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_steps_down_at_epoch_boundaries() {
        let base = 1e-3;
        assert_eq!(lr_schedule(1, base), base);
        assert_eq!(lr_schedule(20, base), base);
        assert_eq!(lr_schedule(21, base), base / 5.0);
        assert_eq!(lr_schedule(30, base), base / 5.0);
        assert_eq!(lr_schedule(31, base), base / 10.0);
        assert_eq!(lr_schedule(40, base), base / 10.0);
    }
}
