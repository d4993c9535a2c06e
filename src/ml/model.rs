use std::fmt;
use std::str::FromStr;

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// Pool target after the conv stack — fixes the classifier head size
/// independently of the fingerprint dimensions.
const POOL_OUTPUT: [usize; 2] = [4, 1];
const HIDDEN_UNITS: usize = 128;

/// The available network topologies, selected by name on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    /// Three conv blocks (1→16→32→64) — the default
    Conv2d,
    /// Two conv blocks (1→16→32) — faster, slightly weaker
    Conv2dFast,
}

impl Arch {
    /// Output channels per conv block, in order.
    fn channels(self) -> &'static [usize] {
        match self {
            Arch::Conv2d     => &[16, 32, 64],
            Arch::Conv2dFast => &[16, 32],
        }
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conv-2d"      => Ok(Arch::Conv2d),
            "conv-2d-fast" => Ok(Arch::Conv2dFast),
            other => Err(anyhow::anyhow!(
                "Unknown model '{other}' — available: conv-2d, conv-2d-fast"
            )),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Conv2d     => write!(f, "conv-2d"),
            Arch::Conv2dFast => write!(f, "conv-2d-fast"),
        }
    }
}

pub struct KwsModelConfig {
    pub arch:        Arch,
    pub label_count: usize,
    pub dropout:     f64,
}

impl KwsModelConfig {
    pub fn new(arch: Arch, label_count: usize, dropout: f64) -> Self {
        Self { arch, label_count, dropout }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> KwsModel<B> {
        let mut blocks = Vec::new();
        let mut in_channels = 1;
        for &out_channels in self.arch.channels() {
            blocks.push(ConvBlock::new(in_channels, out_channels, device));
            in_channels = out_channels;
        }

        let pooled = in_channels * POOL_OUTPUT[0] * POOL_OUTPUT[1];
        KwsModel {
            blocks,
            pool:    AdaptiveAvgPool2dConfig::new(POOL_OUTPUT).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc1:     LinearConfig::new(pooled, HIDDEN_UNITS).init(device),
            fc2:     LinearConfig::new(HIDDEN_UNITS, self.label_count).init(device),
        }
    }
}

/// Conv → BatchNorm → ReLU → MaxPool(2×2), halving both map dims.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            norm: BatchNormConfig::new(out_channels).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        let x = burn::tensor::activation::relu(x);
        self.pool.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct KwsModel<B: Backend> {
    blocks:  Vec<ConvBlock<B>>,
    pool:    AdaptiveAvgPool2d,
    dropout: Dropout,
    fc1:     Linear<B>,
    fc2:     Linear<B>,
}

impl<B: Backend> KwsModel<B> {
    /// features: [batch, 1, frames, coeffs] → logits: [batch, label_count]
    pub fn forward(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = features;
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = self.pool.forward(x); // [batch, channels, 4, 1]
        let x = x.flatten::<2>(1, 3); // [batch, channels * 4]
        let x = burn::tensor::activation::relu(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Cross-entropy over the logits; returns (loss, logits) so the
    /// caller can reuse the forward pass for accuracy bookkeeping.
    pub fn forward_loss(
        &self,
        features: Tensor<B, 4>,
        targets:  Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(features);
        let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), targets);
        (loss, logits)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn arch_names_roundtrip() {
        assert_eq!("conv-2d".parse::<Arch>().unwrap(), Arch::Conv2d);
        assert_eq!("conv-2d-fast".parse::<Arch>().unwrap(), Arch::Conv2dFast);
        assert_eq!(Arch::Conv2d.to_string(), "conv-2d");
        assert!("conv-3d".parse::<Arch>().is_err());
    }

    #[test]
    fn forward_emits_one_logit_per_class() {
        let device = Default::default();
        let model: KwsModel<TestBackend> =
            KwsModelConfig::new(Arch::Conv2d, 32, 0.1).init(&device);

        let features = Tensor::<TestBackend, 4>::zeros([2, 1, 98, 13], &device);
        let logits = model.forward(features);
        assert_eq!(logits.dims(), [2, 32]);
    }

    #[test]
    fn fast_arch_has_fewer_blocks() {
        let device = Default::default();
        let fast: KwsModel<TestBackend> =
            KwsModelConfig::new(Arch::Conv2dFast, 12, 0.0).init(&device);
        let full: KwsModel<TestBackend> =
            KwsModelConfig::new(Arch::Conv2d, 12, 0.0).init(&device);
        assert_eq!(fast.blocks.len(), 2);
        assert_eq!(full.blocks.len(), 3);

        let features = Tensor::<TestBackend, 4>::zeros([1, 1, 98, 13], &device);
        assert_eq!(fast.forward(features.clone()).dims(), [1, 12]);
        assert_eq!(full.forward(features).dims(), [1, 12]);
    }
}
