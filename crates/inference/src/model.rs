//! Classifier architectures for the Veridect detector
//!
//! A small registry maps architecture names from the config to in-crate
//! constructors. All variants share the same topology (conv stem, three
//! downsampling stages, pooled linear head) and differ in width.

use crate::config::DetectorConfig;
use crate::error::{DetectorError, DetectorResult};
use candle_core::{Module, ModuleT, Tensor, D};
use candle_nn::{
    batch_norm, conv2d, linear, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig, Dropout, Linear,
    VarBuilder,
};

/// Width parameters for one classifier variant
#[derive(Debug, Clone, Copy)]
pub struct ClassifierSpec {
    /// Registry name of this variant
    pub name: &'static str,
    /// Stem output channels
    pub stem_width: usize,
    /// Output channels of the three downsampling stages
    pub stage_widths: [usize; 3],
}

const ARCHITECTURES: &[ClassifierSpec] = &[
    ClassifierSpec {
        name: "convdet_s0",
        stem_width: 24,
        stage_widths: [48, 96, 176],
    },
    ClassifierSpec {
        name: "convdet_s1",
        stem_width: 32,
        stage_widths: [64, 128, 224],
    },
    ClassifierSpec {
        name: "convdet_s2",
        stem_width: 32,
        stage_widths: [80, 160, 288],
    },
];

/// Resolves an architecture name to its spec
///
/// `efficientformerv2_s1` is accepted as an alias for `convdet_s1` so
/// legacy config files shipped with older checkpoints load unchanged.
pub fn resolve_architecture(name: &str) -> Option<&'static ClassifierSpec> {
    let name = match name {
        "efficientformerv2_s1" => "convdet_s1",
        other => other,
    };
    ARCHITECTURES.iter().find(|spec| spec.name == name)
}

/// Whether the registry knows the given architecture name
pub fn is_known_architecture(name: &str) -> bool {
    resolve_architecture(name).is_some()
}

/// One downsampling stage: strided 3x3 conv followed by a 3x3 conv
#[derive(Debug)]
struct Stage {
    conv1: Conv2d,
    bn1: BatchNorm,
    conv2: Conv2d,
    bn2: BatchNorm,
}

impl Stage {
    fn new(in_channels: usize, out_channels: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        let down = Conv2dConfig {
            padding: 1,
            stride: 2,
            ..Default::default()
        };
        let keep = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };
        Ok(Self {
            conv1: conv2d(in_channels, out_channels, 3, down, vb.pp("conv1"))?,
            bn1: batch_norm(out_channels, BatchNormConfig::default(), vb.pp("bn1"))?,
            conv2: conv2d(out_channels, out_channels, 3, keep, vb.pp("conv2"))?,
            bn2: batch_norm(out_channels, BatchNormConfig::default(), vb.pp("bn2"))?,
        })
    }

    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = self.bn1.forward_t(&xs.apply(&self.conv1)?, false)?.relu()?;
        self.bn2.forward_t(&xs.apply(&self.conv2)?, false)?.relu()
    }
}

/// Compact convolutional classifier
///
/// Expects NCHW float input normalized by [`crate::preprocess`]; produces
/// raw logits with one column per class.
#[derive(Debug)]
pub struct Classifier {
    stem_conv: Conv2d,
    stem_bn: BatchNorm,
    stages: Vec<Stage>,
    dropout: Dropout,
    head: Linear,
    name: &'static str,
}

impl Classifier {
    /// Constructs the classifier for `spec`, creating parameters through `vb`
    pub fn new(
        spec: &ClassifierSpec,
        config: &DetectorConfig,
        vb: VarBuilder,
    ) -> DetectorResult<Self> {
        Self::build(spec, config, vb)
            .map_err(|e| DetectorError::Model(format!("failed to construct {}: {e}", spec.name)))
    }

    fn build(
        spec: &ClassifierSpec,
        config: &DetectorConfig,
        vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        let stem_cfg = Conv2dConfig {
            padding: 1,
            stride: 2,
            ..Default::default()
        };
        let stem = vb.pp("stem");
        let stem_conv = conv2d(3, spec.stem_width, 3, stem_cfg, stem.pp("conv"))?;
        let stem_bn = batch_norm(spec.stem_width, BatchNormConfig::default(), stem.pp("bn"))?;

        let mut stages = Vec::with_capacity(spec.stage_widths.len());
        let mut in_channels = spec.stem_width;
        for (i, &out_channels) in spec.stage_widths.iter().enumerate() {
            stages.push(Stage::new(
                in_channels,
                out_channels,
                vb.pp("stages").pp(i.to_string()),
            )?);
            in_channels = out_channels;
        }

        let head = linear(in_channels, config.num_classes, vb.pp("head").pp("fc"))?;

        Ok(Self {
            stem_conv,
            stem_bn,
            stages,
            dropout: Dropout::new(config.drop_rate),
            head,
            name: spec.name,
        })
    }

    /// Registry name of this classifier
    pub fn architecture(&self) -> &'static str {
        self.name
    }
}

impl Module for Classifier {
    /// Inference-mode forward pass: logits of shape `(batch, num_classes)`
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let mut xs = self
            .stem_bn
            .forward_t(&xs.apply(&self.stem_conv)?, false)?
            .relu()?;
        for stage in &self.stages {
            xs = stage.forward(&xs)?;
        }
        // Global average pool over the spatial dimensions
        let xs = xs.mean(D::Minus1)?.mean(D::Minus1)?;
        let xs = self.dropout.forward_t(&xs, false)?;
        self.head.forward(&xs)
    }
}

/// Creates the model named by the configuration
pub fn create_model(config: &DetectorConfig, vb: VarBuilder) -> DetectorResult<Classifier> {
    let spec = resolve_architecture(&config.architecture).ok_or_else(|| {
        DetectorError::Model(format!("unknown architecture: {}", config.architecture))
    })?;
    Classifier::new(spec, config, vb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};

    fn test_config() -> DetectorConfig {
        DetectorConfig {
            architecture: "convdet_s0".to_string(),
            image_size: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(
            resolve_architecture("efficientformerv2_s1").map(|s| s.name),
            Some("convdet_s1")
        );
        assert!(resolve_architecture("convdet_s2").is_some());
        assert!(resolve_architecture("mlpmixer_b16").is_none());
    }

    #[test]
    fn test_forward_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let config = test_config();
        let model = create_model(&config, vb).unwrap();

        let input = Tensor::zeros((1, 3, 64, 64), DType::F32, &device).unwrap();
        let logits = model.forward(&input).unwrap();
        assert_eq!(logits.dims(), &[1, config.num_classes]);
    }

    #[test]
    fn test_unknown_architecture_fails() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let config = DetectorConfig {
            architecture: "unknown".to_string(),
            ..Default::default()
        };
        assert!(create_model(&config, vb).is_err());
    }
}
