//! Checkpoint loading with parameter-name reconciliation
//!
//! Checkpoints are safetensors files: a flat name → tensor mapping with
//! optional header metadata (`idx_to_class`, `num_classes`, `balanced_acc`,
//! `val_acc`, `timestamp`). Parameter names saved under a training wrapper
//! (`module.`, `model.`) are reconciled against the bare inference model
//! through a single candidate-generation rule, applied uniformly.

use crate::config::DetectorConfig;
use crate::error::{DetectorError, DetectorResult};
use candle_core::Device;
use candle_nn::VarMap;
use safetensors::SafeTensors;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Metadata carried alongside checkpoint weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Class index → label mapping
    pub idx_to_class: BTreeMap<usize, String>,
    /// Number of classes the checkpoint was trained for
    pub num_classes: usize,
    /// Balanced accuracy recorded at save time, if any
    pub balanced_acc: Option<f64>,
    /// Validation accuracy recorded at save time, if any
    pub val_acc: Option<f64>,
    /// Save timestamp, if any
    pub timestamp: Option<String>,
}

/// A parsed checkpoint file: raw tensors plus header metadata
#[derive(Debug)]
pub struct Checkpoint {
    /// Parameter name → tensor mapping
    pub tensors: HashMap<String, candle_core::Tensor>,
    /// Raw safetensors header metadata
    pub header: HashMap<String, String>,
}

impl Checkpoint {
    /// Reads and parses a checkpoint file
    pub fn read<P: AsRef<Path>>(path: P, device: &Device) -> DetectorResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            DetectorError::Model(format!("failed to read checkpoint {}: {e}", path.display()))
        })?;
        Self::from_bytes(&data, device)
    }

    /// Parses checkpoint bytes already in memory
    pub fn from_bytes(data: &[u8], device: &Device) -> DetectorResult<Self> {
        let (_, metadata) = SafeTensors::read_metadata(data).map_err(|e| {
            DetectorError::CheckpointIncompatible(format!("not a safetensors file: {e}"))
        })?;
        let header = metadata.metadata().clone().unwrap_or_default();

        let tensors = candle_core::safetensors::load_buffer(data, device).map_err(|e| {
            DetectorError::CheckpointIncompatible(format!("failed to parse tensors: {e}"))
        })?;

        Ok(Self { tensors, header })
    }

    /// Resolves checkpoint metadata, falling back to config values for
    /// fields the header does not carry
    pub fn resolve_metadata(&self, config: &DetectorConfig) -> DetectorResult<CheckpointMetadata> {
        let idx_to_class = match self.header.get("idx_to_class") {
            Some(raw) => parse_label_map(raw)?,
            None => config.label_map()?,
        };

        Ok(CheckpointMetadata {
            idx_to_class,
            num_classes: self
                .header
                .get("num_classes")
                .and_then(|v| v.parse().ok())
                .unwrap_or(config.num_classes),
            balanced_acc: self.header.get("balanced_acc").and_then(|v| v.parse().ok()),
            val_acc: self.header.get("val_acc").and_then(|v| v.parse().ok()),
            timestamp: self.header.get("timestamp").cloned(),
        })
    }
}

fn parse_label_map(raw: &str) -> DetectorResult<BTreeMap<usize, String>> {
    let labels: BTreeMap<String, String> = serde_json::from_str(raw).map_err(|e| {
        DetectorError::CheckpointIncompatible(format!("invalid idx_to_class metadata: {e}"))
    })?;
    labels
        .into_iter()
        .map(|(key, label)| {
            let idx = key.parse::<usize>().map_err(|_| {
                DetectorError::CheckpointIncompatible(format!(
                    "invalid idx_to_class metadata: non-integer key {key:?}"
                ))
            })?;
            Ok((idx, label))
        })
        .collect()
}

/// Candidate model parameter names for a checkpoint parameter name
///
/// In order: the name verbatim, with a leading `module.` stripped (saved
/// under a distributed-training wrapper), with a leading `model.` stripped
/// (saved under a wrapper class), and with `model.` prepended (the target
/// model itself uses a wrapper). The first candidate that exists in the
/// model with a matching shape wins.
pub fn key_candidates(key: &str) -> Vec<String> {
    let mut candidates = vec![key.to_string()];
    if let Some(stripped) = key.strip_prefix("module.") {
        candidates.push(stripped.to_string());
    }
    if let Some(stripped) = key.strip_prefix("model.") {
        candidates.push(stripped.to_string());
    }
    if !key.starts_with("model.") {
        candidates.push(format!("model.{key}"));
    }
    candidates
}

/// Accounting of one checkpoint load
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Parameters copied into the model
    pub loaded: usize,
    /// Parameters skipped because the matched name had a different shape
    pub skipped_shape: usize,
    /// Parameters with no matching model parameter under any candidate
    pub skipped_missing: usize,
    /// Resolved checkpoint metadata
    pub metadata: CheckpointMetadata,
}

/// Copies checkpoint values into the model's parameters in place
///
/// Unmatched checkpoint parameters are dropped and the corresponding model
/// parameters keep their initialization. Fails only when zero parameters
/// match, which indicates a format incompatibility rather than a partial
/// mismatch.
pub fn load_into(
    checkpoint: &Checkpoint,
    varmap: &VarMap,
    config: &DetectorConfig,
) -> DetectorResult<LoadReport> {
    let metadata = checkpoint.resolve_metadata(config)?;
    let vars = varmap.data().lock().unwrap();

    let mut loaded = 0usize;
    let mut skipped_shape = 0usize;
    let mut skipped_missing = 0usize;

    for (name, tensor) in &checkpoint.tensors {
        let mut matched = false;
        for candidate in key_candidates(name) {
            let Some(var) = vars.get(&candidate) else {
                continue;
            };
            if var.as_tensor().dims() != tensor.dims() {
                continue;
            }
            let value = tensor.to_dtype(var.as_tensor().dtype()).map_err(|e| {
                DetectorError::Model(format!("dtype conversion failed for {name}: {e}"))
            })?;
            var.set(&value).map_err(|e| {
                DetectorError::Model(format!("failed to copy {name} into {candidate}: {e}"))
            })?;
            loaded += 1;
            matched = true;
            break;
        }

        if !matched {
            // A candidate that exists with the wrong shape is worth a warning;
            // a fully unknown name only debug logging.
            let clash = key_candidates(name)
                .into_iter()
                .find(|c| vars.contains_key(c));
            match clash {
                Some(candidate) => {
                    let expected = vars[&candidate].as_tensor().dims().to_vec();
                    warn!(
                        parameter = %candidate,
                        checkpoint_shape = ?tensor.dims(),
                        model_shape = ?expected,
                        "Shape mismatch, parameter not loaded"
                    );
                    skipped_shape += 1;
                }
                None => {
                    debug!(parameter = %name, "No matching model parameter, dropped");
                    skipped_missing += 1;
                }
            }
        }
    }

    if loaded == 0 {
        return Err(DetectorError::CheckpointIncompatible(format!(
            "no checkpoint parameters matched the model \
             ({} checkpoint tensors, {} model parameters)",
            checkpoint.tensors.len(),
            vars.len()
        )));
    }

    info!(
        loaded,
        skipped_shape, skipped_missing, "Checkpoint parameters loaded"
    );

    Ok(LoadReport {
        loaded,
        skipped_shape,
        skipped_missing,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_candidates_plain() {
        assert_eq!(
            key_candidates("stem.conv.weight"),
            vec!["stem.conv.weight", "model.stem.conv.weight"]
        );
    }

    #[test]
    fn test_key_candidates_module_prefix() {
        assert_eq!(
            key_candidates("module.stem.conv.weight"),
            vec![
                "module.stem.conv.weight",
                "stem.conv.weight",
                "model.module.stem.conv.weight"
            ]
        );
    }

    #[test]
    fn test_key_candidates_model_prefix() {
        assert_eq!(
            key_candidates("model.head.fc.weight"),
            vec!["model.head.fc.weight", "head.fc.weight"]
        );
    }

    #[test]
    fn test_parse_label_map() {
        let labels = parse_label_map(r#"{"0": "ai", "1": "real"}"#).unwrap();
        assert_eq!(labels.get(&0).map(String::as_str), Some("ai"));
        assert_eq!(labels.get(&1).map(String::as_str), Some("real"));

        assert!(parse_label_map(r#"{"first": "ai"}"#).is_err());
        assert!(parse_label_map("not json").is_err());
    }
}
