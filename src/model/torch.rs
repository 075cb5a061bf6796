use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tch::{kind::Kind, CModule, Device, IndexOp, Tensor};

use super::{Model, ModelError};
use crate::features::{order_from_flat, FeatureVector};

#[derive(Deserialize)]
struct MetaJson {
    feat_list: Vec<String>,
    in_dim: Option<usize>,
}

/// TorchScript module plus the dense feature order it was exported with,
/// read from `<stem>.meta.json` next to the module file.
pub struct TorchModel {
    model: CModule,
    device: Device,
    feat_list: Vec<String>,
    n_outputs: i64,
}

/// `models/churn.pt` -> `models/churn.meta.json`.
fn meta_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("meta.json")
}

fn backend(e: tch::TchError) -> ModelError {
    ModelError::Backend(e.to_string())
}

impl TorchModel {
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        let device = Device::Cpu;

        let meta_path = meta_path(model_path);
        let meta_txt = fs::read_to_string(&meta_path).map_err(|source| ModelError::Io {
            path: meta_path.display().to_string(),
            source,
        })?;
        let meta: MetaJson = serde_json::from_str(&meta_txt).map_err(|e| ModelError::Parse {
            path: meta_path.display().to_string(),
            message: e.to_string(),
        })?;

        let feat_list = meta.feat_list;
        let in_dim = meta.in_dim.unwrap_or(feat_list.len());
        if in_dim != feat_list.len() {
            tracing::warn!(
                "meta.in_dim ({}) != feat_list.len() ({}); using feat_list.len()",
                in_dim,
                feat_list.len()
            );
        }

        let model = CModule::load_on_device(model_path, device).map_err(backend)?;

        // Warmup forward; expect [B=1, C]
        let dummy = Tensor::zeros([1, feat_list.len() as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy]).map_err(backend)?;
        let sz = t.size();
        if sz.len() != 2 || sz[0] != 1 || sz[1] < 1 {
            return Err(ModelError::InvalidOutput(format!("unexpected model output size: {:?}", sz)));
        }
        tracing::info!(path = %model_path.display(), in_dim = feat_list.len(), n_outputs = sz[1], "warmup forward ok");

        Ok(Self {
            model,
            device,
            feat_list,
            n_outputs: sz[1],
        })
    }

    fn forward(&self, features: &FeatureVector) -> Result<Tensor, ModelError> {
        let x = order_from_flat(&features.encode(), &self.feat_list);
        let input = Tensor::from_slice(&x)
            .reshape([1, self.feat_list.len() as i64])
            .to_device(self.device);
        self.model.forward_ts(&[input]).map_err(backend)
    }
}

impl Model for TorchModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let t = self.forward(features)?;
        Ok(t.i((0, 0)).to_kind(Kind::Double).double_value(&[]))
    }

    /// Class-1 column for multi-output classifiers, sigmoid of the logit
    /// for single-output ones.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let t = self.forward(features)?;
        let p = if self.n_outputs >= 2 {
            t.i((0, 1))
        } else {
            t.i((0, 0)).sigmoid()
        };
        Ok(p.to_kind(Kind::Double).double_value(&[]))
    }
}
