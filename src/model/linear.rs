use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use super::{Model, ModelError};
use crate::features::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearKind {
    /// Classifier: `sigmoid(intercept + w·x)`.
    Logistic,
    /// Regressor: `intercept + w·x`.
    Linear,
}

/// Coefficients keyed by encoded feature name (see [`FeatureVector::encode`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub kind: LinearKind,
    pub intercept: f64,
    #[serde(default)]
    pub coefficients: HashMap<String, f64>,
}

impl LinearModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let txt = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model: LinearModel = serde_json::from_str(&txt).map_err(|e| ModelError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some((name, w)) = model.coefficients.iter().find(|(_, w)| !w.is_finite()) {
            return Err(ModelError::Parse {
                path: path.display().to_string(),
                message: format!("coefficient {name:?} is not finite ({w})"),
            });
        }
        if !model.intercept.is_finite() {
            return Err(ModelError::Parse {
                path: path.display().to_string(),
                message: "intercept is not finite".into(),
            });
        }
        Ok(model)
    }

    fn margin(&self, features: &FeatureVector) -> f64 {
        let x = features.encode();
        self.intercept
            + self
                .coefficients
                .iter()
                .map(|(name, w)| w * x.get(name).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Model for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let z = self.margin(features);
        Ok(match self.kind {
            LinearKind::Linear => z,
            LinearKind::Logistic => {
                if sigmoid(z) >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        })
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        match self.kind {
            LinearKind::Logistic => Ok(sigmoid(self.margin(features))),
            LinearKind::Linear => Err(ModelError::Unsupported("predict_probability")),
        }
    }
}
