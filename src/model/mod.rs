//! Scoring adapter: the two opaque models behind one read-only handle.

use std::{path::Path, sync::Arc};

use thiserror::Error;

use crate::features::FeatureVector;

mod linear;
#[cfg(feature = "torch")]
mod torch;

pub use linear::{LinearKind, LinearModel};
#[cfg(feature = "torch")]
pub use torch::TorchModel;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("{0} is not supported by this model")]
    Unsupported(&'static str),

    #[error("model returned an invalid output: {0}")]
    InvalidOutput(String),

    #[error("model backend error: {0}")]
    Backend(String),
}

/// A loaded, immutable predictive model.
pub trait Model: Send + Sync {
    /// Point prediction (regression value or class label).
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Probability of the positive class.
    fn predict_probability(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Err(ModelError::Unsupported("predict_probability"))
    }
}

/// Loads a model artifact, picking the backend from the file extension.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<dyn Model>, ModelError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => Ok(Arc::new(LinearModel::load(path)?)),
        #[cfg(feature = "torch")]
        "pt" | "ts" => Ok(Arc::new(TorchModel::load(path)?)),
        #[cfg(not(feature = "torch"))]
        "pt" | "ts" => Err(ModelError::UnsupportedFormat(format!(
            "{} (TorchScript support requires the `torch` feature)",
            path.display()
        ))),
        _ => Err(ModelError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Why scoring cannot happen at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("models unavailable (churn loaded: {churn_loaded}, clv loaded: {clv_loaded})")]
pub struct ModelsUnavailable {
    pub churn_loaded: bool,
    pub clv_loaded: bool,
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Unavailable(#[from] ModelsUnavailable),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Both models, fixed at startup. Either slot may be empty if its artifact
/// failed to load; scoring then refuses to run.
#[derive(Clone, Default)]
pub struct ScoringAdapter {
    churn: Option<Arc<dyn Model>>,
    clv: Option<Arc<dyn Model>>,
}

impl ScoringAdapter {
    pub fn new(churn: Option<Arc<dyn Model>>, clv: Option<Arc<dyn Model>>) -> Self {
        Self { churn, clv }
    }

    /// Loads both artifacts independently. A failure is logged and leaves
    /// that slot empty; it never aborts startup.
    pub fn load(churn_path: impl AsRef<Path>, clv_path: impl AsRef<Path>) -> Self {
        Self {
            churn: load_logged("churn", churn_path.as_ref()),
            clv: load_logged("clv", clv_path.as_ref()),
        }
    }

    pub fn churn_loaded(&self) -> bool {
        self.churn.is_some()
    }

    pub fn clv_loaded(&self) -> bool {
        self.clv.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.churn_loaded() && self.clv_loaded()
    }

    /// Fails fast unless both models are present.
    pub fn ensure_ready(&self) -> Result<(), ModelsUnavailable> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ModelsUnavailable {
                churn_loaded: self.churn_loaded(),
                clv_loaded: self.clv_loaded(),
            })
        }
    }

    fn models(&self) -> Result<(&dyn Model, &dyn Model), ModelsUnavailable> {
        match (&self.churn, &self.clv) {
            (Some(churn), Some(clv)) => Ok((churn.as_ref(), clv.as_ref())),
            _ => Err(ModelsUnavailable {
                churn_loaded: self.churn_loaded(),
                clv_loaded: self.clv_loaded(),
            }),
        }
    }

    /// Churn probability, checked to lie in [0, 1].
    pub fn score_churn(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let (churn, _) = self.models()?;
        let p = churn.predict_probability(features)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::InvalidOutput(format!("churn probability {p} outside [0, 1]")).into());
        }
        Ok(p)
    }

    /// Estimated lifetime value, checked to be finite.
    pub fn score_value(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let (_, clv) = self.models()?;
        let v = clv.predict(features)?;
        if !v.is_finite() {
            return Err(ModelError::InvalidOutput(format!("estimated value {v} is not finite")).into());
        }
        Ok(v)
    }
}

fn load_logged(name: &'static str, path: &Path) -> Option<Arc<dyn Model>> {
    match load(path) {
        Ok(m) => {
            tracing::info!(model = name, path = %path.display(), "model loaded");
            Some(m)
        }
        Err(e) => {
            tracing::error!(model = name, path = %path.display(), error = %e, "failed to load model");
            None
        }
    }
}
