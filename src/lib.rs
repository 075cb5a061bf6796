//! Customer churn and lifetime-value prediction API.
//!
//! Two models are loaded once at startup; each request is projected onto
//! the training columns, scored, and bucketed into risk/confidence tiers
//! with a retention recommendation.

pub mod config;
pub mod decision;
pub mod error;
pub mod features;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod stats;
pub mod types;

pub use crate::config::{load_settings, Settings};
pub use crate::error::ApiError;
pub use crate::http::{create_router, AppState};
pub use crate::model::{Model, ModelError, ScoringAdapter};
pub use crate::types::{CustomerRecord, PlanFlag, PredictionResult};
