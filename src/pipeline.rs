//! Single and batch prediction: validate, project, score, decide.

use crate::{
    decision,
    error::ApiError,
    features::FeatureVector,
    model::{ScoreError, ScoringAdapter},
    types::{BatchPredictionResponse, CustomerRecord, PredictionResult},
};

pub const MODELS_NOT_LOADED: &str = "ML models not loaded. Please ensure model files are available.";
pub const BATCH_MODELS_NOT_LOADED: &str = "ML models not loaded.";

/// Runs `record` through normalizer, both models and the decision engine.
/// Callers check model availability first.
fn score(adapter: &ScoringAdapter, record: &CustomerRecord) -> Result<PredictionResult, ScoreError> {
    let features = FeatureVector::from(record);

    let churn_probability = adapter.score_churn(&features)?;
    let estimated_clv = adapter.score_value(&features)?;
    let d = decision::decide(churn_probability, estimated_clv);

    tracing::debug!(
        state = %features.state,
        area_code = %features.area_code,
        service_calls = features.customer_service_calls,
        churn_probability,
        estimated_clv,
        risk = ?d.risk,
        confidence = ?d.confidence,
        "scored customer"
    );

    Ok(PredictionResult {
        churn_probability,
        churn_risk: d.risk,
        estimated_clv,
        recommendation: d.recommendation.message().to_string(),
        confidence: d.confidence,
    })
}

pub fn predict_one(adapter: &ScoringAdapter, record: &CustomerRecord) -> Result<PredictionResult, ApiError> {
    record.validate().map_err(ApiError::Validation)?;
    adapter
        .ensure_ready()
        .map_err(|_| ApiError::ModelsUnavailable(MODELS_NOT_LOADED.to_string()))?;

    score(adapter, record).map_err(|e| {
        tracing::warn!(error = %e, "prediction failed");
        ApiError::PredictionFailed(format!("Prediction error: {e}"))
    })
}

/// All-or-nothing: the first failing record fails the whole batch. Output
/// order matches input order.
pub fn predict_batch(
    adapter: &ScoringAdapter,
    records: &[CustomerRecord],
) -> Result<BatchPredictionResponse, ApiError> {
    for (i, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|e| ApiError::Validation(format!("item {i}: {e}")))?;
    }
    adapter
        .ensure_ready()
        .map_err(|_| ApiError::ModelsUnavailable(BATCH_MODELS_NOT_LOADED.to_string()))?;

    let predictions = records
        .iter()
        .map(|r| score(adapter, r))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            tracing::warn!(error = %e, batch_size = records.len(), "batch prediction failed");
            ApiError::PredictionFailed(format!("Batch prediction error: {e}"))
        })?;

    tracing::info!(count = predictions.len(), "batch scored");
    Ok(predictions.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ConfidenceTier, RiskTier};
    use crate::model::{Model, ModelError};
    use crate::types::PlanFlag;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// Churn probability = customer service calls / 10, value = account length * 100.
    struct CallsModel;

    impl Model for CallsModel {
        fn predict(&self, f: &FeatureVector) -> Result<f64, ModelError> {
            Ok(f64::from(f.account_length) * 100.0)
        }

        fn predict_probability(&self, f: &FeatureVector) -> Result<f64, ModelError> {
            Ok(f64::from(f.customer_service_calls) / 10.0)
        }
    }

    /// Counts invocations; fails on the customer with 9 service calls.
    struct Flaky(AtomicUsize);

    impl Model for Flaky {
        fn predict(&self, f: &FeatureVector) -> Result<f64, ModelError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            if f.customer_service_calls == 9 {
                return Err(ModelError::Backend("boom".into()));
            }
            Ok(1.0)
        }
    }

    fn record(service_calls: u32, account_length: u32) -> CustomerRecord {
        CustomerRecord {
            account_length,
            state: "CA".into(),
            area_code: "415".into(),
            international_plan: PlanFlag::No,
            voice_mail_plan: PlanFlag::Yes,
            number_of_vmail_messages: 25,
            total_day_calls: 110,
            total_eve_calls: 85,
            total_night_calls: 95,
            total_intl_calls: 3,
            customer_service_calls: service_calls,
        }
    }

    fn adapter() -> ScoringAdapter {
        let m: Arc<dyn Model> = Arc::new(CallsModel);
        ScoringAdapter::new(Some(m.clone()), Some(m))
    }

    #[test]
    fn predict_one_runs_the_full_pipeline() {
        let out = predict_one(&adapter(), &record(5, 500)).unwrap();
        assert_eq!(out.churn_probability, 0.5);
        assert_eq!(out.estimated_clv, 50_000.0);
        assert_eq!(out.churn_risk, RiskTier::High);
        assert_eq!(out.confidence, ConfidenceTier::Low);
        assert!(out.recommendation.starts_with("CRITICAL"));
    }

    #[test]
    fn predict_one_is_idempotent() {
        let a = adapter();
        let r = record(3, 350);
        assert_eq!(predict_one(&a, &r).unwrap(), predict_one(&a, &r).unwrap());
    }

    #[test]
    fn missing_models_short_circuit() {
        let err = predict_one(&ScoringAdapter::default(), &record(1, 1)).unwrap_err();
        assert!(matches!(err, ApiError::ModelsUnavailable(ref m) if m == MODELS_NOT_LOADED));

        let err = predict_batch(&ScoringAdapter::default(), &[record(1, 1)]).unwrap_err();
        assert!(matches!(err, ApiError::ModelsUnavailable(ref m) if m == BATCH_MODELS_NOT_LOADED));
    }

    #[test]
    fn validation_runs_before_model_check() {
        let mut r = record(1, 1);
        r.state = "C".into();
        let err = predict_one(&ScoringAdapter::default(), &r).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn scoring_failure_is_wrapped() {
        let churn: Arc<dyn Model> = Arc::new(CallsModel);
        let clv: Arc<dyn Model> = Arc::new(Flaky(AtomicUsize::new(0)));
        let a = ScoringAdapter::new(Some(churn), Some(clv));
        // CallsModel would give p = 0.9; the regressor fails first on 9 calls.
        let err = predict_one(&a, &record(9, 1)).unwrap_err();
        match err {
            ApiError::PredictionFailed(m) => {
                assert!(m.starts_with("Prediction error: "));
                assert!(m.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn batch_preserves_order() {
        let records: Vec<_> = (0..=10).map(|c| record(c, 100 + c)).collect();
        let out = predict_batch(&adapter(), &records).unwrap();
        assert_eq!(out.count, records.len());
        for (r, p) in records.iter().zip(&out.predictions) {
            assert_eq!(p.churn_probability, f64::from(r.customer_service_calls) / 10.0);
            assert_eq!(p.estimated_clv, f64::from(r.account_length) * 100.0);
        }
    }

    #[test]
    fn empty_batch_is_ok() {
        let out = predict_batch(&adapter(), &[]).unwrap();
        assert_eq!(out.count, 0);
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let flaky = Arc::new(Flaky(AtomicUsize::new(0)));
        let churn: Arc<dyn Model> = Arc::new(CallsModel);
        let clv: Arc<dyn Model> = flaky.clone();
        let a = ScoringAdapter::new(Some(churn), Some(clv));

        let records = vec![record(1, 1), record(9, 1), record(2, 1)];
        let err = predict_batch(&a, &records).unwrap_err();
        assert!(matches!(err, ApiError::PredictionFailed(ref m) if m.starts_with("Batch prediction error: ")));
        assert_eq!(flaky.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn batch_validation_names_the_item() {
        let mut bad = record(1, 1);
        bad.area_code = "12".into();
        let err = predict_batch(&adapter(), &[record(1, 1), bad]).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m.starts_with("item 1:")));
    }
}
