use serde::{Deserialize, Serialize};

use crate::decision::{ConfidenceTier, RiskTier};

/// Yes/no subscription flag as sent by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFlag {
    Yes,
    No,
}

impl PlanFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanFlag::Yes => "yes",
            PlanFlag::No => "no",
        }
    }

    pub fn is_yes(self) -> bool {
        self == PlanFlag::Yes
    }
}

/// One customer as posted to `/predict` or inside a `/batch-predict` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub account_length: u32,        // days
    pub state: String,              // 2-letter state code
    pub area_code: String,          // 3-digit area code
    pub international_plan: PlanFlag,
    pub voice_mail_plan: PlanFlag,
    pub number_of_vmail_messages: u32,
    pub total_day_calls: u32,
    pub total_eve_calls: u32,
    pub total_night_calls: u32,
    pub total_intl_calls: u32,
    pub customer_service_calls: u32,
}

impl CustomerRecord {
    /// Checks the invariants serde can't express: counts are already
    /// non-negative by type and plan flags are closed enums.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.state.chars().count() != 2 {
            problems.push(format!(
                "state: expected exactly 2 characters, got {:?}",
                self.state
            ));
        }
        if self.area_code.chars().count() != 3 || !self.area_code.chars().all(|c| c.is_ascii_digit())
        {
            problems.push(format!(
                "areaCode: expected exactly 3 digits, got {:?}",
                self.area_code
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Scored outcome for a single customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub churn_probability: f64,
    pub churn_risk: RiskTier,
    pub estimated_clv: f64,
    pub recommendation: String,
    pub confidence: ConfidenceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<PredictionResult>,
    pub count: usize,
}

impl From<Vec<PredictionResult>> for BatchPredictionResponse {
    fn from(predictions: Vec<PredictionResult>) -> Self {
        let count = predictions.len();
        Self { predictions, count }
    }
}
