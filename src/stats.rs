use serde::Serialize;

/// Portfolio-level figures served by `/stats`. Fixed snapshot; nothing here
/// is computed from live traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CustomerStats {
    pub total_customers: u64,
    pub active_customers: u64,
    pub churned_customers: u64,
    pub churn_rate: f64,
    pub avg_clv: u64,
    pub monthly_revenue: u64,
    pub high_risk_customers: u64,
    pub medium_risk_customers: u64,
    pub low_risk_customers: u64,
}

pub const SNAPSHOT: CustomerStats = CustomerStats {
    total_customers: 1_200_000,
    active_customers: 1_029_600,
    churned_customers: 170_400,
    churn_rate: 0.142,
    avg_clv: 32_450,
    monthly_revenue: 8_900_000,
    high_risk_customers: 168_000,
    medium_risk_customers: 216_000,
    low_risk_customers: 816_000,
};
