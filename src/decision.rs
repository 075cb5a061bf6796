//! Turns a churn probability and an estimated lifetime value into tiers and
//! a retention recommendation.
//!
//! Each ladder is an ordered rule table: the first rule whose predicate holds
//! decides the outcome, and the last rule of every table always holds.

use serde::{Deserialize, Serialize};

/// Above this churn probability a customer is High risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.4;
/// Above this (and up to [`HIGH_RISK_THRESHOLD`]) a customer is Medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.2;

/// Value above which an at-risk (Medium or High) customer counts as high value.
pub const AT_RISK_HIGH_VALUE: f64 = 30_000.0;
/// Value above which a Low risk customer counts as high value.
pub const LOYAL_HIGH_VALUE: f64 = 40_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceTier {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    Critical,
    HighPriority,
    Proactive,
    Monitor,
    Nurture,
    Maintain,
}

impl Recommendation {
    pub const ALL: [Recommendation; 6] = [
        Recommendation::Critical,
        Recommendation::HighPriority,
        Recommendation::Proactive,
        Recommendation::Monitor,
        Recommendation::Nurture,
        Recommendation::Maintain,
    ];

    pub fn message(self) -> &'static str {
        match self {
            Recommendation::Critical => "CRITICAL: High-value customer at severe risk. Immediate executive intervention required. Offer premium retention package.",
            Recommendation::HighPriority => "HIGH PRIORITY: Customer likely to churn. Assign dedicated account manager and offer targeted incentives within 24 hours.",
            Recommendation::Proactive => "PROACTIVE: Valuable customer showing warning signs. Schedule personal check-in call and present loyalty rewards.",
            Recommendation::Monitor => "MONITOR: Elevated churn risk detected. Increase engagement through personalized offers and service improvements.",
            Recommendation::Nurture => "NURTURE: High-value loyal customer. Continue VIP treatment and explore upsell opportunities.",
            Recommendation::Maintain => "MAINTAIN: Healthy customer relationship. Continue standard engagement and periodic satisfaction surveys.",
        }
    }
}

/// One row of a rule table.
pub struct Rule<I: ?Sized, O> {
    pub applies: fn(&I) -> bool,
    pub outcome: O,
}

fn first_match<I: ?Sized, O: Copy>(rules: &[Rule<I, O>], input: &I) -> Option<O> {
    rules.iter().find(|r| (r.applies)(input)).map(|r| r.outcome)
}

pub const RISK_RULES: [Rule<f64, RiskTier>; 3] = [
    Rule { applies: |p| *p > HIGH_RISK_THRESHOLD, outcome: RiskTier::High },
    Rule { applies: |p| *p > MEDIUM_RISK_THRESHOLD, outcome: RiskTier::Medium },
    Rule { applies: |_| true, outcome: RiskTier::Low },
];

pub const CONFIDENCE_RULES: [Rule<f64, ConfidenceTier>; 4] = [
    Rule { applies: |p| *p < 0.1 || *p > 0.9, outcome: ConfidenceTier::VeryHigh },
    Rule { applies: |p| *p < 0.2 || *p > 0.8, outcome: ConfidenceTier::High },
    Rule { applies: |p| *p < 0.3 || *p > 0.7, outcome: ConfidenceTier::Moderate },
    Rule { applies: |_| true, outcome: ConfidenceTier::Low },
];

/// Keyed on (risk tier, clv) so the probability bands always agree with
/// [`RISK_RULES`].
pub const RECOMMENDATION_RULES: [Rule<(RiskTier, f64), Recommendation>; 6] = [
    Rule { applies: |(r, v)| *r == RiskTier::High && *v > AT_RISK_HIGH_VALUE, outcome: Recommendation::Critical },
    Rule { applies: |(r, _)| *r == RiskTier::High, outcome: Recommendation::HighPriority },
    Rule { applies: |(r, v)| *r == RiskTier::Medium && *v > AT_RISK_HIGH_VALUE, outcome: Recommendation::Proactive },
    Rule { applies: |(r, _)| *r == RiskTier::Medium, outcome: Recommendation::Monitor },
    Rule { applies: |(_, v)| *v > LOYAL_HIGH_VALUE, outcome: Recommendation::Nurture },
    Rule { applies: |_| true, outcome: Recommendation::Maintain },
];

pub fn risk_tier(p: f64) -> RiskTier {
    first_match(&RISK_RULES, &p).unwrap_or(RiskTier::Low)
}

pub fn confidence_tier(p: f64) -> ConfidenceTier {
    first_match(&CONFIDENCE_RULES, &p).unwrap_or(ConfidenceTier::Low)
}

pub fn recommendation(p: f64, clv: f64) -> Recommendation {
    first_match(&RECOMMENDATION_RULES, &(risk_tier(p), clv)).unwrap_or(Recommendation::Maintain)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub risk: RiskTier,
    pub confidence: ConfidenceTier,
    pub recommendation: Recommendation,
}

pub fn decide(p: f64, clv: f64) -> Decision {
    Decision {
        risk: risk_tier(p),
        confidence: confidence_tier(p),
        recommendation: recommendation(p, clv),
    }
}
