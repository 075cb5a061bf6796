//! Projection of a [`CustomerRecord`] onto the columns the models were trained on.

use std::collections::HashMap;

use crate::types::{CustomerRecord, PlanFlag};

pub const ACCOUNT_LENGTH: &str = "Account length";
pub const INTERNATIONAL_PLAN: &str = "International plan";
pub const VOICE_MAIL_PLAN: &str = "Voice mail plan";
pub const NUMBER_VMAIL_MESSAGES: &str = "Number vmail messages";
pub const TOTAL_DAY_CALLS: &str = "Total day calls";
pub const TOTAL_EVE_CALLS: &str = "Total eve calls";
pub const TOTAL_NIGHT_CALLS: &str = "Total night calls";
pub const TOTAL_INTL_CALLS: &str = "Total intl calls";
pub const CUSTOMER_SERVICE_CALLS: &str = "Customer service calls";
pub const STATE: &str = "State";
pub const AREA_CODE: &str = "Area code";

/// Training column order.
pub const COLUMNS: [&str; 11] = [
    ACCOUNT_LENGTH,
    INTERNATIONAL_PLAN,
    VOICE_MAIL_PLAN,
    NUMBER_VMAIL_MESSAGES,
    TOTAL_DAY_CALLS,
    TOTAL_EVE_CALLS,
    TOTAL_NIGHT_CALLS,
    TOTAL_INTL_CALLS,
    CUSTOMER_SERVICE_CALLS,
    STATE,
    AREA_CODE,
];

/// Column value as the models see it before any model-side encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue<'a> {
    Count(u32),
    Category(&'a str),
}

/// Fields are declared in training column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    pub account_length: u32,
    pub international_plan: PlanFlag,
    pub voice_mail_plan: PlanFlag,
    pub number_vmail_messages: u32,
    pub total_day_calls: u32,
    pub total_eve_calls: u32,
    pub total_night_calls: u32,
    pub total_intl_calls: u32,
    pub customer_service_calls: u32,
    pub state: String,
    pub area_code: String,
}

impl From<&CustomerRecord> for FeatureVector {
    fn from(c: &CustomerRecord) -> Self {
        Self {
            account_length: c.account_length,
            international_plan: c.international_plan,
            voice_mail_plan: c.voice_mail_plan,
            number_vmail_messages: c.number_of_vmail_messages,
            total_day_calls: c.total_day_calls,
            total_eve_calls: c.total_eve_calls,
            total_night_calls: c.total_night_calls,
            total_intl_calls: c.total_intl_calls,
            customer_service_calls: c.customer_service_calls,
            state: c.state.clone(),
            area_code: c.area_code.clone(),
        }
    }
}

impl FeatureVector {
    /// `(column, value)` pairs in [`COLUMNS`] order.
    pub fn columns(&self) -> [(&'static str, FeatureValue<'_>); 11] {
        use FeatureValue::{Category, Count};
        [
            (ACCOUNT_LENGTH, Count(self.account_length)),
            (INTERNATIONAL_PLAN, Category(self.international_plan.as_str())),
            (VOICE_MAIL_PLAN, Category(self.voice_mail_plan.as_str())),
            (NUMBER_VMAIL_MESSAGES, Count(self.number_vmail_messages)),
            (TOTAL_DAY_CALLS, Count(self.total_day_calls)),
            (TOTAL_EVE_CALLS, Count(self.total_eve_calls)),
            (TOTAL_NIGHT_CALLS, Count(self.total_night_calls)),
            (TOTAL_INTL_CALLS, Count(self.total_intl_calls)),
            (CUSTOMER_SERVICE_CALLS, Count(self.customer_service_calls)),
            (STATE, Category(&self.state)),
            (AREA_CODE, Category(&self.area_code)),
        ]
    }

    /// Numeric view for model backends.
    ///
    /// Counts keep their column name. Plan flags become 1.0/0.0 under their
    /// column name. `State` and `Area code` are one-hot encoded as
    /// `"<column>=<value>"` (e.g. `"State=CA"`); every other category key is
    /// implicitly 0.0.
    pub fn encode(&self) -> HashMap<String, f64> {
        let mut out = HashMap::with_capacity(COLUMNS.len());
        for (name, value) in self.columns() {
            match value {
                FeatureValue::Count(n) => {
                    out.insert(name.to_string(), f64::from(n));
                }
                FeatureValue::Category(_) if name == INTERNATIONAL_PLAN => {
                    out.insert(name.to_string(), flag(self.international_plan));
                }
                FeatureValue::Category(_) if name == VOICE_MAIL_PLAN => {
                    out.insert(name.to_string(), flag(self.voice_mail_plan));
                }
                FeatureValue::Category(v) => {
                    out.insert(one_hot_key(name, v), 1.0);
                }
            }
        }
        out
    }
}

fn flag(f: PlanFlag) -> f64 {
    if f.is_yes() {
        1.0
    } else {
        0.0
    }
}

pub fn one_hot_key(column: &str, value: &str) -> String {
    format!("{column}={value}")
}

/// Dense input in the order a backend declares; absent keys read as 0.0.
pub fn order_from_flat(map: &HashMap<String, f64>, feat_list: &[String]) -> Vec<f32> {
    let mut v = Vec::with_capacity(feat_list.len());
    for k in feat_list {
        v.push(*map.get(k).unwrap_or(&0.0) as f32);
    }
    v
}
