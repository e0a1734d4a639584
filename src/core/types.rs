use serde::Serialize;

/// Hard ceiling on simulated age. Jeanne Calment, the oldest person whose age
/// has been verified, died at 122 years and 164 days.
pub const MAX_AGE: u32 = 123;

pub const MAX_AGE_NOTE: &str = "Projection stopped at age 123. The oldest verified human lifespan \
     is 122 years and 164 days (Jeanne Calment), so savings remaining beyond this age are not projected.";

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub currency: String,
    pub initial_amount: f64,
    pub monthly_contribution: f64,
    /// Annual percentage, 5 means 5%.
    pub interest_rate: f64,
    /// Annual percentage.
    pub inflation_rate: f64,
    pub current_age: i64,
    pub retirement_age: i64,
    pub monthly_withdrawal: f64,
    /// Annual percentage growth of the monthly contribution itself.
    pub contribution_growth_rate: f64,
}

/// One row of a projection. Yearly rows carry an age and formatted amounts;
/// the advisory row emitted at the age ceiling has no age, empty amounts and
/// a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    pub age: Option<u32>,
    pub total_invested: String,
    pub total_savings: String,
    pub withdrawal: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl YearRecord {
    pub(crate) fn year(
        age: u32,
        total_invested: f64,
        balance: f64,
        withdrawal: f64,
        currency: &str,
    ) -> Self {
        Self {
            age: Some(age),
            total_invested: format_amount(total_invested),
            total_savings: format_amount(floor_at_zero(balance)),
            withdrawal: format_amount(withdrawal),
            currency: currency.to_string(),
            note: None,
        }
    }

    pub(crate) fn max_age_advisory(currency: &str) -> Self {
        Self {
            age: None,
            total_invested: String::new(),
            total_savings: String::new(),
            withdrawal: String::new(),
            currency: currency.to_string(),
            note: Some(MAX_AGE_NOTE.to_string()),
        }
    }

    pub fn is_advisory(&self) -> bool {
        self.note.is_some()
    }
}

pub(crate) fn floor_at_zero(value: f64) -> f64 {
    if value > 0.0 { value } else { 0.0 }
}

/// Two-decimal money formatting. Negative zero prints as `0.00`.
pub(crate) fn format_amount(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.2}")
}
