use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExtraPaymentFrequency {
    OneTime,
    Monthly,
}

impl ExtraPaymentFrequency {
    // `period` is 1-based.
    pub fn extra_for_period(self, period: u32, extra_payment: f64) -> f64 {
        match self {
            ExtraPaymentFrequency::Monthly => extra_payment,
            ExtraPaymentFrequency::OneTime if period == 1 => extra_payment,
            ExtraPaymentFrequency::OneTime => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MortgageInputs {
    pub principal: f64,
    pub original_term_months: u32,
    pub annual_rate_percent: f64,
    pub remaining_term_months: u32,
    pub extra_payment: f64,
    pub extra_frequency: ExtraPaymentFrequency,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageResult {
    pub monthly_payment: f64,
    pub remaining_term_months: u32,
    pub baseline_balances: Vec<f64>,
    pub accelerated_balances: Vec<f64>,
    pub baseline_interest: Vec<f64>,
    pub accelerated_interest: Vec<f64>,
    pub baseline_payoff_month: u32,
    pub accelerated_payoff_month: u32,
    pub baseline_total_interest: f64,
    pub accelerated_total_interest: f64,
    pub total_interest_saved: f64,
    pub total_months_saved: u32,
}

#[derive(Debug, Clone)]
pub struct FreedomInputs {
    pub balance: f64,
    pub annual_return_rate: f64,
    pub depreciation_rate: f64,
    pub yearly_expenses: f64,
    pub yearly_addition: f64,
    pub current_age: f64,
    pub current_year: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreedomResult {
    pub payoff_year: i32,
    pub years: u32,
    pub freedom_age: f64,
    pub final_balance: f64,
    pub real_rate: f64,
    pub target_balance: f64,
    pub balance_history: Vec<f64>,
    pub age_history: Vec<f64>,
}
