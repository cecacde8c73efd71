use super::error::ProjectionError;
use super::types::{MortgageInputs, MortgageResult};

// Half a cent; absorbs annuity round-off on the unaccelerated schedule.
pub const SETTLED_BALANCE: f64 = 0.005;

pub const MAX_TERM_MONTHS: u32 = 1200;

#[derive(Debug)]
struct Schedule {
    balances: Vec<f64>,
    cumulative_interest: Vec<f64>,
}

impl Schedule {
    fn opening(principal: f64, periods: u32) -> Self {
        let mut balances = Vec::with_capacity(periods as usize + 1);
        let mut cumulative_interest = Vec::with_capacity(periods as usize + 1);
        balances.push(principal);
        cumulative_interest.push(0.0);
        Self {
            balances,
            cumulative_interest,
        }
    }

    fn balance(&self) -> f64 {
        self.balances.last().copied().unwrap_or(0.0)
    }

    fn total_interest(&self) -> f64 {
        self.cumulative_interest.last().copied().unwrap_or(0.0)
    }

    fn advance(&mut self, payment: f64, monthly_rate: f64, extra: f64) {
        let balance = self.balance();
        let interest = balance * monthly_rate;
        let principal_paid = payment - interest;
        let next = (balance - principal_paid - extra).max(0.0);
        self.balances.push(next);
        let cumulative = self.total_interest() + interest;
        self.cumulative_interest.push(cumulative);
    }

    fn payoff_month(&self, tolerance: f64) -> Option<u32> {
        self.balances
            .iter()
            .position(|&b| b <= tolerance)
            .map(|idx| idx as u32)
    }

    // Floored balances hit exactly zero once extra payments clear the loan.
    fn floored_payoff_month(&self) -> Option<u32> {
        self.payoff_month(0.0)
            .or_else(|| self.payoff_month(SETTLED_BALANCE))
    }
}

pub fn level_payment(principal: f64, monthly_rate: f64, total_months: u32) -> f64 {
    if monthly_rate == 0.0 {
        return principal / f64::from(total_months);
    }
    let denominator = 1.0 - (1.0 + monthly_rate).powf(-f64::from(total_months));
    principal * monthly_rate / denominator
}

pub fn project_mortgage(inputs: &MortgageInputs) -> Result<MortgageResult, ProjectionError> {
    validate(inputs)?;

    let total_months = inputs.original_term_months;
    let monthly_rate = inputs.annual_rate_percent / 12.0 / 100.0;
    let payment = level_payment(inputs.principal, monthly_rate, total_months);

    let mut baseline = Schedule::opening(inputs.principal, total_months);
    let mut accelerated = Schedule::opening(inputs.principal, total_months);

    // Both schedules run over the original term.
    for period in 1..=total_months {
        baseline.advance(payment, monthly_rate, 0.0);
        let extra = inputs
            .extra_frequency
            .extra_for_period(period, inputs.extra_payment);
        accelerated.advance(payment, monthly_rate, extra);
    }

    let no_payoff = ProjectionError::NoPayoffWithinHorizon {
        horizon_months: total_months,
    };
    let baseline_payoff_month = baseline
        .payoff_month(SETTLED_BALANCE)
        .ok_or_else(|| no_payoff.clone())?;
    let accelerated_payoff_month = accelerated.floored_payoff_month().ok_or(no_payoff)?;

    let baseline_total_interest = baseline.total_interest();
    let accelerated_total_interest = accelerated.total_interest();
    let total_months_saved = baseline_payoff_month.saturating_sub(accelerated_payoff_month);
    let total_interest_saved = baseline_total_interest - accelerated_total_interest;

    tracing::debug!(
        payment,
        baseline_payoff_month,
        accelerated_payoff_month,
        total_interest_saved,
        "mortgage projection complete"
    );

    Ok(MortgageResult {
        monthly_payment: payment,
        remaining_term_months: inputs.remaining_term_months,
        baseline_balances: baseline.balances,
        accelerated_balances: accelerated.balances,
        baseline_interest: baseline.cumulative_interest,
        accelerated_interest: accelerated.cumulative_interest,
        baseline_payoff_month,
        accelerated_payoff_month,
        baseline_total_interest,
        accelerated_total_interest,
        total_interest_saved,
        total_months_saved,
    })
}

fn validate(inputs: &MortgageInputs) -> Result<(), ProjectionError> {
    if !inputs.principal.is_finite() || inputs.principal <= 0.0 {
        return Err(ProjectionError::invalid("principal must be > 0"));
    }
    if inputs.original_term_months == 0 {
        return Err(ProjectionError::invalid("original term must be > 0 months"));
    }
    if inputs.original_term_months > MAX_TERM_MONTHS {
        return Err(ProjectionError::invalid(format!(
            "original term must be <= {MAX_TERM_MONTHS} months"
        )));
    }
    if inputs.remaining_term_months == 0 {
        return Err(ProjectionError::invalid("remaining term must be > 0 months"));
    }
    if inputs.remaining_term_months > inputs.original_term_months {
        return Err(ProjectionError::invalid(
            "remaining term cannot exceed original term",
        ));
    }
    if !inputs.annual_rate_percent.is_finite() || inputs.annual_rate_percent < 0.0 {
        return Err(ProjectionError::invalid("interest rate must be >= 0"));
    }
    if !inputs.extra_payment.is_finite() || inputs.extra_payment < 0.0 {
        return Err(ProjectionError::invalid("extra payment must be >= 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExtraPaymentFrequency;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> MortgageInputs {
        MortgageInputs {
            principal: 100_000.0,
            original_term_months: 360,
            annual_rate_percent: 5.0,
            remaining_term_months: 360,
            extra_payment: 200.0,
            extra_frequency: ExtraPaymentFrequency::Monthly,
        }
    }

    #[test]
    fn level_payment_matches_annuity_formula() {
        assert_approx(level_payment(100_000.0, 0.05 / 12.0, 360), 536.821_623_012_139_9);
    }

    #[test]
    fn level_payment_with_zero_rate_is_straight_line() {
        assert_approx(level_payment(36_000.0, 0.0, 360), 100.0);
    }

    #[test]
    fn golden_monthly_extra_payment() {
        let result = project_mortgage(&sample_inputs()).expect("valid inputs");

        assert_approx(result.monthly_payment, 536.821_623_012_139_9);
        assert_eq!(result.baseline_payoff_month, 360);
        assert_eq!(result.accelerated_payoff_month, 201);
        assert_eq!(result.total_months_saved, 159);
        assert!((result.baseline_total_interest - 93_255.784_284).abs() < 1e-3);
        assert!((result.total_interest_saved - 45_547.533_135).abs() < 1e-3);
        assert_eq!(result.baseline_balances.len(), 361);
        assert_eq!(result.accelerated_interest.len(), 361);
    }

    #[test]
    fn golden_one_time_extra_payment() {
        let mut inputs = sample_inputs();
        inputs.extra_payment = 10_000.0;
        inputs.extra_frequency = ExtraPaymentFrequency::OneTime;

        let result = project_mortgage(&inputs).expect("valid inputs");
        assert_eq!(result.accelerated_payoff_month, 289);
        assert_eq!(result.total_months_saved, 71);
        assert!((result.total_interest_saved - 28_298.024_079).abs() < 1e-3);
    }

    #[test]
    fn one_time_extra_only_applies_in_first_period() {
        let mut inputs = sample_inputs();
        inputs.extra_payment = 1_000.0;
        inputs.extra_frequency = ExtraPaymentFrequency::OneTime;

        let result = project_mortgage(&inputs).expect("valid inputs");
        let gap_after_first = result.baseline_balances[1] - result.accelerated_balances[1];
        assert_approx(gap_after_first, 1_000.0);
        // The gap only grows by the interest no longer charged on it.
        let gap_after_second = result.baseline_balances[2] - result.accelerated_balances[2];
        assert_approx(gap_after_second, 1_000.0 * (1.0 + 0.05 / 12.0));
    }

    #[test]
    fn zero_rate_saves_time_but_no_interest() {
        let mut inputs = sample_inputs();
        inputs.annual_rate_percent = 0.0;

        let result = project_mortgage(&inputs).expect("valid inputs");
        assert_eq!(result.baseline_payoff_month, 360);
        assert_eq!(result.accelerated_payoff_month, 210);
        assert_eq!(result.total_months_saved, 150);
        assert_approx(result.total_interest_saved, 0.0);
    }

    #[test]
    fn settled_balance_stays_at_zero() {
        let mut inputs = sample_inputs();
        inputs.extra_payment = 150_000.0;
        inputs.extra_frequency = ExtraPaymentFrequency::OneTime;

        let result = project_mortgage(&inputs).expect("valid inputs");
        assert_eq!(result.accelerated_payoff_month, 1);
        assert!(result.accelerated_balances[1..].iter().all(|&b| b == 0.0));
        let interest_after_payoff = result.accelerated_interest[360] - result.accelerated_interest[1];
        assert_approx(interest_after_payoff, 0.0);
    }

    #[test]
    fn remaining_term_is_echoed_but_does_not_shorten_simulation() {
        let mut inputs = sample_inputs();
        inputs.remaining_term_months = 120;

        let result = project_mortgage(&inputs).expect("valid inputs");
        assert_eq!(result.remaining_term_months, 120);
        assert_eq!(result.baseline_balances.len(), 361);
        assert_eq!(result.baseline_payoff_month, 360);
    }

    #[test]
    fn rejects_remaining_term_longer_than_original() {
        let mut inputs = sample_inputs();
        inputs.remaining_term_months = 31 * 12;

        let err = project_mortgage(&inputs).expect_err("must reject remaining > original");
        assert!(matches!(err, ProjectionError::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_positive_principal_and_terms() {
        let mut inputs = sample_inputs();
        inputs.principal = 0.0;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));

        let mut inputs = sample_inputs();
        inputs.original_term_months = 0;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));

        let mut inputs = sample_inputs();
        inputs.remaining_term_months = 0;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_negative_rate_and_extra() {
        let mut inputs = sample_inputs();
        inputs.annual_rate_percent = -0.5;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));

        let mut inputs = sample_inputs();
        inputs.extra_payment = -1.0;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));

        let mut inputs = sample_inputs();
        inputs.annual_rate_percent = f64::NAN;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_term_beyond_maximum() {
        let mut inputs = sample_inputs();
        inputs.original_term_months = MAX_TERM_MONTHS + 1;
        inputs.remaining_term_months = 12;
        assert!(matches!(
            project_mortgage(&inputs),
            Err(ProjectionError::InvalidInput(_))
        ));

        inputs.original_term_months = MAX_TERM_MONTHS;
        let result = project_mortgage(&inputs).expect("maximum term is allowed");
        assert_eq!(result.baseline_balances.len(), MAX_TERM_MONTHS as usize + 1);
    }

    #[test]
    fn floored_schedule_waits_for_zero_balance() {
        let schedule = Schedule {
            balances: vec![100.0, 0.003, 0.0],
            cumulative_interest: vec![0.0, 1.0, 1.0],
        };
        assert_eq!(schedule.payoff_month(SETTLED_BALANCE), Some(1));
        assert_eq!(schedule.floored_payoff_month(), Some(2));

        let residue_only = Schedule {
            balances: vec![100.0, 50.0, 0.003],
            cumulative_interest: vec![0.0, 1.0, 2.0],
        };
        assert_eq!(residue_only.floored_payoff_month(), Some(2));
    }

    #[test]
    fn interest_only_payment_never_settles() {
        // (1 + r)^-n underflows, so the payment covers interest and nothing else.
        let mut inputs = sample_inputs();
        inputs.annual_rate_percent = 100_000.0;
        inputs.extra_payment = 0.0;

        let err = project_mortgage(&inputs).expect_err("must not settle");
        assert_eq!(
            err,
            ProjectionError::NoPayoffWithinHorizon {
                horizon_months: 360
            }
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_accelerated_never_above_baseline(
            principal in 1_000u32..2_000_000,
            term_years in 1u32..41,
            extra_months in 0u32..12,
            rate_bp in 0u32..1500,
            extra in 0u32..5_000,
            monthly in proptest::bool::ANY,
        ) {
            let inputs = MortgageInputs {
                principal: f64::from(principal),
                original_term_months: term_years * 12 + extra_months,
                annual_rate_percent: f64::from(rate_bp) / 100.0,
                remaining_term_months: term_years * 12,
                extra_payment: f64::from(extra),
                extra_frequency: if monthly {
                    ExtraPaymentFrequency::Monthly
                } else {
                    ExtraPaymentFrequency::OneTime
                },
            };
            let result = project_mortgage(&inputs).expect("valid inputs");

            prop_assert_eq!(result.baseline_balances.len(), result.accelerated_balances.len());
            for (accel, base) in result.accelerated_balances.iter().zip(&result.baseline_balances) {
                prop_assert!(*accel <= *base + 1e-9);
            }
            for window in result.baseline_balances.windows(2) {
                prop_assert!(window[1] <= window[0]);
            }
            for window in result.accelerated_balances.windows(2) {
                prop_assert!(window[1] <= window[0]);
            }
            prop_assert!(result.accelerated_payoff_month <= result.baseline_payoff_month);
            prop_assert!(result.total_interest_saved >= -1e-9);
            prop_assert!(
                result.baseline_balances[inputs.original_term_months as usize] <= SETTLED_BALANCE
            );
        }

        #[test]
        fn prop_zero_extra_payment_matches_baseline(
            principal in 1_000u32..2_000_000,
            term_years in 1u32..41,
            rate_bp in 0u32..1500,
        ) {
            let inputs = MortgageInputs {
                principal: f64::from(principal),
                original_term_months: term_years * 12,
                annual_rate_percent: f64::from(rate_bp) / 100.0,
                remaining_term_months: term_years * 12,
                extra_payment: 0.0,
                extra_frequency: ExtraPaymentFrequency::Monthly,
            };
            let result = project_mortgage(&inputs).expect("valid inputs");

            prop_assert_eq!(&result.accelerated_balances, &result.baseline_balances);
            prop_assert_eq!(&result.accelerated_interest, &result.baseline_interest);
            prop_assert_eq!(result.total_months_saved, 0);
            prop_assert_eq!(result.total_interest_saved, 0.0);
        }
    }
}
