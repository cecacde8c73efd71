use super::error::ProjectionError;
use super::types::{FreedomInputs, FreedomResult};

pub const MAX_PROJECTION_YEARS: u32 = 200;

// Fisher relation.
pub fn real_rate(annual_return_rate: f64, depreciation_rate: f64) -> f64 {
    (1.0 + annual_return_rate) / (1.0 + depreciation_rate) - 1.0
}

pub fn project_freedom(inputs: &FreedomInputs) -> Result<FreedomResult, ProjectionError> {
    validate(inputs)?;

    let real_rate = real_rate(inputs.annual_return_rate, inputs.depreciation_rate);
    if !real_rate.is_finite() || real_rate <= 0.0 {
        return Err(ProjectionError::NonConvergent(format!(
            "real rate of return {real_rate:.6} must be > 0"
        )));
    }
    let target_balance = inputs.yearly_expenses / real_rate;

    let mut balance = inputs.balance;
    let mut years = 0u32;
    let mut balance_history = Vec::new();
    let mut age_history = Vec::new();

    while balance < target_balance {
        if years >= MAX_PROJECTION_YEARS {
            return Err(ProjectionError::NonConvergent(format!(
                "target balance {target_balance:.2} not reached within {MAX_PROJECTION_YEARS} years"
            )));
        }
        balance = balance * (1.0 + real_rate) + inputs.yearly_addition;
        years += 1;
        balance_history.push(balance);
        age_history.push(inputs.current_age + f64::from(years));
    }

    let payoff_year = inputs
        .current_year
        .checked_add(years as i32)
        .ok_or_else(|| ProjectionError::invalid("current year is out of range"))?;

    tracing::debug!(years, balance, target_balance, "freedom projection complete");

    Ok(FreedomResult {
        payoff_year,
        years,
        freedom_age: inputs.current_age + f64::from(years),
        final_balance: balance,
        real_rate,
        target_balance,
        balance_history,
        age_history,
    })
}

fn validate(inputs: &FreedomInputs) -> Result<(), ProjectionError> {
    if !inputs.balance.is_finite() {
        return Err(ProjectionError::invalid("balance must be a finite number"));
    }
    if !inputs.yearly_expenses.is_finite() || inputs.yearly_expenses <= 0.0 {
        return Err(ProjectionError::invalid("yearly expenses must be > 0"));
    }
    if !inputs.yearly_addition.is_finite() || inputs.yearly_addition < 0.0 {
        return Err(ProjectionError::invalid("yearly addition must be >= 0"));
    }
    if !inputs.current_age.is_finite() || inputs.current_age < 0.0 {
        return Err(ProjectionError::invalid("current age must be >= 0"));
    }
    for (name, rate) in [
        ("annual return rate", inputs.annual_return_rate),
        ("depreciation rate", inputs.depreciation_rate),
    ] {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(ProjectionError::invalid(format!("{name} must be > -100%")));
        }
    }
    Ok(())
}
