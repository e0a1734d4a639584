use super::error::{ProjectionError, ValidationError};
use super::types::{MAX_AGE, ProjectionInput, YearRecord};

#[derive(Debug, Clone, Copy)]
struct Ledger {
    age: u32,
    balance: f64,
    total_invested: f64,
}

impl Ledger {
    fn ensure_finite(&self) -> Result<(), ProjectionError> {
        if self.balance.is_finite() {
            Ok(())
        } else {
            Err(ProjectionError::Overflow { age: self.age })
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rates {
    interest: f64,
    inflation: f64,
    contribution_growth: f64,
}

impl Rates {
    fn from_input(input: &ProjectionInput) -> Self {
        Self {
            interest: input.interest_rate / 100.0,
            inflation: input.inflation_rate / 100.0,
            contribution_growth: input.contribution_growth_rate / 100.0,
        }
    }
}

/// Projects the account year by year: contributions until `retirement_age`,
/// then withdrawals until the balance is exhausted or `MAX_AGE` is reached.
///
/// Ages are validated before anything is simulated, so an error never comes
/// with partial output.
pub fn project(input: &ProjectionInput) -> Result<Vec<YearRecord>, ProjectionError> {
    let (current_age, retirement_age) = validate_ages(input)?;
    let rates = Rates::from_input(input);

    let mut ledger = Ledger {
        age: current_age,
        balance: input.initial_amount,
        total_invested: input.initial_amount,
    };
    let mut records = Vec::with_capacity((MAX_AGE - current_age) as usize + 1);

    run_accumulation_phase(input, rates, retirement_age, &mut ledger, &mut records)?;
    run_decumulation_phase(input, rates, &mut ledger, &mut records)?;

    Ok(records)
}

fn validate_ages(input: &ProjectionInput) -> Result<(u32, u32), ValidationError> {
    let current_age = checked_age("currentAge", input.current_age)?;
    let retirement_age = checked_age("retirementAge", input.retirement_age)?;
    if retirement_age <= current_age {
        return Err(ValidationError::RetirementNotAfterCurrent {
            current_age: input.current_age,
            retirement_age: input.retirement_age,
        });
    }
    Ok((current_age, retirement_age))
}

fn checked_age(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    if value <= 0 || value > i64::from(MAX_AGE) {
        return Err(ValidationError::AgeOutOfRange { field, value });
    }
    Ok(value as u32)
}

fn run_accumulation_phase(
    input: &ProjectionInput,
    rates: Rates,
    retirement_age: u32,
    ledger: &mut Ledger,
    records: &mut Vec<YearRecord>,
) -> Result<(), ProjectionError> {
    let mut monthly_contribution = input.monthly_contribution;

    while ledger.age < retirement_age && ledger.age < MAX_AGE {
        let yearly_contribution = monthly_contribution * 12.0;
        ledger.balance *= 1.0 + rates.interest;
        ledger.balance += yearly_contribution;
        // Contributions arrive through the year, so on average they earn half a year of interest.
        ledger.balance += monthly_contribution * 6.0 * rates.interest;
        ledger.balance *= 1.0 - rates.inflation;
        ledger.total_invested += yearly_contribution;
        monthly_contribution *= 1.0 + rates.contribution_growth;

        ledger.age += 1;
        records.push(YearRecord::year(
            ledger.age,
            ledger.total_invested,
            ledger.balance,
            0.0,
            &input.currency,
        ));
        ledger.ensure_finite()?;
    }

    Ok(())
}

fn run_decumulation_phase(
    input: &ProjectionInput,
    rates: Rates,
    ledger: &mut Ledger,
    records: &mut Vec<YearRecord>,
) -> Result<(), ProjectionError> {
    // Nothing is drawn down, the balance would only compound until the age ceiling.
    if input.monthly_withdrawal.is_nan() || input.monthly_withdrawal <= 0.0 {
        return Ok(());
    }

    let yearly_withdrawal = input.monthly_withdrawal * 12.0;

    while ledger.balance > 0.0 && ledger.age < MAX_AGE {
        let actual_withdrawal = yearly_withdrawal.min(ledger.balance);
        ledger.balance -= actual_withdrawal;

        if ledger.balance > 0.0 {
            ledger.balance *= 1.0 + rates.interest;
            ledger.balance += actual_withdrawal / 12.0 * 6.0 * rates.interest;
            ledger.balance *= 1.0 - rates.inflation;
        }

        ledger.age += 1;
        ledger.ensure_finite()?;
        ledger.balance = ledger.balance.max(0.0);
        records.push(YearRecord::year(
            ledger.age,
            ledger.total_invested,
            ledger.balance,
            actual_withdrawal,
            &input.currency,
        ));
    }

    if ledger.balance > 0.0 && ledger.age >= MAX_AGE {
        records.push(YearRecord::max_age_advisory(&input.currency));
    }

    Ok(())
}
