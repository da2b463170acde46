use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult, ensure_all_non_negative};
use super::types::{
    Horizon, MAX_HORIZON_MONTHS, StepUp, YearPoint, annual_rate, monthly_rate, years_to_months,
};

const RATE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPoint {
    pub month: u32,
    pub contribution: f64,
    pub invested: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionProjection {
    pub future_value: f64,
    pub total_contributed: f64,
    pub trace: Vec<PeriodPoint>,
}

impl ContributionProjection {
    pub fn yearly_points(&self) -> Vec<YearPoint> {
        let last = self.trace.len();
        self.trace
            .iter()
            .enumerate()
            .filter(|(idx, point)| point.month % 12 == 0 || idx + 1 == last)
            .map(|(_, point)| YearPoint {
                year: point.month.div_ceil(12),
                invested: point.invested,
                value: point.balance,
            })
            .collect()
    }
}

// Step-ups land at zero-based months 12, 24, ...
fn stepped_contribution(current: f64, month: u32, step_up: StepUp) -> f64 {
    if month > 0 && month % 12 == 0 {
        step_up.apply(current)
    } else {
        current
    }
}

/// Month-by-month annuity-due accumulation; each contribution is invested
/// before that month's return is applied.
pub fn future_value_of_contributions(
    monthly: f64,
    annual_rate_pct: f64,
    months: u32,
    step_up: StepUp,
) -> ContributionProjection {
    let rate = monthly_rate(annual_rate_pct);
    let mut balance = 0.0;
    let mut invested = 0.0;
    let mut contribution = monthly;
    let mut trace = Vec::with_capacity(months.min(MAX_HORIZON_MONTHS) as usize);

    for month in 0..months {
        contribution = stepped_contribution(contribution, month, step_up);
        balance = (balance + contribution) * (1.0 + rate);
        invested += contribution;
        trace.push(PeriodPoint {
            month: month + 1,
            contribution,
            invested,
            balance,
        });
    }

    ContributionProjection {
        future_value: balance,
        total_contributed: invested,
        trace,
    }
}

pub(crate) fn projected_value(
    monthly: f64,
    annual_rate_pct: f64,
    months: u32,
    step_up: StepUp,
) -> f64 {
    let rate = monthly_rate(annual_rate_pct);
    let mut balance = 0.0;
    let mut contribution = monthly;
    for month in 0..months {
        contribution = stepped_contribution(contribution, month, step_up);
        balance = (balance + contribution) * (1.0 + rate);
    }
    balance
}

/// Level annuity-due contribution that grows to `target_fv`.
pub fn required_contribution(target_fv: f64, annual_rate_pct: f64, months: u32) -> f64 {
    if target_fv <= 0.0 {
        return 0.0;
    }
    if months == 0 {
        return target_fv;
    }
    let rate = monthly_rate(annual_rate_pct);
    let n = months as f64;
    if rate.abs() < RATE_EPSILON {
        return target_fv / n;
    }
    let factor = ((1.0 + rate).powf(n) - 1.0) / rate * (1.0 + rate);
    target_fv / factor
}

pub fn present_value_annuity(payment: f64, annual_rate_pct: f64, months: u32) -> f64 {
    let rate = monthly_rate(annual_rate_pct);
    let n = months as f64;
    if rate.abs() < RATE_EPSILON {
        return payment * n;
    }
    payment * (1.0 - (1.0 + rate).powf(-n)) / rate
}

// Rates are per period, as decimal fractions.
pub fn present_value_growing_annuity(
    payment: f64,
    discount_rate: f64,
    growth_rate: f64,
    periods: u32,
) -> f64 {
    let n = periods as f64;
    if (discount_rate - growth_rate).abs() < RATE_EPSILON {
        return payment * n;
    }
    let ratio = (1.0 + growth_rate) / (1.0 + discount_rate);
    payment * (1.0 - ratio.powf(n)) / (discount_rate - growth_rate)
}

pub fn lumpsum_fv(amount: f64, annual_rate_pct: f64, years: f64) -> f64 {
    amount * (1.0 + annual_rate(annual_rate_pct)).powf(years)
}

pub fn lumpsum_pv(amount: f64, annual_rate_pct: f64, years: f64) -> f64 {
    amount / (1.0 + annual_rate(annual_rate_pct)).powf(years)
}

pub fn emi(principal: f64, annual_rate_pct: f64, months: u32) -> f64 {
    if months == 0 {
        return principal;
    }
    let rate = monthly_rate(annual_rate_pct);
    let n = months as f64;
    if rate.abs() < RATE_EPSILON {
        return principal / n;
    }
    let growth = (1.0 + rate).powf(n);
    principal * rate * growth / (growth - 1.0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipInputs {
    pub monthly_investment: f64,
    pub annual_return: f64,
    pub horizon: Horizon,
    #[serde(default)]
    pub step_up: StepUp,
    #[serde(default)]
    pub initial_lumpsum: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipResult {
    pub months: u32,
    pub future_value: f64,
    pub total_invested: f64,
    pub estimated_gains: f64,
    pub sip_future_value: f64,
    pub lumpsum_future_value: f64,
    pub final_monthly_contribution: f64,
    pub yearly: Vec<YearPoint>,
}

pub fn run_sip(inputs: &SipInputs) -> EngineResult<SipResult> {
    ensure_all_non_negative(&[
        ("monthlyInvestment", inputs.monthly_investment),
        ("annualReturn", inputs.annual_return),
        ("initialLumpsum", inputs.initial_lumpsum),
    ])?;
    inputs.step_up.validate()?;
    let months = inputs.horizon.validate("sip")?;

    let projection = future_value_of_contributions(
        inputs.monthly_investment,
        inputs.annual_return,
        months,
        inputs.step_up,
    );
    let rate = monthly_rate(inputs.annual_return);
    let lumpsum_at = |month: u32| inputs.initial_lumpsum * (1.0 + rate).powf(month as f64);

    let yearly = projection
        .yearly_points()
        .into_iter()
        .map(|point| {
            let month = (point.year * 12).min(months);
            YearPoint {
                invested: point.invested + inputs.initial_lumpsum,
                value: point.value + lumpsum_at(month),
                ..point
            }
        })
        .collect();

    let lumpsum_future_value = lumpsum_at(months);
    let future_value = projection.future_value + lumpsum_future_value;
    let total_invested = projection.total_contributed + inputs.initial_lumpsum;
    let final_monthly_contribution = projection
        .trace
        .last()
        .map(|point| point.contribution)
        .unwrap_or(inputs.monthly_investment);

    Ok(SipResult {
        months,
        future_value,
        total_invested,
        estimated_gains: future_value - total_invested,
        sip_future_value: projection.future_value,
        lumpsum_future_value,
        final_monthly_contribution,
        yearly,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpsumInputs {
    pub amount: f64,
    pub annual_return: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpsumResult {
    pub future_value: f64,
    pub estimated_gains: f64,
    pub yearly: Vec<YearPoint>,
}

pub fn run_lumpsum(inputs: &LumpsumInputs) -> EngineResult<LumpsumResult> {
    ensure_all_non_negative(&[
        ("amount", inputs.amount),
        ("annualReturn", inputs.annual_return),
    ])?;
    if inputs.years == 0 {
        return Err(EngineError::horizon("lumpsum", "years must be > 0"));
    }
    years_to_months("lumpsum", inputs.years)?;

    let yearly = (1..=inputs.years)
        .map(|year| YearPoint {
            year,
            invested: inputs.amount,
            value: lumpsum_fv(inputs.amount, inputs.annual_return, year as f64),
        })
        .collect::<Vec<_>>();
    let future_value = lumpsum_fv(inputs.amount, inputs.annual_return, inputs.years as f64);

    Ok(LumpsumResult {
        future_value,
        estimated_gains: future_value - inputs.amount,
        yearly,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiInputs {
    pub principal: f64,
    pub annual_rate: f64,
    pub tenure_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationYear {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiResult {
    pub emi: f64,
    pub total_interest: f64,
    pub total_payment: f64,
    pub schedule: Vec<AmortizationYear>,
}

pub fn run_emi(inputs: &EmiInputs) -> EngineResult<EmiResult> {
    ensure_all_non_negative(&[
        ("principal", inputs.principal),
        ("annualRate", inputs.annual_rate),
    ])?;
    if inputs.tenure_months == 0 {
        return Err(EngineError::horizon("emi", "tenure must be > 0 months"));
    }
    if inputs.tenure_months > MAX_HORIZON_MONTHS {
        return Err(EngineError::horizon(
            "emi",
            format!("tenure exceeds {MAX_HORIZON_MONTHS} months"),
        ));
    }

    let instalment = emi(inputs.principal, inputs.annual_rate, inputs.tenure_months);
    let rate = monthly_rate(inputs.annual_rate);
    let mut balance = inputs.principal;
    let mut schedule = Vec::new();
    let mut year = AmortizationYear {
        year: 1,
        principal_paid: 0.0,
        interest_paid: 0.0,
        closing_balance: balance,
    };

    for month in 1..=inputs.tenure_months {
        let interest = balance * rate;
        // Final instalment clears any floating-point residue.
        let principal_part = if month == inputs.tenure_months {
            balance
        } else {
            (instalment - interest).min(balance)
        };
        balance -= principal_part;
        year.principal_paid += principal_part;
        year.interest_paid += interest;
        year.closing_balance = balance.max(0.0);

        if month % 12 == 0 || month == inputs.tenure_months {
            schedule.push(year);
            year = AmortizationYear {
                year: year.year + 1,
                principal_paid: 0.0,
                interest_paid: 0.0,
                closing_balance: year.closing_balance,
            };
        }
    }

    let total_payment = instalment * inputs.tenure_months as f64;
    Ok(EmiResult {
        emi: instalment,
        total_interest: total_payment - inputs.principal,
        total_payment,
        schedule,
    })
}
