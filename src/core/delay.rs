use serde::{Deserialize, Serialize};

use super::annuity::{projected_value, required_contribution};
use super::error::{EngineError, EngineResult, ensure_all_non_negative};
use super::types::{StepUp, years_to_months};

pub const STANDARD_DELAYS: [u32; 6] = [6, 12, 24, 36, 48, 60];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipDelayInputs {
    pub monthly_sip: f64,
    pub full_period_years: u32,
    pub delay_months: u32,
    pub annual_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipDelayResult {
    pub delay_months: u32,
    pub invested_months: u32,
    pub fv_on_time: f64,
    pub fv_delayed: f64,
    pub cost_of_delay: f64,
    pub catch_up_monthly: f64,
    pub extra_monthly: f64,
}

pub fn analyze_delay(inputs: &SipDelayInputs) -> EngineResult<SipDelayResult> {
    ensure_all_non_negative(&[
        ("monthlySip", inputs.monthly_sip),
        ("annualReturn", inputs.annual_return),
    ])?;
    let full_months = years_to_months("sip delay", inputs.full_period_years)?;
    if full_months == 0 {
        return Err(EngineError::horizon("sip delay", "full period must be > 0 years"));
    }
    if inputs.delay_months >= full_months {
        return Err(EngineError::horizon(
            "sip delay",
            format!(
                "delay of {} months leaves no investing period out of {full_months}",
                inputs.delay_months
            ),
        ));
    }

    Ok(delay_row(
        inputs.monthly_sip,
        inputs.annual_return,
        full_months,
        inputs.delay_months,
    ))
}

fn delay_row(
    monthly_sip: f64,
    annual_return: f64,
    full_months: u32,
    delay_months: u32,
) -> SipDelayResult {
    let invested_months = full_months - delay_months;
    let fv_on_time = projected_value(monthly_sip, annual_return, full_months, StepUp::None);
    let fv_delayed = projected_value(monthly_sip, annual_return, invested_months, StepUp::None);
    let catch_up_monthly = required_contribution(fv_on_time, annual_return, invested_months);

    SipDelayResult {
        delay_months,
        invested_months,
        fv_on_time,
        fv_delayed,
        cost_of_delay: fv_on_time - fv_delayed,
        catch_up_monthly,
        extra_monthly: (catch_up_monthly - monthly_sip).max(0.0),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayScenariosInputs {
    pub monthly_sip: f64,
    pub full_period_years: u32,
    pub annual_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayScenarioRow {
    pub delay_months: u32,
    pub feasible: bool,
    pub result: Option<SipDelayResult>,
}

// Delays that consume the whole period become infeasible rows.
pub fn delay_scenarios(inputs: &DelayScenariosInputs) -> EngineResult<Vec<DelayScenarioRow>> {
    ensure_all_non_negative(&[
        ("monthlySip", inputs.monthly_sip),
        ("annualReturn", inputs.annual_return),
    ])?;
    let full_months = years_to_months("sip delay", inputs.full_period_years)?;
    if full_months == 0 {
        return Err(EngineError::horizon("sip delay", "full period must be > 0 years"));
    }

    Ok(STANDARD_DELAYS
        .iter()
        .map(|&delay_months| {
            let result = (delay_months < full_months).then(|| {
                delay_row(
                    inputs.monthly_sip,
                    inputs.annual_return,
                    full_months,
                    delay_months,
                )
            });
            DelayScenarioRow {
                delay_months,
                feasible: result.is_some(),
                result,
            }
        })
        .collect())
}
