use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult, ensure_all_non_negative};
use super::types::{EngineConfig, annual_rate, monthly_rate};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SwpStatus {
    Active,
    Exhausted,
    // Month cap reached with money left.
    HorizonCapped,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpInputs {
    pub corpus: f64,
    pub monthly_withdrawal: f64,
    pub annual_return: f64,
    #[serde(default)]
    pub annual_inflation: f64,
    #[serde(default)]
    pub horizon_years: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpSnapshot {
    pub month: u32,
    pub corpus: f64,
    pub total_withdrawn: f64,
    pub monthly_withdrawal: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwpResult {
    pub status: SwpStatus,
    pub months_lasted: u32,
    pub years_lasted: f64,
    pub total_withdrawn: f64,
    pub final_corpus: f64,
    pub final_monthly_withdrawal: f64,
    pub snapshots: Vec<SwpSnapshot>,
}

#[derive(Debug)]
struct SwpState {
    corpus: f64,
    withdrawn: f64,
    months: u32,
    scheduled: f64,
}

impl SwpState {
    fn snapshot(&self) -> SwpSnapshot {
        SwpSnapshot {
            month: self.months,
            corpus: self.corpus,
            total_withdrawn: self.withdrawn,
            monthly_withdrawal: self.scheduled,
        }
    }
}

pub fn simulate_withdrawals(inputs: &SwpInputs, config: &EngineConfig) -> EngineResult<SwpResult> {
    ensure_all_non_negative(&[
        ("corpus", inputs.corpus),
        ("monthlyWithdrawal", inputs.monthly_withdrawal),
        ("annualReturn", inputs.annual_return),
        ("annualInflation", inputs.annual_inflation),
    ])?;
    let max_months = match inputs.horizon_years {
        Some(0) => {
            return Err(EngineError::horizon("swp", "horizon years must be > 0"));
        }
        Some(years) => (years.saturating_mul(12)).min(config.swp_max_months),
        None => config.swp_max_months,
    };

    let rate = monthly_rate(inputs.annual_return);
    let step = 1.0 + annual_rate(inputs.annual_inflation);
    let mut state = SwpState {
        corpus: inputs.corpus,
        withdrawn: 0.0,
        months: 0,
        scheduled: inputs.monthly_withdrawal,
    };
    let mut snapshots = Vec::new();
    let mut status = if state.corpus <= 0.0 {
        SwpStatus::Exhausted
    } else {
        SwpStatus::Active
    };

    while status == SwpStatus::Active {
        if state.months >= max_months {
            status = SwpStatus::HorizonCapped;
            break;
        }
        state.months += 1;
        state.corpus *= 1.0 + rate;
        let withdrawal = state.scheduled.min(state.corpus);
        state.corpus -= withdrawal;
        state.withdrawn += withdrawal;

        if state.corpus <= 0.0 {
            state.corpus = 0.0;
            status = SwpStatus::Exhausted;
        }

        if state.months <= config.swp_monthly_snapshot_months
            || state.months % 12 == 0
            || status == SwpStatus::Exhausted
        {
            snapshots.push(state.snapshot());
        }

        if state.months % 12 == 0 {
            state.scheduled *= step;
        }
    }

    tracing::debug!(
        ?status,
        months = state.months,
        total_withdrawn = state.withdrawn,
        "withdrawal simulation finished"
    );

    Ok(SwpResult {
        status,
        months_lasted: state.months,
        years_lasted: state.months as f64 / 12.0,
        total_withdrawn: state.withdrawn,
        final_corpus: state.corpus,
        final_monthly_withdrawal: state.scheduled,
        snapshots,
    })
}
