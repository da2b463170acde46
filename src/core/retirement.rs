use serde::{Deserialize, Serialize};

use super::annuity::{
    future_value_of_contributions, lumpsum_fv, lumpsum_pv, present_value_growing_annuity,
};
use super::error::{EngineError, EngineResult, ensure_all_non_negative};
use super::solver::{StepUpSolution, required_monthly_saving};
use super::types::{EngineConfig, StepUp, monthly_rate, years_to_months};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementInputs {
    pub present_age: u32,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub monthly_expense: f64,
    pub pre_retirement_inflation: f64,
    pub post_retirement_inflation: f64,
    pub pre_retirement_return: f64,
    pub existing_asset_return: f64,
    pub post_retirement_return: f64,
    #[serde(default)]
    pub existing_corpus: f64,
    #[serde(default)]
    pub step_up: StepUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationPoint {
    pub age: u32,
    pub invested: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementResult {
    pub years_to_retire: u32,
    pub years_in_retirement: u32,
    pub inflated_monthly_expense: f64,
    pub corpus_needed: f64,
    pub fv_existing_assets: f64,
    pub shortfall: f64,
    pub monthly_required: f64,
    pub yearly_required: f64,
    pub lumpsum_today: f64,
    /// Set when retirement is today and any shortfall is due immediately.
    pub contribution_window_closed: bool,
    pub solver: Option<StepUpSolution>,
    pub accumulation: Vec<AccumulationPoint>,
}

pub fn plan_retirement(
    inputs: &RetirementInputs,
    config: &EngineConfig,
) -> EngineResult<RetirementResult> {
    validate(inputs)?;

    let years_to_retire = inputs.retirement_age - inputs.present_age;
    let years_in_retirement = inputs.life_expectancy - inputs.retirement_age;
    let months_to_retire = years_to_months("retirement", years_to_retire)?;
    let months_in_retirement = years_to_months("retirement", years_in_retirement)?;

    let inflated_monthly_expense = lumpsum_fv(
        inputs.monthly_expense,
        inputs.pre_retirement_inflation,
        years_to_retire as f64,
    );
    let corpus_needed = present_value_growing_annuity(
        inflated_monthly_expense,
        monthly_rate(inputs.post_retirement_return),
        monthly_rate(inputs.post_retirement_inflation),
        months_in_retirement,
    );
    let fv_existing_assets = lumpsum_fv(
        inputs.existing_corpus,
        inputs.existing_asset_return,
        years_to_retire as f64,
    );
    let shortfall = (corpus_needed - fv_existing_assets).max(0.0);

    let mut result = RetirementResult {
        years_to_retire,
        years_in_retirement,
        inflated_monthly_expense,
        corpus_needed,
        fv_existing_assets,
        shortfall,
        monthly_required: 0.0,
        yearly_required: 0.0,
        lumpsum_today: 0.0,
        contribution_window_closed: false,
        solver: None,
        accumulation: Vec::new(),
    };

    if shortfall <= 0.0 {
        return Ok(result);
    }

    if years_to_retire == 0 {
        tracing::debug!(shortfall, "retirement is immediate; shortfall due as lumpsum");
        result.lumpsum_today = shortfall;
        result.contribution_window_closed = true;
        return Ok(result);
    }

    let (monthly_required, solver) = required_monthly_saving(
        shortfall,
        inputs.pre_retirement_return,
        months_to_retire,
        inputs.step_up,
        config,
    )?;
    result.solver = solver;

    let projection = future_value_of_contributions(
        monthly_required,
        inputs.pre_retirement_return,
        months_to_retire,
        inputs.step_up,
    );
    result.accumulation = projection
        .yearly_points()
        .into_iter()
        .map(|point| AccumulationPoint {
            age: inputs.present_age + point.year,
            invested: point.invested,
            value: point.value,
        })
        .collect();

    result.monthly_required = monthly_required;
    result.yearly_required = monthly_required * 12.0;
    result.lumpsum_today = lumpsum_pv(
        shortfall,
        inputs.pre_retirement_return,
        years_to_retire as f64,
    );
    Ok(result)
}

fn validate(inputs: &RetirementInputs) -> EngineResult<()> {
    if inputs.retirement_age < inputs.present_age {
        return Err(EngineError::horizon(
            "retirement",
            "retirement age must be >= present age",
        ));
    }
    if inputs.life_expectancy < inputs.retirement_age {
        return Err(EngineError::horizon(
            "retirement",
            "life expectancy must be >= retirement age",
        ));
    }
    years_to_months("retirement", inputs.life_expectancy - inputs.present_age)?;
    ensure_all_non_negative(&[
        ("monthlyExpense", inputs.monthly_expense),
        ("preRetirementInflation", inputs.pre_retirement_inflation),
        ("postRetirementInflation", inputs.post_retirement_inflation),
        ("preRetirementReturn", inputs.pre_retirement_return),
        ("existingAssetReturn", inputs.existing_asset_return),
        ("postRetirementReturn", inputs.post_retirement_return),
        ("existingCorpus", inputs.existing_corpus),
    ])?;
    inputs.step_up.validate()
}
