use serde::{Deserialize, Serialize};

use super::annuity::{future_value_of_contributions, lumpsum_fv, lumpsum_pv};
use super::error::{EngineError, EngineResult, ensure_all_non_negative, ensure_non_negative};
use super::solver::{StepUpSolution, required_monthly_saving};
use super::types::{EngineConfig, Horizon, StepUp, YearPoint, years_to_months};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub months: u32,
    pub future_cost: f64,
    pub fv_existing_savings: f64,
    pub shortfall: f64,
    pub monthly_required: f64,
    pub lumpsum_today: f64,
    pub solver: Option<StepUpSolution>,
    pub yearly: Vec<YearPoint>,
}

#[derive(Debug, Clone, Copy)]
struct GoalTerms {
    future_cost: f64,
    months: u32,
    expected_return: f64,
    existing_savings: f64,
    step_up: StepUp,
}

fn plan_goal(terms: GoalTerms, config: &EngineConfig) -> EngineResult<GoalPlan> {
    let years = terms.months as f64 / 12.0;
    let fv_existing_savings = lumpsum_fv(terms.existing_savings, terms.expected_return, years);
    let shortfall = (terms.future_cost - fv_existing_savings).max(0.0);

    let (monthly_required, solver) = if shortfall > 0.0 {
        required_monthly_saving(
            shortfall,
            terms.expected_return,
            terms.months,
            terms.step_up,
            config,
        )?
    } else {
        (0.0, None)
    };

    let yearly = future_value_of_contributions(
        monthly_required,
        terms.expected_return,
        terms.months,
        terms.step_up,
    )
    .yearly_points();

    Ok(GoalPlan {
        months: terms.months,
        future_cost: terms.future_cost,
        fv_existing_savings,
        shortfall,
        monthly_required,
        lumpsum_today: lumpsum_pv(shortfall, terms.expected_return, years),
        solver,
        yearly,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationInputs {
    pub annual_cost_today: f64,
    pub years_to_start: u32,
    pub course_duration_years: u32,
    pub inflation: f64,
    pub expected_return: f64,
    #[serde(default)]
    pub existing_savings: f64,
    #[serde(default)]
    pub step_up: StepUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseYearCost {
    pub course_year: u32,
    pub years_from_now: u32,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationResult {
    pub cost_breakdown: Vec<CourseYearCost>,
    #[serde(flatten)]
    pub plan: GoalPlan,
}

pub fn plan_education(
    inputs: &EducationInputs,
    config: &EngineConfig,
) -> EngineResult<EducationResult> {
    ensure_all_non_negative(&[
        ("annualCostToday", inputs.annual_cost_today),
        ("inflation", inputs.inflation),
        ("expectedReturn", inputs.expected_return),
        ("existingSavings", inputs.existing_savings),
    ])?;
    inputs.step_up.validate()?;
    if inputs.years_to_start == 0 {
        return Err(EngineError::horizon("education", "years to start must be > 0"));
    }
    if inputs.course_duration_years == 0 {
        return Err(EngineError::horizon(
            "education",
            "course duration must be > 0 years",
        ));
    }
    let months = years_to_months("education", inputs.years_to_start)?;
    years_to_months(
        "education",
        inputs
            .years_to_start
            .saturating_add(inputs.course_duration_years),
    )?;

    // Course year k is paid yearsToStart + k years from now.
    let cost_breakdown = (0..inputs.course_duration_years)
        .map(|k| {
            let years_from_now = inputs.years_to_start + k;
            CourseYearCost {
                course_year: k + 1,
                years_from_now,
                cost: lumpsum_fv(
                    inputs.annual_cost_today,
                    inputs.inflation,
                    years_from_now as f64,
                ),
            }
        })
        .collect::<Vec<_>>();
    let future_cost = cost_breakdown.iter().map(|year| year.cost).sum();

    let plan = plan_goal(
        GoalTerms {
            future_cost,
            months,
            expected_return: inputs.expected_return,
            existing_savings: inputs.existing_savings,
            step_up: inputs.step_up,
        },
        config,
    )?;

    Ok(EducationResult {
        cost_breakdown,
        plan,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationInputs {
    pub cost_today: f64,
    pub horizon: Horizon,
    pub inflation: f64,
    pub expected_return: f64,
    #[serde(default)]
    pub existing_savings: f64,
    #[serde(default)]
    pub step_up: StepUp,
}

pub fn plan_vacation(inputs: &VacationInputs, config: &EngineConfig) -> EngineResult<GoalPlan> {
    ensure_all_non_negative(&[
        ("costToday", inputs.cost_today),
        ("inflation", inputs.inflation),
        ("expectedReturn", inputs.expected_return),
        ("existingSavings", inputs.existing_savings),
    ])?;
    inputs.step_up.validate()?;
    let months = inputs.horizon.validate("vacation")?;

    plan_goal(
        GoalTerms {
            future_cost: lumpsum_fv(inputs.cost_today, inputs.inflation, months as f64 / 12.0),
            months,
            expected_return: inputs.expected_return,
            existing_savings: inputs.existing_savings,
            step_up: inputs.step_up,
        },
        config,
    )
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelItem {
    pub label: String,
    pub amount: f64,
    #[serde(default)]
    pub per_traveller: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelInputs {
    pub items: Vec<TravelItem>,
    #[serde(default = "default_travellers")]
    pub travellers: u32,
    #[serde(default)]
    pub contingency_pct: f64,
    pub horizon: Horizon,
    pub inflation: f64,
    pub expected_return: f64,
    #[serde(default)]
    pub existing_savings: f64,
    #[serde(default)]
    pub step_up: StepUp,
}

fn default_travellers() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelLine {
    pub label: String,
    pub amount_today: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelResult {
    pub lines: Vec<TravelLine>,
    pub subtotal: f64,
    pub contingency: f64,
    pub total_today: f64,
    #[serde(flatten)]
    pub plan: GoalPlan,
}

pub fn plan_travel(inputs: &TravelInputs, config: &EngineConfig) -> EngineResult<TravelResult> {
    ensure_all_non_negative(&[
        ("contingencyPct", inputs.contingency_pct),
        ("inflation", inputs.inflation),
        ("expectedReturn", inputs.expected_return),
        ("existingSavings", inputs.existing_savings),
    ])?;
    for item in &inputs.items {
        ensure_non_negative(&item.label, item.amount)?;
    }
    if inputs.travellers == 0 {
        return Err(EngineError::OutOfRange {
            field: "travellers".to_string(),
            value: 0.0,
            min: 1.0,
            max: f64::from(u32::MAX),
        });
    }
    inputs.step_up.validate()?;
    let months = inputs.horizon.validate("travel")?;

    let lines = inputs
        .items
        .iter()
        .map(|item| TravelLine {
            label: item.label.clone(),
            amount_today: if item.per_traveller {
                item.amount * inputs.travellers as f64
            } else {
                item.amount
            },
        })
        .collect::<Vec<_>>();
    let subtotal: f64 = lines.iter().map(|line| line.amount_today).sum();
    let contingency = subtotal * inputs.contingency_pct / 100.0;
    let total_today = subtotal + contingency;

    let plan = plan_goal(
        GoalTerms {
            future_cost: lumpsum_fv(total_today, inputs.inflation, months as f64 / 12.0),
            months,
            expected_return: inputs.expected_return,
            existing_savings: inputs.existing_savings,
            step_up: inputs.step_up,
        },
        config,
    )?;

    Ok(TravelResult {
        lines,
        subtotal,
        contingency,
        total_today,
        plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annuity::projected_value;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn education(duration: u32) -> EducationInputs {
        EducationInputs {
            annual_cost_today: 500_000.0,
            years_to_start: 10,
            course_duration_years: duration,
            inflation: 8.0,
            expected_return: 12.0,
            existing_savings: 200_000.0,
            step_up: StepUp::None,
        }
    }

    #[test]
    fn oracle_education_sums_each_inflated_course_year() {
        let result = plan_education(&education(4), &EngineConfig::default()).expect("valid");
        let expected = (10..14)
            .map(|n| 500_000.0 * 1.08f64.powf(n as f64))
            .sum::<f64>();
        assert_eq!(result.cost_breakdown.len(), 4);
        assert_eq!(result.cost_breakdown[3].years_from_now, 13);
        assert_approx_tol(result.plan.future_cost, expected, 1e-4);
        assert_approx_tol(
            result.plan.fv_existing_savings,
            200_000.0 * 1.12f64.powf(10.0),
            1e-6,
        );
        let fv = projected_value(result.plan.monthly_required, 12.0, 120, StepUp::None);
        assert_approx_tol(fv, result.plan.shortfall, 1.0);
    }

    #[test]
    fn longer_course_costs_strictly_more() {
        let config = EngineConfig::default();
        let one = plan_education(&education(1), &config).expect("valid");
        let two = plan_education(&education(2), &config).expect("valid");
        let five = plan_education(&education(5), &config).expect("valid");
        assert!(two.plan.future_cost > one.plan.future_cost);
        assert!(five.plan.future_cost > two.plan.future_cost);
        assert!(five.plan.monthly_required > one.plan.monthly_required);
    }

    #[test]
    fn education_rejects_zero_horizons() {
        let config = EngineConfig::default();
        let mut inputs = education(0);
        assert!(matches!(
            plan_education(&inputs, &config),
            Err(EngineError::InvalidHorizon { .. })
        ));
        inputs.course_duration_years = 3;
        inputs.years_to_start = 0;
        assert!(matches!(
            plan_education(&inputs, &config),
            Err(EngineError::InvalidHorizon { .. })
        ));
    }

    #[test]
    fn goals_reject_spans_past_the_horizon_cap() {
        let config = EngineConfig::default();
        let mut inputs = education(4);
        inputs.years_to_start = u32::MAX;
        assert!(matches!(
            plan_education(&inputs, &config),
            Err(EngineError::InvalidHorizon { .. })
        ));
        let mut inputs = education(u32::MAX);
        inputs.years_to_start = 10;
        assert!(plan_education(&inputs, &config).is_err());

        let vacation = VacationInputs {
            cost_today: 100_000.0,
            horizon: Horizon::Years(1e9),
            inflation: 5.0,
            expected_return: 8.0,
            existing_savings: 0.0,
            step_up: StepUp::None,
        };
        assert!(matches!(
            plan_vacation(&vacation, &config),
            Err(EngineError::InvalidHorizon { .. })
        ));

        let travel = TravelInputs {
            items: Vec::new(),
            travellers: 1,
            contingency_pct: 0.0,
            horizon: Horizon::Months(u32::MAX),
            inflation: 0.0,
            expected_return: 6.0,
            existing_savings: 0.0,
            step_up: StepUp::None,
        };
        assert!(matches!(
            plan_travel(&travel, &config),
            Err(EngineError::InvalidHorizon { .. })
        ));
    }

    #[test]
    fn education_with_step_up_reports_solver() {
        let mut inputs = education(4);
        inputs.step_up = StepUp::Percent(10.0);
        let result = plan_education(&inputs, &EngineConfig::default()).expect("valid");
        let solver = result.plan.solver.expect("solver expected");
        assert!(solver.converged);
        assert!(solver.achieved_value >= result.plan.shortfall);
    }

    #[test]
    fn vacation_inflates_single_cost_over_months() {
        let inputs = VacationInputs {
            cost_today: 300_000.0,
            horizon: Horizon::Months(18),
            inflation: 6.0,
            expected_return: 7.0,
            existing_savings: 0.0,
            step_up: StepUp::None,
        };
        let plan = plan_vacation(&inputs, &EngineConfig::default()).expect("valid");
        assert_eq!(plan.months, 18);
        assert_approx_tol(plan.future_cost, 300_000.0 * 1.06f64.powf(1.5), 1e-6);
        assert_approx_tol(plan.shortfall, plan.future_cost, 1e-9);
        assert_approx_tol(
            plan.lumpsum_today,
            plan.future_cost / 1.07f64.powf(1.5),
            1e-6,
        );
        assert_eq!(plan.yearly.len(), 2);
    }

    #[test]
    fn savings_covering_goal_need_nothing_more() {
        let inputs = VacationInputs {
            cost_today: 100_000.0,
            horizon: Horizon::Years(2.0),
            inflation: 5.0,
            expected_return: 8.0,
            existing_savings: 150_000.0,
            step_up: StepUp::None,
        };
        let plan = plan_vacation(&inputs, &EngineConfig::default()).expect("valid");
        assert_eq!(plan.shortfall, 0.0);
        assert_eq!(plan.monthly_required, 0.0);
        assert_eq!(plan.lumpsum_today, 0.0);
    }

    #[test]
    fn travel_aggregates_items_per_traveller() {
        let inputs = TravelInputs {
            items: vec![
                TravelItem {
                    label: "flights".to_string(),
                    amount: 40_000.0,
                    per_traveller: true,
                },
                TravelItem {
                    label: "hotel".to_string(),
                    amount: 60_000.0,
                    per_traveller: false,
                },
            ],
            travellers: 3,
            contingency_pct: 10.0,
            horizon: Horizon::Months(12),
            inflation: 0.0,
            expected_return: 6.0,
            existing_savings: 0.0,
            step_up: StepUp::None,
        };
        let result = plan_travel(&inputs, &EngineConfig::default()).expect("valid");
        assert_approx_tol(result.lines[0].amount_today, 120_000.0, 1e-9);
        assert_approx_tol(result.subtotal, 180_000.0, 1e-9);
        assert_approx_tol(result.contingency, 18_000.0, 1e-9);
        assert_approx_tol(result.total_today, 198_000.0, 1e-9);
        assert_approx_tol(result.plan.future_cost, 198_000.0, 1e-9);
        let fv = projected_value(result.plan.monthly_required, 6.0, 12, StepUp::None);
        assert_approx_tol(fv, 198_000.0, 1e-4);
    }

    #[test]
    fn travel_rejects_negative_item_and_zero_travellers() {
        let mut inputs = TravelInputs {
            items: vec![TravelItem {
                label: "visa".to_string(),
                amount: -5.0,
                per_traveller: false,
            }],
            travellers: 1,
            contingency_pct: 0.0,
            horizon: Horizon::Months(6),
            inflation: 0.0,
            expected_return: 0.0,
            existing_savings: 0.0,
            step_up: StepUp::None,
        };
        let err = plan_travel(&inputs, &EngineConfig::default()).expect_err("must reject");
        assert!(err.to_string().contains("visa"));

        inputs.items[0].amount = 5.0;
        inputs.travellers = 0;
        assert!(matches!(
            plan_travel(&inputs, &EngineConfig::default()),
            Err(EngineError::OutOfRange { .. })
        ));
    }
}
