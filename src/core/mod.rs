mod annuity;
mod delay;
mod error;
mod goals;
mod retirement;
mod risk;
mod solver;
mod types;
mod withdrawal;

pub use annuity::{
    AmortizationYear, ContributionProjection, EmiInputs, EmiResult, LumpsumInputs, LumpsumResult,
    PeriodPoint, SipInputs, SipResult, emi, future_value_of_contributions, lumpsum_fv, lumpsum_pv,
    present_value_annuity, present_value_growing_annuity, required_contribution, run_emi,
    run_lumpsum, run_sip,
};
pub use delay::{
    DelayScenarioRow, DelayScenariosInputs, STANDARD_DELAYS, SipDelayInputs, SipDelayResult,
    analyze_delay, delay_scenarios,
};
pub use error::{EngineError, EngineResult};
pub use goals::{
    CourseYearCost, EducationInputs, EducationResult, GoalPlan, TravelInputs, TravelItem,
    TravelLine, TravelResult, VacationInputs, plan_education, plan_travel, plan_vacation,
};
pub use retirement::{AccumulationPoint, RetirementInputs, RetirementResult, plan_retirement};
pub use risk::{
    AssetAllocation, MAX_RAW_SCORE, RiskAnswers, RiskProfile, RiskProfileResult, profile_risk,
};
pub use solver::{StepUpSolution, required_monthly_saving, solve_initial_contribution};
pub use types::{EngineConfig, Horizon, MAX_HORIZON_MONTHS, MAX_HORIZON_YEARS, StepUp, YearPoint};
pub use withdrawal::{SwpInputs, SwpResult, SwpSnapshot, SwpStatus, simulate_withdrawals};
