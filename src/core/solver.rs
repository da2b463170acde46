use serde::Serialize;

use super::annuity::{projected_value, required_contribution};
use super::error::{EngineError, EngineResult, ensure_all_non_negative};
use super::types::{EngineConfig, StepUp};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUpSolution {
    pub contribution: f64,
    pub achieved_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub iterations: u32,
    pub converged: bool,
    pub message: &'static str,
}

fn solver_message(converged: bool) -> &'static str {
    if converged {
        "Solved required contribution."
    } else {
        "Reached max iterations before tolerance was met; returning best estimate."
    }
}

/// Bisects the initial monthly contribution over `[0, target_fv]` until the
/// bracket is narrower than `config.solver_tolerance` or the iteration cap is
/// hit. Relies on the projection being non-decreasing in the contribution.
pub fn solve_initial_contribution(
    target_fv: f64,
    annual_rate_pct: f64,
    months: u32,
    step_up: StepUp,
    config: &EngineConfig,
) -> EngineResult<StepUpSolution> {
    ensure_all_non_negative(&[("targetFv", target_fv), ("annualRate", annual_rate_pct)])?;
    step_up.validate()?;
    if months == 0 {
        return Err(EngineError::horizon(
            "step-up solver",
            "at least one contribution month is required",
        ));
    }

    if target_fv == 0.0 {
        return Ok(StepUpSolution {
            contribution: 0.0,
            achieved_value: 0.0,
            lower_bound: 0.0,
            upper_bound: 0.0,
            iterations: 0,
            converged: true,
            message: solver_message(true),
        });
    }

    let mut lo = 0.0;
    let mut hi = target_fv;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.solver_max_iterations {
        if hi - lo <= config.solver_tolerance {
            converged = true;
            break;
        }
        iterations += 1;
        let mid = (lo + hi) * 0.5;
        if projected_value(mid, annual_rate_pct, months, step_up) >= target_fv {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    if !converged && hi - lo <= config.solver_tolerance {
        converged = true;
    }

    let solution = StepUpSolution {
        contribution: hi,
        achieved_value: projected_value(hi, annual_rate_pct, months, step_up),
        lower_bound: lo,
        upper_bound: hi,
        iterations,
        converged,
        message: solver_message(converged),
    };

    if converged {
        tracing::debug!(
            target_fv,
            months,
            iterations,
            contribution = solution.contribution,
            "step-up solver converged"
        );
    } else {
        tracing::warn!(
            target_fv,
            months,
            iterations,
            bracket = hi - lo,
            "step-up solver hit its iteration cap"
        );
    }

    Ok(solution)
}

/// Monthly saving that grows to `target_fv`: closed form for a level
/// schedule, bisection when a step-up is configured.
pub fn required_monthly_saving(
    target_fv: f64,
    annual_rate_pct: f64,
    months: u32,
    step_up: StepUp,
    config: &EngineConfig,
) -> EngineResult<(f64, Option<StepUpSolution>)> {
    if step_up.is_none() {
        return Ok((required_contribution(target_fv, annual_rate_pct, months), None));
    }
    let solution =
        solve_initial_contribution(target_fv, annual_rate_pct, months, step_up, config)?;
    Ok((solution.contribution, Some(solution)))
}
