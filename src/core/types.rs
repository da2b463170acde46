use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult, ensure_non_negative};

pub const MAX_HORIZON_YEARS: u32 = 150;
pub const MAX_HORIZON_MONTHS: u32 = MAX_HORIZON_YEARS * 12;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "camelCase")]
pub enum StepUp {
    #[default]
    None,
    Percent(f64),
    Absolute(f64),
}

impl StepUp {
    /// Resolves the two-field upstream form. Percentage wins when both are set.
    pub fn from_legacy(step_up_percent: f64, step_up_per_year: f64) -> EngineResult<Self> {
        ensure_non_negative("stepUpPercent", step_up_percent)?;
        ensure_non_negative("stepUpPerYear", step_up_per_year)?;
        Ok(if step_up_percent > 0.0 {
            StepUp::Percent(step_up_percent)
        } else if step_up_per_year > 0.0 {
            StepUp::Absolute(step_up_per_year)
        } else {
            StepUp::None
        })
    }

    pub fn is_none(self) -> bool {
        match self {
            StepUp::None => true,
            StepUp::Percent(p) => p == 0.0,
            StepUp::Absolute(a) => a == 0.0,
        }
    }

    pub(crate) fn apply(self, contribution: f64) -> f64 {
        match self {
            StepUp::None => contribution,
            StepUp::Percent(p) => contribution * (1.0 + p / 100.0),
            StepUp::Absolute(a) => contribution + a,
        }
    }

    pub(crate) fn validate(self) -> EngineResult<()> {
        match self {
            StepUp::None => Ok(()),
            StepUp::Percent(p) => ensure_non_negative("stepUp.percent", p),
            StepUp::Absolute(a) => ensure_non_negative("stepUp.absolute", a),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Horizon {
    Years(f64),
    Months(u32),
}

impl Horizon {
    pub fn months(self) -> u32 {
        match self {
            Horizon::Years(years) => (years.max(0.0) * 12.0).round() as u32,
            Horizon::Months(months) => months,
        }
    }

    pub(crate) fn validate(self, context: &str) -> EngineResult<u32> {
        if let Horizon::Years(years) = self {
            if !years.is_finite() || years < 0.0 {
                return Err(EngineError::horizon(context, "years must be >= 0"));
            }
            if years > f64::from(MAX_HORIZON_YEARS) {
                return Err(horizon_too_long(context));
            }
        }
        let months = self.months();
        if months == 0 {
            return Err(EngineError::horizon(context, "duration must be > 0"));
        }
        if months > MAX_HORIZON_MONTHS {
            return Err(horizon_too_long(context));
        }
        Ok(months)
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::Months(0)
    }
}

fn horizon_too_long(context: &str) -> EngineError {
    EngineError::horizon(
        context,
        format!("duration exceeds {MAX_HORIZON_YEARS} years"),
    )
}

pub(crate) fn years_to_months(context: &str, years: u32) -> EngineResult<u32> {
    if years > MAX_HORIZON_YEARS {
        return Err(horizon_too_long(context));
    }
    Ok(years * 12)
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub solver_tolerance: f64,
    pub solver_max_iterations: u32,
    /// Withdrawal simulations stop here and report `HorizonCapped`.
    pub swp_max_months: u32,
    pub swp_monthly_snapshot_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver_tolerance: 100.0,
            solver_max_iterations: 100,
            swp_max_months: 600,
            swp_monthly_snapshot_months: 12,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.solver_tolerance.is_finite() || self.solver_tolerance <= 0.0 {
            return Err("solver tolerance must be > 0".to_string());
        }
        if self.solver_max_iterations == 0 {
            return Err("solver max iterations must be > 0".to_string());
        }
        if self.swp_max_months == 0 {
            return Err("swp max months must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPoint {
    pub year: u32,
    pub invested: f64,
    pub value: f64,
}

pub(crate) fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

pub(crate) fn annual_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_step_up_prefers_percentage() {
        assert_eq!(StepUp::from_legacy(10.0, 500.0), Ok(StepUp::Percent(10.0)));
        assert_eq!(StepUp::from_legacy(0.0, 500.0), Ok(StepUp::Absolute(500.0)));
        assert_eq!(StepUp::from_legacy(0.0, 0.0), Ok(StepUp::None));
    }

    #[test]
    fn negative_legacy_step_up_is_rejected() {
        assert!(matches!(
            StepUp::from_legacy(-10.0, 0.0),
            Err(EngineError::NegativeInput { ref field, .. }) if field == "stepUpPercent"
        ));
        assert!(matches!(
            StepUp::from_legacy(0.0, -500.0),
            Err(EngineError::NegativeInput { ref field, .. }) if field == "stepUpPerYear"
        ));
    }

    #[test]
    fn step_up_apply_matches_mode() {
        assert_eq!(StepUp::None.apply(1_000.0), 1_000.0);
        assert!((StepUp::Percent(10.0).apply(1_000.0) - 1_100.0).abs() < 1e-9);
        assert_eq!(StepUp::Absolute(250.0).apply(1_000.0), 1_250.0);
        assert!(StepUp::Percent(0.0).is_none());
        assert!(!StepUp::Absolute(1.0).is_none());
    }

    #[test]
    fn step_up_deserializes_from_tagged_json() {
        let pct: StepUp = serde_json::from_str(r#"{"mode":"percent","value":10}"#).expect("parse");
        assert_eq!(pct, StepUp::Percent(10.0));
        let none: StepUp = serde_json::from_str(r#"{"mode":"none"}"#).expect("parse");
        assert_eq!(none, StepUp::None);
    }

    #[test]
    fn horizon_converts_years_to_months() {
        assert_eq!(Horizon::Years(15.0).months(), 180);
        assert_eq!(Horizon::Years(2.5).months(), 30);
        assert_eq!(Horizon::Months(18).months(), 18);
        assert_eq!(Horizon::Months(18).validate("test"), Ok(18));
        assert!(Horizon::Months(0).validate("test").is_err());
        assert!(Horizon::Years(-1.0).validate("test").is_err());
    }

    #[test]
    fn horizons_past_the_cap_are_invalid() {
        assert!(matches!(
            Horizon::Years(1e12).validate("sip"),
            Err(EngineError::InvalidHorizon { .. })
        ));
        assert!(Horizon::Months(MAX_HORIZON_MONTHS + 1).validate("sip").is_err());
        assert_eq!(
            Horizon::Years(f64::from(MAX_HORIZON_YEARS)).validate("sip"),
            Ok(MAX_HORIZON_MONTHS)
        );
        assert!(years_to_months("retirement", u32::MAX).is_err());
        assert_eq!(years_to_months("retirement", 25), Ok(300));
    }

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        let bad = EngineConfig {
            solver_tolerance: 0.0,
            ..config
        };
        assert!(bad.validate().is_err());
    }
}
