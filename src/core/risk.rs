use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};

const MAX_BRACKET_POINTS: f64 = 20.0;
const TOLERANCE_WEIGHT: f64 = 4.0;
const SECONDARY_WEIGHT: f64 = 3.0;
const DEPENDENT_PENALTY: f64 = 2.0;
const MAX_PENALISED_DEPENDENTS: u32 = 3;

pub const MAX_RAW_SCORE: f64 =
    MAX_BRACKET_POINTS * 2.0 + 5.0 * TOLERANCE_WEIGHT + 5.0 * SECONDARY_WEIGHT * 2.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnswers {
    pub age: u32,
    pub horizon_years: u32,
    pub risk_tolerance: u8,
    #[serde(default)]
    pub income_stability: Option<u8>,
    #[serde(default)]
    pub investment_experience: Option<u8>,
    #[serde(default)]
    pub dependents: Option<u32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskProfile {
    Conservative,
    ModeratelyConservative,
    Moderate,
    ModeratelyAggressive,
    Aggressive,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocation {
    pub equity: f64,
    pub debt: f64,
    pub gold: f64,
}

impl RiskProfile {
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            RiskProfile::Conservative
        } else if score < 40.0 {
            RiskProfile::ModeratelyConservative
        } else if score < 60.0 {
            RiskProfile::Moderate
        } else if score < 80.0 {
            RiskProfile::ModeratelyAggressive
        } else {
            RiskProfile::Aggressive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::ModeratelyConservative => "Moderately Conservative",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::ModeratelyAggressive => "Moderately Aggressive",
            RiskProfile::Aggressive => "Aggressive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RiskProfile::Conservative => {
                "Capital preservation first; accepts low returns to avoid drawdowns."
            }
            RiskProfile::ModeratelyConservative => {
                "Mostly fixed income with a small equity sleeve for inflation protection."
            }
            RiskProfile::Moderate => "Balanced growth and stability over a medium horizon.",
            RiskProfile::ModeratelyAggressive => {
                "Growth oriented; tolerates interim volatility for higher long-term returns."
            }
            RiskProfile::Aggressive => {
                "Maximum long-term growth; comfortable with large short-term swings."
            }
        }
    }

    pub fn allocation(self) -> AssetAllocation {
        let (equity, debt, gold) = match self {
            RiskProfile::Conservative => (10.0, 80.0, 10.0),
            RiskProfile::ModeratelyConservative => (25.0, 65.0, 10.0),
            RiskProfile::Moderate => (45.0, 45.0, 10.0),
            RiskProfile::ModeratelyAggressive => (65.0, 27.0, 8.0),
            RiskProfile::Aggressive => (80.0, 15.0, 5.0),
        };
        AssetAllocation { equity, debt, gold }
    }

    pub fn products(self) -> &'static [&'static str] {
        match self {
            RiskProfile::Conservative => &[
                "Fixed deposits",
                "Liquid funds",
                "Government securities",
                "Sovereign gold bonds",
            ],
            RiskProfile::ModeratelyConservative => &[
                "Short duration debt funds",
                "Conservative hybrid funds",
                "Corporate bond funds",
                "Gold ETFs",
            ],
            RiskProfile::Moderate => &[
                "Balanced advantage funds",
                "Large cap index funds",
                "Corporate bond funds",
                "Gold ETFs",
            ],
            RiskProfile::ModeratelyAggressive => &[
                "Flexi cap funds",
                "Large and mid cap funds",
                "Aggressive hybrid funds",
                "Dynamic bond funds",
            ],
            RiskProfile::Aggressive => &[
                "Mid cap funds",
                "Small cap funds",
                "Sectoral and thematic funds",
                "International equity funds",
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfileResult {
    pub raw_score: f64,
    pub max_score: f64,
    pub score: f64,
    pub profile: RiskProfile,
    pub label: &'static str,
    pub description: &'static str,
    pub allocation: AssetAllocation,
    pub products: Vec<&'static str>,
}

pub fn profile_risk(answers: &RiskAnswers) -> EngineResult<RiskProfileResult> {
    let tolerance = scale("riskTolerance", answers.risk_tolerance)?;
    let stability = answers
        .income_stability
        .map(|v| scale("incomeStability", v))
        .transpose()?
        .unwrap_or(0.0);
    let experience = answers
        .investment_experience
        .map(|v| scale("investmentExperience", v))
        .transpose()?
        .unwrap_or(0.0);
    let dependents = answers
        .dependents
        .unwrap_or(0)
        .min(MAX_PENALISED_DEPENDENTS);

    let raw_score = age_points(answers.age)
        + horizon_points(answers.horizon_years)
        + tolerance * TOLERANCE_WEIGHT
        + stability * SECONDARY_WEIGHT
        + experience * SECONDARY_WEIGHT
        - dependents as f64 * DEPENDENT_PENALTY;
    let score = (raw_score / MAX_RAW_SCORE * 100.0).clamp(0.0, 100.0);
    let profile = RiskProfile::from_score(score);

    Ok(RiskProfileResult {
        raw_score,
        max_score: MAX_RAW_SCORE,
        score,
        profile,
        label: profile.label(),
        description: profile.description(),
        allocation: profile.allocation(),
        products: profile.products().to_vec(),
    })
}

fn scale(field: &str, value: u8) -> EngineResult<f64> {
    if !(1..=5).contains(&value) {
        return Err(EngineError::OutOfRange {
            field: field.to_string(),
            value: value as f64,
            min: 1.0,
            max: 5.0,
        });
    }
    Ok(value as f64)
}

fn age_points(age: u32) -> f64 {
    match age {
        0..=29 => 20.0,
        30..=39 => 16.0,
        40..=49 => 12.0,
        50..=59 => 8.0,
        _ => 4.0,
    }
}

fn horizon_points(years: u32) -> f64 {
    match years {
        0..=2 => 4.0,
        3..=4 => 8.0,
        5..=9 => 12.0,
        10..=14 => 16.0,
        _ => 20.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    fn answers(age: u32, horizon: u32, tolerance: u8) -> RiskAnswers {
        RiskAnswers {
            age,
            horizon_years: horizon,
            risk_tolerance: tolerance,
            income_stability: None,
            investment_experience: None,
            dependents: None,
        }
    }

    #[test]
    fn max_raw_score_is_ninety() {
        assert_eq!(MAX_RAW_SCORE, 90.0);
    }

    #[test]
    fn oracle_young_long_horizon_investor_is_aggressive() {
        let result = profile_risk(&RiskAnswers {
            age: 25,
            horizon_years: 20,
            risk_tolerance: 5,
            income_stability: Some(5),
            investment_experience: Some(5),
            dependents: Some(0),
        })
        .expect("valid");
        assert_eq!(result.raw_score, 90.0);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.profile, RiskProfile::Aggressive);
        assert_eq!(result.allocation.equity, 80.0);
    }

    #[test]
    fn oracle_retiree_with_short_horizon_is_conservative() {
        let mut input = answers(65, 1, 1);
        input.dependents = Some(2);
        let result = profile_risk(&input).expect("valid");
        // 4 + 4 + 4 - 4 = 8 -> 8.89
        assert_eq!(result.raw_score, 8.0);
        assert!((result.score - 8.0 / 90.0 * 100.0).abs() < 1e-9);
        assert_eq!(result.profile, RiskProfile::Conservative);
        assert_eq!(result.label, "Conservative");
    }

    #[test]
    fn dependents_penalty_is_capped() {
        let mut three = answers(35, 10, 3);
        three.dependents = Some(3);
        let mut ten = answers(35, 10, 3);
        ten.dependents = Some(10);
        let a = profile_risk(&three).expect("valid");
        let b = profile_risk(&ten).expect("valid");
        assert_eq!(a.raw_score, b.raw_score);
    }

    #[test]
    fn band_thresholds_are_lower_inclusive() {
        assert_eq!(RiskProfile::from_score(19.999), RiskProfile::Conservative);
        assert_eq!(RiskProfile::from_score(20.0), RiskProfile::ModeratelyConservative);
        assert_eq!(RiskProfile::from_score(40.0), RiskProfile::Moderate);
        assert_eq!(RiskProfile::from_score(60.0), RiskProfile::ModeratelyAggressive);
        assert_eq!(RiskProfile::from_score(80.0), RiskProfile::Aggressive);
    }

    #[test]
    fn allocations_sum_to_one_hundred() {
        for profile in [
            RiskProfile::Conservative,
            RiskProfile::ModeratelyConservative,
            RiskProfile::Moderate,
            RiskProfile::ModeratelyAggressive,
            RiskProfile::Aggressive,
        ] {
            let a = profile.allocation();
            assert_eq!(a.equity + a.debt + a.gold, 100.0);
            assert!(!profile.products().is_empty());
        }
    }

    #[test]
    fn out_of_range_scale_is_rejected() {
        assert!(matches!(
            profile_risk(&answers(30, 10, 0)),
            Err(EngineError::OutOfRange { .. })
        ));
        let mut input = answers(30, 10, 3);
        input.investment_experience = Some(6);
        assert!(profile_risk(&input).is_err());
    }

    #[test]
    fn profile_serializes_camel_case() {
        let result = profile_risk(&answers(45, 4, 3)).expect("valid");
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"profile\":\"moderatelyConservative\""));
        assert!(json.contains("\"maxScore\""));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_scoring_is_deterministic_and_bounded(
            age in 18u32..90,
            horizon in 0u32..40,
            tolerance in 1u8..=5,
            stability in proptest::option::of(1u8..=5),
            experience in proptest::option::of(1u8..=5),
            dependents in proptest::option::of(any::<u32>())
        ) {
            let input = RiskAnswers {
                age,
                horizon_years: horizon,
                risk_tolerance: tolerance,
                income_stability: stability,
                investment_experience: experience,
                dependents,
            };
            let first = profile_risk(&input).expect("valid");
            let second = profile_risk(&input.clone()).expect("valid");
            prop_assert_eq!(first.score, second.score);
            prop_assert_eq!(first.profile, second.profile);
            prop_assert_eq!(first.allocation, second.allocation);
            prop_assert!((0.0..=100.0).contains(&first.score));
        }
    }
}
