use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid horizon in {context}: {reason}")]
    InvalidHorizon { context: String, reason: String },

    #[error("Negative input: {field} = {value}")]
    NegativeInput { field: String, value: f64 },

    #[error("Out of range: {field} = {value} (expected {min}..={max})")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub(crate) fn horizon(context: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidHorizon {
            context: context.to_string(),
            reason: reason.into(),
        }
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: f64) -> EngineResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::NegativeInput {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

pub(crate) fn ensure_all_non_negative(values: &[(&str, f64)]) -> EngineResult<()> {
    for (field, value) in values {
        ensure_non_negative(field, *value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_nan_values_are_rejected() {
        assert!(ensure_non_negative("rate", 0.0).is_ok());
        assert!(ensure_non_negative("rate", 12.5).is_ok());

        let err = ensure_non_negative("monthlyExpense", -1.0).expect_err("must reject");
        assert_eq!(
            err,
            EngineError::NegativeInput {
                field: "monthlyExpense".to_string(),
                value: -1.0
            }
        );
        assert!(ensure_non_negative("rate", f64::NAN).is_err());
        assert!(ensure_non_negative("rate", f64::INFINITY).is_err());
    }

    #[test]
    fn first_failing_field_is_reported() {
        let err = ensure_all_non_negative(&[("a", 1.0), ("b", -2.0), ("c", -3.0)])
            .expect_err("must reject");
        assert!(err.to_string().contains("b = -2"));
    }
}
