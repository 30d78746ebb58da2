//! Outcome transforms with domain validation
//!
//! Log and square-root transforms validate their domain before applying;
//! the error message reports the observed minimum.

use crate::error::{StatError, StatResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    None,
    Log,
    Sqrt,
}

impl Transform {
    pub fn parse(s: &str) -> StatResult<Self> {
        match s {
            "" | "none" => Ok(Transform::None),
            "log" => Ok(Transform::Log),
            "sqrt" => Ok(Transform::Sqrt),
            other => Err(StatError::unknown_variant("transform", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transform::None => "none",
            Transform::Log => "log",
            Transform::Sqrt => "sqrt",
        }
    }

    /// Apply the transform, validating its domain first.
    pub fn apply(&self, values: &[f64]) -> StatResult<Vec<f64>> {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        match self {
            Transform::None => Ok(values.to_vec()),
            Transform::Log => {
                if min <= 0.0 {
                    return Err(StatError::InvalidTransform(format!(
                        "Log transform requires all values > 0. Found minimum = {}.",
                        min
                    )));
                }
                Ok(values.iter().map(|v| v.ln()).collect())
            }
            Transform::Sqrt => {
                if min < 0.0 {
                    return Err(StatError::InvalidTransform(format!(
                        "Square-root transform requires all values >= 0. Found minimum = {}.",
                        min
                    )));
                }
                Ok(values.iter().map(|v| v.sqrt()).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Transform::parse("log").unwrap(), Transform::Log);
        assert_eq!(Transform::parse("").unwrap(), Transform::None);
        assert!(Transform::parse("cube").is_err());
    }

    #[test]
    fn test_log_rejects_nonpositive() {
        let err = Transform::Log.apply(&[1.0, 0.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("minimum = 0"));
    }

    #[test]
    fn test_sqrt_rejects_negative() {
        let err = Transform::Sqrt.apply(&[4.0, -1.0]).unwrap_err();
        assert!(err.to_string().contains("minimum = -1"));
    }

    #[test]
    fn test_round_trips() {
        let values = [0.5, 1.0, 7.25];
        let logged = Transform::Log.apply(&values).unwrap();
        for (orig, t) in values.iter().zip(&logged) {
            assert!((t.exp() - orig).abs() < 1e-12);
        }
        let rooted = Transform::Sqrt.apply(&values).unwrap();
        for (orig, t) in values.iter().zip(&rooted) {
            assert!((t * t - orig).abs() < 1e-12);
        }
    }
}
