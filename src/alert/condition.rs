//! Threshold condition evaluation.
//!
//! Evaluation is deliberately forgiving: an operator outside the
//! supported set evaluates to `false` so a bad config entry can never
//! fire. Strict rejection happens separately at config validation time
//! via [`validate_operator`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The five supported comparison operators.
pub const SUPPORTED_OPERATORS: [&str; 5] = [">", "<", ">=", "<=", "="];

/// A user-configured threshold condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    /// Comparison operator symbol.
    pub operator: String,
    /// Value the measurement is compared against.
    pub value: f64,
}

impl AlertCondition {
    pub fn new(operator: impl Into<String>, value: f64) -> Self {
        Self {
            operator: operator.into(),
            value,
        }
    }

    /// Evaluate a measured value against this condition.
    ///
    /// `=` uses exact equality; callers pre-round when fuzzy matching
    /// is wanted. Unknown operators return `false`, never an error.
    pub fn evaluate(&self, measured: f64) -> bool {
        match self.operator.as_str() {
            ">" => measured > self.value,
            "<" => measured < self.value,
            ">=" => measured >= self.value,
            "<=" => measured <= self.value,
            "=" => measured == self.value,
            _ => false,
        }
    }
}

/// Reject any operator outside the supported set.
///
/// Called at config validation time so bad operators surface at
/// startup rather than silently never firing.
pub fn validate_operator(config_name: &str, operator: &str) -> Result<(), ConfigError> {
    if SUPPORTED_OPERATORS.contains(&operator) {
        Ok(())
    } else {
        Err(ConfigError::InvalidOperator {
            config: config_name.to_string(),
            operator: operator.to_string(),
        })
    }
}
