//! Table-driven severity classification.
//!
//! Severity rules differ by metric kind, and the asymmetry is a domain
//! rule: temperature and humidity are judged by how far the reading
//! deviates from the user's threshold, while air quality, UV index and
//! wind speed are judged by the absolute reading against fixed
//! health-risk breakpoints regardless of the configured threshold.
//! Types without a rule fall back to [`AlertLevel::Medium`].

use super::types::{AlertLevel, AlertType};

/// Which measurement feeds the breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeverityInput {
    /// Absolute deviation `|current - threshold|`.
    Deviation,
    /// The raw current value, ignoring the threshold.
    AbsoluteValue,
}

/// One severity rule: input selector plus breakpoints in descending
/// order. The first breakpoint the input exceeds wins; below all of
/// them the result is Low.
struct SeverityRule {
    input: SeverityInput,
    breakpoints: &'static [(f64, AlertLevel)],
}

const TEMPERATURE_RULE: SeverityRule = SeverityRule {
    input: SeverityInput::Deviation,
    breakpoints: &[
        (15.0, AlertLevel::Critical),
        (10.0, AlertLevel::High),
        (5.0, AlertLevel::Medium),
    ],
};

const HUMIDITY_RULE: SeverityRule = SeverityRule {
    input: SeverityInput::Deviation,
    breakpoints: &[(30.0, AlertLevel::High), (20.0, AlertLevel::Medium)],
};

const AIR_QUALITY_RULE: SeverityRule = SeverityRule {
    input: SeverityInput::AbsoluteValue,
    breakpoints: &[
        (300.0, AlertLevel::Critical),
        (200.0, AlertLevel::High),
        (150.0, AlertLevel::Medium),
    ],
};

const UV_INDEX_RULE: SeverityRule = SeverityRule {
    input: SeverityInput::AbsoluteValue,
    breakpoints: &[
        (10.0, AlertLevel::Critical),
        (7.0, AlertLevel::High),
        (5.0, AlertLevel::Medium),
    ],
};

const WIND_SPEED_RULE: SeverityRule = SeverityRule {
    input: SeverityInput::AbsoluteValue,
    breakpoints: &[
        (100.0, AlertLevel::Critical),
        (75.0, AlertLevel::High),
        (50.0, AlertLevel::Medium),
    ],
};

fn rule_for(alert_type: AlertType) -> Option<&'static SeverityRule> {
    match alert_type {
        AlertType::Temperature => Some(&TEMPERATURE_RULE),
        AlertType::Humidity => Some(&HUMIDITY_RULE),
        AlertType::AirQuality => Some(&AIR_QUALITY_RULE),
        AlertType::UvIndex => Some(&UV_INDEX_RULE),
        AlertType::WindSpeed => Some(&WIND_SPEED_RULE),
        // No dedicated scale; documented fallback is Medium.
        AlertType::Pressure | AlertType::Visibility => None,
    }
}

/// Classify a triggered reading into a severity tier.
pub fn classify(alert_type: AlertType, current: f64, threshold: f64) -> AlertLevel {
    let rule = match rule_for(alert_type) {
        Some(r) => r,
        None => return AlertLevel::Medium,
    };

    let keyed = match rule.input {
        SeverityInput::Deviation => (current - threshold).abs(),
        SeverityInput::AbsoluteValue => current,
    };

    for (breakpoint, level) in rule.breakpoints {
        if keyed > *breakpoint {
            return *level;
        }
    }
    AlertLevel::Low
}
