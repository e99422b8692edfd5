//! Core alert domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of environmental metrics that can trigger alerts.
///
/// Closed enumeration: adding a variant requires touching the severity
/// table and the description builder, both of which match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    AirQuality,
    UvIndex,
    Visibility,
}

impl AlertType {
    /// Measurement unit used in user-facing messages.
    pub fn unit(&self) -> &'static str {
        match self {
            AlertType::Temperature => "°C",
            AlertType::Humidity => "%",
            AlertType::Pressure => "hPa",
            AlertType::WindSpeed => "km/h",
            AlertType::AirQuality => "AQI",
            AlertType::UvIndex => "UV",
            AlertType::Visibility => "km",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlertType::Temperature => "Temperature",
            AlertType::Humidity => "Humidity",
            AlertType::Pressure => "Pressure",
            AlertType::WindSpeed => "Wind Speed",
            AlertType::AirQuality => "Air Quality",
            AlertType::UvIndex => "UV Index",
            AlertType::Visibility => "Visibility",
        };
        write!(f, "{}", name)
    }
}

/// Severity tiers, strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    /// Hex color used by structured channel payloads.
    pub fn color(&self) -> &'static str {
        match self {
            AlertLevel::Low => "#36a64f",
            AlertLevel::Medium => "#ffcc00",
            AlertLevel::High => "#ff9900",
            AlertLevel::Critical => "#ff0000",
        }
    }

    /// Severity marker prefixed to plain-text messages.
    pub fn marker(&self) -> &'static str {
        match self {
            AlertLevel::Low => "[LOW]",
            AlertLevel::Medium => "[MEDIUM]",
            AlertLevel::High => "[HIGH]",
            AlertLevel::Critical => "[CRITICAL]",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlertLevel::Low => "Low",
            AlertLevel::Medium => "Medium",
            AlertLevel::High => "High",
            AlertLevel::Critical => "Critical",
        };
        write!(f, "{}", name)
    }
}

/// A triggered alert record.
///
/// Built once by the [`AlertFactory`](crate::alert::AlertFactory) and
/// never mutated afterwards, except to mark resolution. Owned by the
/// user whose config triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub level: AlertLevel,
    pub title: String,
    pub description: String,
    pub measured_value: f64,
    pub threshold: f64,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Mark the alert resolved. Idempotent: the first resolution
    /// timestamp is kept.
    pub fn resolve(&mut self) {
        if !self.resolved {
            self.resolved = true;
            self.resolved_at = Some(Utc::now());
        }
    }
}
