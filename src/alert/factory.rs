//! Alert construction.
//!
//! The factory builds the immutable alert record: a collision-free id,
//! the classified severity, a title and a unit-aware description.
//! Building an alert has no side effects; cooldown marking is a
//! separate explicit step so an evaluation can happen without
//! committing to a trigger.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use super::severity::classify;
use super::types::{Alert, AlertType};

/// Air quality reading past which the description warns explicitly.
const AQI_UNHEALTHY_CUTOFF: f64 = 150.0;

/// UV index past which the description warns explicitly.
const UV_VERY_HIGH_CUTOFF: f64 = 7.0;

/// Builds alert records with process-unique ids.
///
/// Ids combine the factory's creation timestamp with an atomic
/// sequence, so they never collide under concurrent creation and stay
/// distinct across restarts.
#[derive(Debug)]
pub struct AlertFactory {
    epoch_millis: u64,
    seq: AtomicU64,
}

impl Default for AlertFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertFactory {
    pub fn new() -> Self {
        Self {
            epoch_millis: Utc::now().timestamp_millis().max(0) as u64,
            seq: AtomicU64::new(0),
        }
    }

    /// Build an alert for a triggered condition.
    pub fn build(
        &self,
        alert_type: AlertType,
        measured_value: f64,
        threshold: f64,
        location: &str,
    ) -> Alert {
        let level = classify(alert_type, measured_value, threshold);
        let title = format!("{} Alert - {}", alert_type, level);
        let description = build_description(alert_type, measured_value, threshold);

        Alert {
            id: self.next_id(),
            alert_type,
            level,
            title,
            description,
            measured_value,
            threshold,
            location: location.to_string(),
            created_at: Utc::now(),
            resolved: false,
            resolved_at: None,
        }
    }

    fn next_id(&self) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("a-{:x}-{}", self.epoch_millis, n)
    }
}

/// Unit-aware description, with wording that differs per type.
fn build_description(alert_type: AlertType, measured: f64, threshold: f64) -> String {
    let unit = alert_type.unit();
    match alert_type {
        AlertType::Temperature | AlertType::Humidity => {
            let deviation = (measured - threshold).abs();
            let direction = if measured >= threshold { "above" } else { "below" };
            format!(
                "{} is {:.2}{}, {:.2}{} {} the {:.2}{} threshold.",
                alert_type, measured, unit, deviation, unit, direction, threshold, unit
            )
        }
        AlertType::AirQuality => {
            let mut text = format!(
                "Air quality index is {:.0} (threshold {:.0}).",
                measured, threshold
            );
            if measured > AQI_UNHEALTHY_CUTOFF {
                text.push_str(" Air is unhealthy; sensitive groups should limit outdoor activity.");
            }
            text
        }
        AlertType::UvIndex => {
            let mut text = format!("UV index is {:.1} (threshold {:.1}).", measured, threshold);
            if measured > UV_VERY_HIGH_CUTOFF {
                text.push_str(" Very high exposure risk; sun protection is essential.");
            }
            text
        }
        AlertType::WindSpeed | AlertType::Pressure | AlertType::Visibility => {
            format!(
                "{} is {:.2} {} (threshold {:.2} {}).",
                alert_type, measured, unit, threshold, unit
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::types::AlertLevel;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn build_sets_title_from_type_and_level() {
        let factory = AlertFactory::new();
        let alert = factory.build(AlertType::Temperature, 40.0, 20.0, "Oslo");
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(alert.title, "Temperature Alert - Critical");
        assert_eq!(alert.location, "Oslo");
        assert!(!alert.resolved);
        assert!(alert.resolved_at.is_none());
    }

    #[test]
    fn temperature_description_states_direction() {
        let factory = AlertFactory::new();
        let above = factory.build(AlertType::Temperature, 32.0, 20.0, "Oslo");
        assert!(above.description.contains("above"), "{}", above.description);
        assert!(above.description.contains("32.00°C"));

        let below = factory.build(AlertType::Temperature, 8.0, 20.0, "Oslo");
        assert!(below.description.contains("below"), "{}", below.description);
    }

    #[test]
    fn humidity_description_states_direction() {
        let factory = AlertFactory::new();
        let alert = factory.build(AlertType::Humidity, 85.0, 60.0, "Bergen");
        assert!(alert.description.contains("above"));
        assert!(alert.description.contains("85.00%"));
    }

    #[test]
    fn aqi_description_gains_unhealthy_clause_past_cutoff() {
        let factory = AlertFactory::new();

        let mild = factory.build(AlertType::AirQuality, 120.0, 100.0, "Delhi");
        assert!(!mild.description.contains("unhealthy"));

        let bad = factory.build(AlertType::AirQuality, 220.0, 100.0, "Delhi");
        assert!(bad.description.contains("unhealthy"), "{}", bad.description);
    }

    #[test]
    fn uv_description_gains_clause_past_cutoff() {
        let factory = AlertFactory::new();

        let mild = factory.build(AlertType::UvIndex, 6.0, 3.0, "Lisbon");
        assert!(!mild.description.contains("Very high"));

        let strong = factory.build(AlertType::UvIndex, 9.0, 3.0, "Lisbon");
        assert!(strong.description.contains("Very high"), "{}", strong.description);
    }

    #[test]
    fn generic_description_carries_units() {
        let factory = AlertFactory::new();
        let alert = factory.build(AlertType::WindSpeed, 90.0, 30.0, "Reykjavik");
        assert!(alert.description.contains("km/h"));
        assert!(alert.description.contains("90.00"));
    }

    #[test]
    fn ids_are_unique_sequentially() {
        let factory = AlertFactory::new();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let alert = factory.build(AlertType::Temperature, 30.0, 20.0, "x");
            assert!(seen.insert(alert.id), "duplicate id");
        }
    }

    #[tokio::test]
    async fn ids_are_unique_under_concurrent_creation() {
        let factory = Arc::new(AlertFactory::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let factory = Arc::clone(&factory);
            handles.push(tokio::spawn(async move {
                (0..250)
                    .map(|_| factory.build(AlertType::Humidity, 90.0, 60.0, "x").id)
                    .collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "duplicate id under concurrency");
            }
        }
        assert_eq!(seen.len(), 2000);
    }
}
