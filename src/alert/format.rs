//! User-facing message rendering.
//!
//! Two side-effect-free transforms of an alert: a plain-text block for
//! direct chat delivery, and a structured attachment for webhook-style
//! channels carrying the severity color. Digest summaries reuse the
//! same text-block style.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::types::Alert;
use crate::provider::WeatherMetrics;

/// Format a UTC instant as local wall-clock time for the given
/// timezone name. An invalid timezone falls back to UTC rather than
/// erroring.
pub fn local_timestamp(instant: DateTime<Utc>, timezone: &str) -> String {
    let tz: Tz = timezone.parse().unwrap_or_else(|_| {
        tracing::warn!(timezone = %timezone, "Invalid timezone, falling back to UTC");
        chrono_tz::UTC
    });
    instant.with_timezone(&tz).format("%d/%m/%Y %H:%M:%S %Z").to_string()
}

/// Plain-text alert block for direct delivery.
pub fn format_alert_text(alert: &Alert, timezone: &str) -> String {
    format!(
        "{} {}\nLocation: {}\nCurrent: {:.2} {} | Threshold: {:.2} {}\nTime: {}\n{}",
        alert.level.marker(),
        alert.title,
        alert.location,
        alert.measured_value,
        alert.alert_type.unit(),
        alert.threshold,
        alert.alert_type.unit(),
        local_timestamp(alert.created_at, timezone),
        alert.description,
    )
}

/// Plain-text weather summary block for digest delivery.
pub fn format_digest_text(metrics: &WeatherMetrics, location: &str, timezone: &str) -> String {
    format!(
        "Weather digest for {}\nTime: {}\nTemperature: {:.2} °C\nHumidity: {:.2} %\nPressure: {:.2} hPa\nWind Speed: {:.2} km/h\nUV Index: {:.2}\nAir Quality: {:.2} AQI\nVisibility: {:.2} km",
        location,
        local_timestamp(Utc::now(), timezone),
        metrics.temperature,
        metrics.humidity,
        metrics.pressure,
        metrics.wind_speed,
        metrics.uv_index,
        metrics.aqi,
        metrics.visibility,
    )
}

/// One named attribute in a channel attachment.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// Structured payload for webhook-style channels.
///
/// `color` is mapped from the alert severity; the remaining alert
/// fields travel as named attributes.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelAttachment {
    pub fallback: String,
    pub color: String,
    pub title: String,
    pub text: String,
    pub fields: Vec<AttachmentField>,
}

/// Build the structured channel payload for an alert.
pub fn channel_attachment(alert: &Alert, timezone: &str) -> ChannelAttachment {
    let unit = alert.alert_type.unit();
    ChannelAttachment {
        fallback: alert.title.clone(),
        color: alert.level.color().to_string(),
        title: alert.title.clone(),
        text: alert.description.clone(),
        fields: vec![
            AttachmentField {
                title: "Location".to_string(),
                value: alert.location.clone(),
                short: true,
            },
            AttachmentField {
                title: "Severity".to_string(),
                value: alert.level.to_string(),
                short: true,
            },
            AttachmentField {
                title: "Current".to_string(),
                value: format!("{:.2} {}", alert.measured_value, unit),
                short: true,
            },
            AttachmentField {
                title: "Threshold".to_string(),
                value: format!("{:.2} {}", alert.threshold, unit),
                short: true,
            },
            AttachmentField {
                title: "Time".to_string(),
                value: local_timestamp(alert.created_at, timezone),
                short: true,
            },
        ],
    }
}
