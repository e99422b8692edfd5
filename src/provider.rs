//! Weather metric provider collaborator.
//!
//! The scheduler only depends on the [`WeatherProvider`] trait. The
//! HTTP implementation queries a JSON endpoint under the shared
//! client's timeout; [`StaticProvider`] serves fixed readings for
//! tests and dry runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::AlertType;
use crate::error::ProviderError;

/// One sample of current conditions at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherMetrics {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Hectopascals.
    pub pressure: f64,
    /// Kilometres per hour.
    pub wind_speed: f64,
    /// UV index, dimensionless.
    pub uv_index: f64,
    /// Air Quality Index, dimensionless.
    pub aqi: f64,
    /// Kilometres.
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

fn default_visibility() -> f64 {
    10.0
}

impl WeatherMetrics {
    /// The reading that feeds a given alert type.
    pub fn value_for(&self, alert_type: AlertType) -> f64 {
        match alert_type {
            AlertType::Temperature => self.temperature,
            AlertType::Humidity => self.humidity,
            AlertType::Pressure => self.pressure,
            AlertType::WindSpeed => self.wind_speed,
            AlertType::UvIndex => self.uv_index,
            AlertType::AirQuality => self.aqi,
            AlertType::Visibility => self.visibility,
        }
    }
}

/// Source of current weather metrics.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_metrics(&self, lat: f64, lon: f64) -> Result<WeatherMetrics, ProviderError>;
}

/// HTTP provider querying a JSON endpoint.
///
/// The endpoint is expected to answer
/// `GET {base_url}?lat={lat}&lon={lon}` with a [`WeatherMetrics`]
/// JSON body. Transport timeouts come from the shared client.
pub struct HttpWeatherProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWeatherProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn current_metrics(&self, lat: f64, lon: f64) -> Result<WeatherMetrics, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("lat", lat), ("lon", lon)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::FetchFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::FetchFailed(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .json::<WeatherMetrics>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

impl std::fmt::Debug for HttpWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWeatherProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Provider returning a fixed sample, for tests and dry runs.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    metrics: WeatherMetrics,
}

impl StaticProvider {
    pub fn new(metrics: WeatherMetrics) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl WeatherProvider for StaticProvider {
    async fn current_metrics(&self, _lat: f64, _lon: f64) -> Result<WeatherMetrics, ProviderError> {
        Ok(self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WeatherMetrics {
        WeatherMetrics {
            temperature: 21.0,
            humidity: 45.0,
            pressure: 1013.0,
            wind_speed: 12.0,
            uv_index: 3.0,
            aqi: 80.0,
            visibility: 10.0,
        }
    }

    #[test]
    fn value_for_maps_every_type() {
        let m = sample();
        assert_eq!(m.value_for(AlertType::Temperature), 21.0);
        assert_eq!(m.value_for(AlertType::Humidity), 45.0);
        assert_eq!(m.value_for(AlertType::Pressure), 1013.0);
        assert_eq!(m.value_for(AlertType::WindSpeed), 12.0);
        assert_eq!(m.value_for(AlertType::UvIndex), 3.0);
        assert_eq!(m.value_for(AlertType::AirQuality), 80.0);
        assert_eq!(m.value_for(AlertType::Visibility), 10.0);
    }

    #[test]
    fn metrics_deserialize_without_visibility() {
        let json = r#"{"temperature":20.0,"humidity":50.0,"pressure":1000.0,"wind_speed":5.0,"uv_index":2.0,"aqi":40.0}"#;
        let m: WeatherMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(m.visibility, 10.0);
    }

    #[tokio::test]
    async fn static_provider_returns_fixture() {
        let provider = StaticProvider::new(sample());
        let m = provider.current_metrics(59.9, 10.7).await.unwrap();
        assert_eq!(m, sample());
    }
}
