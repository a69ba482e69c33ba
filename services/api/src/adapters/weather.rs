//! services/api/src/adapters/weather.rs
//!
//! This module contains the adapters for current weather conditions.
//! They implement the `WeatherSource` port from the `core` crate.

use async_trait::async_trait;
use mood_journal_core::domain::WeatherReading;
use mood_journal_core::ports::{PortError, PortResult, WeatherSource};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{WeatherConfig, WeatherLocation};

//=========================================================================================
// OpenWeatherMap Payload
//=========================================================================================
// Only the fields the journal uses are declared; everything else is ignored.
//=========================================================================================

#[derive(Debug, Deserialize)]
struct OwmResponse {
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: Option<OwmMain>,
    wind: Option<OwmWind>,
    clouds: Option<OwmClouds>,
    rain: Option<OwmVolume>,
    snow: Option<OwmVolume>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmVolume {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl OwmResponse {
    /// The single mapping step from the provider's payload to a reading.
    fn into_reading(self) -> WeatherReading {
        let main = self.main.as_ref();
        let volume = |v: &Option<OwmVolume>| v.as_ref().and_then(|v| v.one_hour).unwrap_or(0.0);

        WeatherReading {
            temperature: main.and_then(|m| m.temp),
            humidity: main.and_then(|m| m.humidity),
            condition: self.weather.first().map(|w| w.main.clone()),
            precipitation: Some(volume(&self.rain) + volume(&self.snow)),
            cloud_cover: self.clouds.as_ref().and_then(|c| c.all),
            wind_speed: self.wind.as_ref().and_then(|w| w.speed),
            air_pressure: main.and_then(|m| m.pressure),
            // Not part of the current-weather endpoint.
            uv_index: None,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `WeatherSource` port using the OpenWeatherMap API.
#[derive(Clone)]
pub struct OpenWeatherAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    location: WeatherLocation,
}

impl OpenWeatherAdapter {
    /// Creates a new `OpenWeatherAdapter` with its own HTTP client.
    pub fn new(config: &WeatherConfig, api_key: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            location: config.location.clone(),
        })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];
        match &self.location {
            WeatherLocation::City(city) => params.push(("q", city.clone())),
            WeatherLocation::Coordinates { lat, lon } => {
                params.push(("lat", lat.to_string()));
                params.push(("lon", lon.to_string()));
            }
        }
        params
    }
}

//=========================================================================================
// `WeatherSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl WeatherSource for OpenWeatherAdapter {
    async fn fetch_current(&self) -> PortResult<WeatherReading> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&self.query())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Weather request failed");
                if e.is_timeout() {
                    PortError::Unavailable("weather request timed out".to_string())
                } else {
                    PortError::Unavailable(format!("weather request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PortError::Unavailable(
                "weather API rejected the configured API key".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(PortError::Unavailable(format!(
                "weather API responded with {}",
                status
            )));
        }

        let payload = response.json::<OwmResponse>().await.map_err(|e| {
            if e.is_decode() {
                PortError::Unexpected(format!("Malformed weather payload: {}", e))
            } else {
                PortError::Unavailable(format!("failed to read weather body: {}", e))
            }
        })?;
        debug!(conditions = payload.weather.len(), "Weather payload received");
        Ok(payload.into_reading())
    }
}

/// Stands in for a weather provider when no API key is configured.
#[derive(Clone, Default)]
pub struct UnconfiguredWeather;

#[async_trait]
impl WeatherSource for UnconfiguredWeather {
    async fn fetch_current(&self) -> PortResult<WeatherReading> {
        Err(PortError::Unavailable(
            "no weather API key configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(body: &str) -> serde_json::Result<WeatherReading> {
        serde_json::from_str::<OwmResponse>(body).map(OwmResponse::into_reading)
    }

    const LONDON_DRIZZLE: &str = r#"{
        "coord": {"lon": -0.13, "lat": 51.51},
        "weather": [{"id": 300, "main": "Drizzle", "description": "light intensity drizzle", "icon": "09d"}],
        "base": "stations",
        "main": {"temp": 11.4, "feels_like": 10.2, "pressure": 1012, "humidity": 81},
        "visibility": 10000,
        "wind": {"speed": 4.1, "deg": 80},
        "clouds": {"all": 90},
        "rain": {"1h": 0.3},
        "dt": 1485789600,
        "name": "London",
        "cod": 200
    }"#;

    #[test]
    fn maps_provider_payload_to_reading() {
        let reading = parse(LONDON_DRIZZLE).unwrap();
        assert_eq!(reading.temperature, Some(11.4));
        assert_eq!(reading.humidity, Some(81.0));
        assert_eq!(reading.condition.as_deref(), Some("Drizzle"));
        assert_eq!(reading.precipitation, Some(0.3));
        assert_eq!(reading.cloud_cover, Some(90.0));
        assert_eq!(reading.wind_speed, Some(4.1));
        assert_eq!(reading.air_pressure, Some(1012.0));
        assert_eq!(reading.uv_index, None);
    }

    #[test]
    fn sparse_payload_leaves_fields_empty() {
        let reading = parse(r#"{"main": {"temp": -3.5}}"#).unwrap();
        assert_eq!(reading.temperature, Some(-3.5));
        assert_eq!(reading.humidity, None);
        assert_eq!(reading.condition, None);
        assert_eq!(reading.precipitation, Some(0.0));
    }

    #[test]
    fn rain_and_snow_are_summed() {
        let reading =
            parse(r#"{"main": {}, "rain": {"1h": 1.5}, "snow": {"1h": 0.5}}"#).unwrap();
        assert_eq!(reading.precipitation, Some(2.0));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn query_uses_coordinates_when_configured() {
        let config = WeatherConfig {
            api_key: Some("k".into()),
            base_url: "http://localhost".into(),
            location: WeatherLocation::Coordinates { lat: 1.5, lon: -2.0 },
            timeout: Duration::from_secs(1),
        };
        let adapter = OpenWeatherAdapter::new(&config, "k".into()).unwrap();
        let params = adapter.query();
        assert!(params.contains(&("lat", "1.5".to_string())));
        assert!(params.contains(&("lon", "-2".to_string())));
        assert!(params.iter().all(|(name, _)| *name != "q"));
    }

    #[tokio::test]
    async fn unconfigured_source_is_unavailable() {
        let err = UnconfiguredWeather.fetch_current().await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
    }
}
