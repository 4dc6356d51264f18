//! # Weather Service
//!
//! Proxies current-conditions lookups to OpenWeatherMap and folds the
//! reply into a flight-suitability verdict. The provider wire format
//! stays inside this module; handlers only see [`WeatherReport`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hoverfly_analytics::{FlightConditions, WeatherObservation, flight_suitability};

use crate::config::WeatherConfig;
use crate::error::{ApiError, ApiResult};

/// Current conditions at a coordinate, plus the flight verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: Location,
    pub current: CurrentConditions,
    pub wind: Wind,
    pub flight: FlightConditions,
    pub timestamp: DateTime<Utc>,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub country: String,
    pub coordinates: LocationCoordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationCoordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub visibility: f64,
    pub cloud_cover: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wind {
    pub speed: f64,
    pub direction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

/// Capability trait for weather lookups.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, lat: f64, lon: f64, units: &str) -> ApiResult<WeatherReport>;
}

// =============================================================================
// OPENWEATHERMAP CLIENT
// =============================================================================

pub struct OpenWeatherClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: WeatherConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct OwmResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: OwmSys,
    coord: LocationCoordinates,
    main: OwmMain,
    /// Meters, absent in some replies.
    #[serde(default = "default_visibility")]
    visibility: f64,
    #[serde(default)]
    clouds: OwmClouds,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    wind: Option<OwmWind>,
    #[serde(default)]
    rain: Option<OwmPrecip>,
    #[serde(default)]
    snow: Option<OwmPrecip>,
}

fn default_visibility() -> f64 {
    10_000.0
}

#[derive(Default, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Default, Deserialize)]
struct OwmClouds {
    #[serde(default)]
    all: f64,
}

#[derive(Deserialize)]
struct OwmCondition {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
    gust: Option<f64>,
}

#[derive(Deserialize)]
struct OwmPrecip {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl OwmPrecip {
    fn accumulated(&self) -> f64 {
        self.three_hour.or(self.one_hour).unwrap_or(0.0)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, lat: f64, lon: f64, units: &str) -> ApiResult<WeatherReport> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Upstream("weather service not configured".to_string()))?;

        let url = format!("{}/weather", self.config.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", units.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Upstream("Weather API timeout".to_string())
                } else {
                    ApiError::Upstream(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Upstream(
                "Weather API authentication failed".to_string(),
            ));
        }
        let response = response
            .error_for_status()
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let owm: OwmResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        Ok(into_report(owm, units))
    }
}

fn into_report(owm: OwmResponse, units: &str) -> WeatherReport {
    let condition = owm.weather.first();
    let precipitation = owm
        .rain
        .as_ref()
        .map(OwmPrecip::accumulated)
        .filter(|v| *v > 0.0)
        .or_else(|| owm.snow.as_ref().map(OwmPrecip::accumulated))
        .unwrap_or(0.0);
    let wind_speed = owm.wind.as_ref().map_or(0.0, |w| w.speed);

    let observation = WeatherObservation {
        wind_speed,
        visibility: owm.visibility,
        cloud_cover: owm.clouds.all,
        condition: condition.map_or_else(|| "Clear".to_string(), |c| c.main.clone()),
        precipitation,
    };

    WeatherReport {
        location: Location {
            name: owm.name,
            country: owm.sys.country,
            coordinates: owm.coord,
        },
        current: CurrentConditions {
            temperature: owm.main.temp,
            feels_like: owm.main.feels_like,
            humidity: owm.main.humidity,
            pressure: owm.main.pressure,
            visibility: owm.visibility,
            cloud_cover: owm.clouds.all,
            condition: observation.condition.clone(),
            description: condition.map(|c| c.description.clone()).unwrap_or_default(),
            icon: condition.map(|c| c.icon.clone()).unwrap_or_default(),
        },
        wind: Wind {
            speed: wind_speed,
            direction: owm.wind.as_ref().map_or(0.0, |w| w.deg),
            gust: owm.wind.as_ref().and_then(|w| w.gust),
        },
        flight: flight_suitability(&observation),
        timestamp: Utc::now(),
        units: units.to_string(),
    }
}

/// Fixed-report provider for tests and offline runs.
pub struct StaticWeather {
    report: WeatherReport,
}

impl StaticWeather {
    pub fn new(report: WeatherReport) -> Self {
        Self { report }
    }

    /// A calm clear day anywhere the caller asks about.
    #[must_use]
    pub fn clear_day() -> Self {
        let observation = WeatherObservation {
            wind_speed: 3.0,
            visibility: 10_000.0,
            cloud_cover: 5.0,
            condition: "Clear".to_string(),
            precipitation: 0.0,
        };
        Self::new(WeatherReport {
            location: Location {
                name: String::new(),
                country: String::new(),
                coordinates: LocationCoordinates { lat: 0.0, lon: 0.0 },
            },
            current: CurrentConditions {
                temperature: 21.0,
                feels_like: 21.0,
                humidity: 40.0,
                pressure: 1013.0,
                visibility: observation.visibility,
                cloud_cover: observation.cloud_cover,
                condition: observation.condition.clone(),
                description: "clear sky".to_string(),
                icon: "01d".to_string(),
            },
            wind: Wind {
                speed: observation.wind_speed,
                direction: 180.0,
                gust: None,
            },
            flight: flight_suitability(&observation),
            timestamp: Utc::now(),
            units: "metric".to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for StaticWeather {
    async fn current(&self, lat: f64, lon: f64, _units: &str) -> ApiResult<WeatherReport> {
        let mut report = self.report.clone();
        report.location.coordinates = LocationCoordinates { lat, lon };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stormy_reply_maps_to_an_unsuitable_report() {
        let owm = OwmResponse {
            name: "Galway".to_string(),
            sys: OwmSys {
                country: "IE".to_string(),
            },
            coord: LocationCoordinates {
                lat: 53.27,
                lon: -9.05,
            },
            main: OwmMain {
                temp: 11.0,
                feels_like: 8.0,
                humidity: 92.0,
                pressure: 998.0,
            },
            visibility: 800.0,
            clouds: OwmClouds { all: 90.0 },
            weather: vec![OwmCondition {
                main: "Thunderstorm".to_string(),
                description: "thunderstorm with rain".to_string(),
                icon: "11d".to_string(),
            }],
            wind: Some(OwmWind {
                speed: 17.0,
                deg: 250.0,
                gust: Some(24.0),
            }),
            rain: Some(OwmPrecip {
                three_hour: Some(6.5),
                one_hour: None,
            }),
            snow: None,
        };

        let report = into_report(owm, "metric");
        assert!(!report.flight.suitable);
        assert_eq!(report.flight.score, 0);
        assert_eq!(report.current.condition, "Thunderstorm");
        assert_eq!(report.wind.gust, Some(24.0));
    }

    #[test]
    fn missing_optional_fields_default_cleanly() {
        let json = r#"{
            "coord": {"lat": 1.0, "lon": 2.0},
            "main": {"temp": 20.0, "feels_like": 20.0, "humidity": 50.0, "pressure": 1010.0}
        }"#;
        let owm: OwmResponse = serde_json::from_str(json).unwrap();
        let report = into_report(owm, "metric");

        assert!(report.flight.suitable);
        assert_eq!(report.flight.score, 100);
        assert_eq!(report.current.condition, "Clear");
        assert_eq!(report.wind.speed, 0.0);
    }
}
