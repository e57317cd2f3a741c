//! Upstream weather API client.
//!
//! Fetches current conditions from the OpenWeather current-weather endpoint
//! and maps the payload into a [`NewWeatherRecord`] keyed by today's date.
//! Payload mapping is split from the HTTP call so it can be tested without a
//! network.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::models::NewWeatherRecord;

const DEFAULT_API_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
const DEFAULT_LATITUDE: f64 = 10.06069;
const DEFAULT_LONGITUDE: f64 = -2.50192;

/// Conversion factor from the API's metres-per-second wind speed.
const MPS_TO_KPH: f64 = 3.6;

/// Errors from the upstream weather fetch. Transport and status failures map
/// to a 502 at the HTTP layer; missing configuration stays a 500.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API configuration error: {0}")]
    Configuration(String),
    #[error("weather API request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Connection parameters for the weather API.
#[derive(Debug, Clone)]
pub struct WeatherApiConfig {
    pub api_key: String,
    pub api_url: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl WeatherApiConfig {
    /// Read configuration from the environment.
    ///
    /// # Environment Variables
    /// - `OPENWEATHER_API_KEY`: API key (required)
    /// - `OPENWEATHER_URL`: Endpoint override (default: OpenWeather current weather)
    /// - `FARM_LAT` / `FARM_LON`: Farm coordinates (defaults baked in)
    pub fn from_env() -> Result<Self, WeatherError> {
        let api_key = std::env::var("OPENWEATHER_API_KEY")
            .map_err(|_| WeatherError::Configuration("OPENWEATHER_API_KEY must be set".into()))?;

        let api_url =
            std::env::var("OPENWEATHER_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let latitude = std::env::var("FARM_LAT")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(DEFAULT_LATITUDE);

        let longitude = std::env::var("FARM_LON")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(DEFAULT_LONGITUDE);

        Ok(Self {
            api_key,
            api_url,
            latitude,
            longitude,
        })
    }
}

/// Subset of the OpenWeather current-weather payload we consume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub main: MainConditions,
    #[serde(default)]
    pub wind: WindConditions,
    #[serde(default)]
    pub rain: RainVolume,
    #[serde(default)]
    pub weather: Vec<WeatherSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MainConditions {
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindConditions {
    /// Metres per second in metric mode.
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RainVolume {
    /// Rainfall over the last hour, millimetres.
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherSummary {
    #[serde(default)]
    pub description: Option<String>,
}

/// Map an upstream payload to a storable record for the given date.
///
/// Missing rain data counts as zero precipitation; wind speed is converted
/// from m/s to km/h.
pub fn record_from_conditions(conditions: &CurrentConditions, record_date: NaiveDate) -> NewWeatherRecord {
    let location = conditions
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Farm Location".to_string());

    let weather_description = Some(
        conditions
            .weather
            .first()
            .and_then(|w| w.description.clone())
            .unwrap_or_else(|| "N/A".to_string()),
    );

    NewWeatherRecord {
        record_date,
        location,
        temperature_max_celsius: conditions.main.temp_max,
        temperature_min_celsius: conditions.main.temp_min,
        precipitation_mm: Some(conditions.rain.one_hour.unwrap_or(0.0)),
        humidity_percentage: conditions.main.humidity,
        wind_speed_kph: conditions.wind.speed.map(|s| s * MPS_TO_KPH),
        weather_description,
    }
}

/// Fetch current conditions from the upstream API.
///
/// Non-2xx responses surface as `WeatherError::Upstream`.
pub async fn fetch_current_conditions(
    client: &reqwest::Client,
    config: &WeatherApiConfig,
) -> Result<CurrentConditions, WeatherError> {
    let response = client
        .get(&config.api_url)
        .query(&[
            ("lat", config.latitude.to_string()),
            ("lon", config.longitude.to_string()),
            ("appid", config.api_key.clone()),
            ("units", "metric".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let conditions = response.json::<CurrentConditions>().await?;
    Ok(conditions)
}

/// Fetch the current conditions and build the record to upsert for `today`.
pub async fn fetch_weather_record(
    client: &reqwest::Client,
    config: &WeatherApiConfig,
    today: NaiveDate,
) -> Result<NewWeatherRecord, WeatherError> {
    let conditions = fetch_current_conditions(client, config).await?;
    Ok(record_from_conditions(&conditions, today))
}
