use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{Coordinate, WeatherSnapshot};

use crate::config::ApiKey;
use crate::error::GatewayError;
use crate::services::WeatherClient;

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// OpenWeatherMap current-conditions client. Always asks for metric units.
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl OpenWeatherClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    weather: Vec<Condition>,
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherSnapshot, GatewayError> {
        let url = format!("{}{}", self.base_url, CURRENT_WEATHER_PATH);
        tracing::debug!("fetching weather at ({:.4}, {:.4})", at.lat, at.lng);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lng.to_string()),
                ("appid", self.api_key.expose().to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!("weather API returned HTTP {status}");
            return Err(GatewayError::Upstream {
                service: "weather",
                status: status.to_string(),
                message: text,
            });
        }

        let body: CurrentWeather = serde_json::from_str(&text)?;
        to_snapshot(body)
    }
}

fn to_snapshot(body: CurrentWeather) -> Result<WeatherSnapshot, GatewayError> {
    let condition = body
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Malformed("weather list is empty".into()))?;

    Ok(WeatherSnapshot {
        condition_text: condition.main,
        temperature_celsius: round_half_up(body.main.temp),
    })
}

/// Halves round towards positive infinity, so -3.5 becomes -3.
fn round_half_up(celsius: f64) -> i32 {
    (celsius + 0.5).floor() as i32
}
