use std::{num::NonZeroUsize, sync::Mutex};

use async_trait::async_trait;
use lru::LruCache;
use reqwest::Client;
use serde::Deserialize;
use shared::Coordinate;

use crate::config::ApiKey;
use crate::error::GatewayError;
use crate::services::Geocoder;

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

/// Google Geocoding web service client.
pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl GoogleGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GatewayError> {
        let url = format!("{}{}", self.base_url, GEOCODE_PATH);
        tracing::debug!("geocoding {address:?}");

        let response = self
            .client
            .get(&url)
            .query(&[("address", address), ("key", self.api_key.expose())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!("geocoding API returned HTTP {status}: {text}");
            return Err(GatewayError::Upstream {
                service: "geocoding",
                status: status.to_string(),
                message: text,
            });
        }

        let body: GeocodeResponse = serde_json::from_str(&text)?;
        first_location(address, body)
    }
}

fn first_location(address: &str, body: GeocodeResponse) -> Result<Coordinate, GatewayError> {
    match body.status.as_str() {
        "OK" | "ZERO_RESULTS" => {}
        other => {
            return Err(GatewayError::Upstream {
                service: "geocoding",
                status: other.to_string(),
                message: body.error_message.unwrap_or_default(),
            });
        }
    }

    body.results
        .into_iter()
        .next()
        .map(|result| Coordinate {
            lat: result.geometry.location.lat,
            lng: result.geometry.location.lng,
        })
        .ok_or_else(|| GatewayError::NoGeocodeResults(address.to_string()))
}

/// Bounded memo in front of another geocoder, keyed by the trimmed address.
/// Failures are not cached.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Mutex<LruCache<String, Coordinate>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cached(&self, key: &str) -> Option<Coordinate> {
        self.cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(key).copied())
    }

    fn remember(&self, key: String, coord: Coordinate) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, coord);
        }
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GatewayError> {
        let key = address.trim().to_string();
        if let Some(coord) = self.cached(&key) {
            tracing::debug!("geocode cache hit for {key:?}");
            return Ok(coord);
        }

        let coord = self.inner.geocode(&key).await?;
        self.remember(key, coord);
        Ok(coord)
    }
}
