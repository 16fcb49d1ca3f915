use async_trait::async_trait;
use shared::{Coordinate, RouteQuery, RouteResult, WeatherSnapshot};

use crate::error::GatewayError;

/// Resolves candidate routes between two free-text addresses.
///
/// Implementations return `GatewayError::NoRoute` when the provider finds
/// nothing, so a successful result always holds at least one route.
#[async_trait]
pub trait RoutingClient: Send + Sync {
    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, GatewayError>;
}

/// Resolves a free-text address to a coordinate. An empty result set is an
/// error.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GatewayError>;
}

#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherSnapshot, GatewayError>;
}
