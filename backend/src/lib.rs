pub mod config;
pub mod directions;
pub mod error;
pub mod geocode;
pub mod services;
pub mod weather;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use shared::{
    ApiError, GeocodeRequest, GeocodeResponse, RouteQuery, RouteResult, WeatherQuery,
    WeatherSnapshot,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::directions::DirectionsClient;
use crate::error::GatewayError;
use crate::geocode::{CachedGeocoder, GoogleGeocoder};
use crate::services::{Geocoder, RoutingClient, WeatherClient};
use crate::weather::OpenWeatherClient;

#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<dyn RoutingClient>,
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherClient>,
}

impl AppState {
    /// Wires the production provider clients from configuration. All three
    /// share one HTTP connection pool.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        let routing = DirectionsClient::new(
            http.clone(),
            config.directions_base_url.clone(),
            config.google_maps_api_key.clone(),
        );
        let geocoder = GoogleGeocoder::new(
            http.clone(),
            config.geocode_base_url.clone(),
            config.google_maps_api_key.clone(),
        );
        let weather = OpenWeatherClient::new(
            http,
            config.weather_base_url.clone(),
            config.weather_api_key.clone(),
        );

        Ok(Self {
            routing: Arc::new(routing),
            geocoder: Arc::new(CachedGeocoder::new(geocoder, config.geocode_cache_size)),
            weather: Arc::new(weather),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/route", post(route_handler))
        .route("/api/geocode", post(geocode_handler))
        .route("/api/weather", get(weather_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

async fn health_handler() -> &'static str {
    "ok"
}

async fn route_handler(
    State(state): State<AppState>,
    payload: Result<Json<RouteQuery>, JsonRejection>,
) -> ApiResult<RouteResult> {
    let Json(query) = payload.map_err(|e| api_error(GatewayError::BadRequest(e.body_text())))?;
    if !query.is_complete() {
        return Err(api_error(GatewayError::InvalidInput(
            "origin and destination are required",
        )));
    }
    tracing::info!("Route request: {:?} -> {:?}", query.origin, query.destination);

    state
        .routing
        .route(&query)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn geocode_handler(
    State(state): State<AppState>,
    payload: Result<Json<GeocodeRequest>, JsonRejection>,
) -> ApiResult<GeocodeResponse> {
    let Json(req) = payload.map_err(|e| api_error(GatewayError::BadRequest(e.body_text())))?;
    if req.address.trim().is_empty() {
        return Err(api_error(GatewayError::InvalidInput("address is required")));
    }

    state
        .geocoder
        .geocode(&req.address)
        .await
        .map(|location| Json(GeocodeResponse { location }))
        .map_err(api_error)
}

async fn weather_handler(
    State(state): State<AppState>,
    params: Result<Query<WeatherQuery>, QueryRejection>,
) -> ApiResult<WeatherSnapshot> {
    let Query(query) = params.map_err(|e| api_error(GatewayError::BadRequest(e.body_text())))?;
    state
        .weather
        .current_weather(query.into())
        .await
        .map(Json)
        .map_err(api_error)
}

/// Convert GatewayError to API error response
fn api_error(err: GatewayError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        GatewayError::InvalidInput(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        GatewayError::NoRoute { .. } | GatewayError::NoGeocodeResults(_) => StatusCode::NOT_FOUND,
        GatewayError::Request(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::Upstream { .. }
        | GatewayError::Request(_)
        | GatewayError::Parse(_)
        | GatewayError::Malformed(_) => StatusCode::BAD_GATEWAY,
    };

    if status.is_server_error() {
        tracing::error!("{err}");
    } else {
        tracing::warn!("{err}");
    }

    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
