use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{Coordinate, Leg, Route, RouteQuery, RouteResult, Step, TextValue};

use crate::config::ApiKey;
use crate::error::GatewayError;
use crate::services::RoutingClient;

const DIRECTIONS_PATH: &str = "/maps/api/directions/json";
const POLYLINE_PRECISION: u32 = 5;

/// Google Directions web service client.
pub struct DirectionsClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl DirectionsClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl RoutingClient for DirectionsClient {
    async fn route(&self, query: &RouteQuery) -> Result<RouteResult, GatewayError> {
        let url = format!("{}{}", self.base_url, DIRECTIONS_PATH);
        let alternatives = if query.provide_route_alternatives {
            "true"
        } else {
            "false"
        };
        tracing::debug!(
            "requesting directions {:?} -> {:?} (mode={})",
            query.origin,
            query.destination,
            query.travel_mode.as_query_value()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("origin", query.origin.as_str()),
                ("destination", query.destination.as_str()),
                ("mode", query.travel_mode.as_query_value()),
                ("alternatives", alternatives),
                ("key", self.api_key.expose()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!("directions API returned HTTP {status}: {text}");
            return Err(GatewayError::Upstream {
                service: "directions",
                status: status.to_string(),
                message: text,
            });
        }

        let body: DirectionsResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::error!("failed to parse directions response: {e}. Body: {text}");
            e
        })?;
        map_directions(query, body)
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    summary: String,
    legs: Vec<ApiLeg>,
    #[serde(default)]
    overview_polyline: Option<ApiPolyline>,
}

#[derive(Debug, Deserialize)]
struct ApiPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    #[serde(default)]
    steps: Vec<ApiStep>,
    distance: ApiTextValue,
    duration: ApiTextValue,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    #[serde(default)]
    start_location: Option<ApiLatLng>,
    #[serde(default)]
    end_location: Option<ApiLatLng>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(default)]
    html_instructions: String,
    distance: ApiTextValue,
    duration: ApiTextValue,
}

#[derive(Debug, Deserialize)]
struct ApiTextValue {
    text: String,
    value: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ApiLatLng {
    lat: f64,
    lng: f64,
}

impl From<ApiTextValue> for TextValue {
    fn from(v: ApiTextValue) -> Self {
        TextValue {
            text: v.text,
            value: v.value,
        }
    }
}

impl From<ApiLatLng> for Coordinate {
    fn from(v: ApiLatLng) -> Self {
        Coordinate {
            lat: v.lat,
            lng: v.lng,
        }
    }
}

fn map_directions(
    query: &RouteQuery,
    body: DirectionsResponse,
) -> Result<RouteResult, GatewayError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => {
            return Err(GatewayError::NoRoute {
                origin: query.origin.clone(),
                destination: query.destination.clone(),
            });
        }
        other => {
            return Err(GatewayError::Upstream {
                service: "directions",
                status: other.to_string(),
                message: body.error_message.unwrap_or_default(),
            });
        }
    }

    let routes = body
        .routes
        .into_iter()
        .filter(|route| !route.legs.is_empty())
        .map(map_route)
        .collect::<Result<Vec<_>, _>>()?;

    if routes.is_empty() {
        return Err(GatewayError::NoRoute {
            origin: query.origin.clone(),
            destination: query.destination.clone(),
        });
    }

    tracing::info!(
        "directions resolved {} route(s), primary has {} leg(s)",
        routes.len(),
        routes[0].legs.len()
    );
    Ok(RouteResult { routes })
}

fn map_route(route: ApiRoute) -> Result<Route, GatewayError> {
    let overview_path = match route.overview_polyline {
        Some(polyline) => decode_path(&polyline.points)?,
        None => Vec::new(),
    };

    Ok(Route {
        summary: route.summary,
        legs: route.legs.into_iter().map(map_leg).collect(),
        overview_path,
    })
}

fn map_leg(leg: ApiLeg) -> Leg {
    Leg {
        steps: leg
            .steps
            .into_iter()
            .map(|step| Step {
                instruction_html: step.html_instructions,
                distance: step.distance.into(),
                duration: step.duration.into(),
            })
            .collect(),
        distance: leg.distance.into(),
        duration: leg.duration.into(),
        start_address: leg.start_address,
        end_address: leg.end_address,
        start_location: leg.start_location.map(Into::into),
        end_location: leg.end_location.map(Into::into),
    }
}

/// Decodes an encoded overview polyline. Decoded points are x=lng, y=lat.
fn decode_path(encoded: &str) -> Result<Vec<Coordinate>, GatewayError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| GatewayError::Malformed(format!("overview polyline: {e}")))?;
    Ok(line
        .coords()
        .map(|c| Coordinate { lat: c.y, lng: c.x })
        .collect())
}
