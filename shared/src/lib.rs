pub mod normalize;
pub mod sanitize;

use serde::{Deserialize, Serialize};

pub use normalize::{InstructionList, NormalizeError, normalize};
pub use sanitize::strip_markup;

/// Map center used until the device reports its position.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 48.8584,
    lng: 2.2945,
};

pub const RECENTER_ZOOM: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TravelMode {
    #[default]
    Driving,
}

impl TravelMode {
    /// Value of the provider's `mode` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub travel_mode: TravelMode,
    #[serde(default = "default_alternatives")]
    pub provide_route_alternatives: bool,
}

impl RouteQuery {
    pub fn driving(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            travel_mode: TravelMode::Driving,
            provide_route_alternatives: true,
        }
    }

    /// Both addresses carry something other than whitespace.
    pub fn is_complete(&self) -> bool {
        !self.origin.trim().is_empty() && !self.destination.trim().is_empty()
    }
}

/// Provider-formatted quantity: `text` for display, `value` in metres or seconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub instruction_html: String,
    pub distance: TextValue,
    pub duration: TextValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub steps: Vec<Step>,
    pub distance: TextValue,
    pub duration: TextValue,
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub summary: String,
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub overview_path: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteResult {
    pub routes: Vec<Route>,
}

impl RouteResult {
    pub fn primary(&self) -> Option<&Route> {
        self.routes.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_text: String,
    pub duration_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub condition_text: String,
    pub temperature_celsius: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub location: Coordinate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lng: f64,
}

impl From<WeatherQuery> for Coordinate {
    fn from(query: WeatherQuery) -> Self {
        Self {
            lat: query.lat,
            lng: query.lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

fn default_alternatives() -> bool {
    true
}
