pub mod controller;

use seed::{prelude::*, *};
use serde::{Deserialize, de::DeserializeOwned};
use serde_wasm_bindgen::to_value;
use shared::{
    Coordinate, DEFAULT_CENTER, GeocodeRequest, GeocodeResponse, RECENTER_ZOOM, RouteQuery,
    RouteResult, WeatherSnapshot,
};
use wasm_bindgen::{
    JsCast,
    prelude::{JsValue, wasm_bindgen},
};

use crate::controller::{Effect, MapHandle, RequestToken, ViewState, WeatherTarget, recenter};

#[wasm_bindgen(module = "/route_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map(center: JsValue, zoom: u8);
    #[wasm_bindgen(js_name = showRoute)]
    fn show_route_js(path: JsValue);
    #[wasm_bindgen(js_name = panTo)]
    fn pan_to_js(center: JsValue);
    #[wasm_bindgen(js_name = setZoom)]
    fn set_zoom_js(zoom: u8);
    #[wasm_bindgen(js_name = requestDeviceLocation)]
    fn request_device_location();
}

fn api_root() -> String {
    if let Some(url) = option_env!("FRONTEND_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:8080/api".to_string()
}

fn weather_url(root: &str, at: Coordinate) -> String {
    format!("{root}/weather?lat={}&lng={}", at.lat, at.lng)
}

/// The maplibre widget behind `route_map.js`.
struct JsMap;

impl MapHandle for JsMap {
    fn pan_to(&self, center: Coordinate) {
        if let Ok(value) = to_value(&center) {
            pan_to_js(value);
        }
    }

    fn set_zoom(&self, zoom: u8) {
        set_zoom_js(zoom);
    }
}

pub struct Model {
    view: ViewState,
    error: Option<String>,
}

pub enum Msg {
    OriginChanged(String),
    DestinationChanged(String),
    CalculateRoute,
    ClearRoute,
    ToggleInstructions,
    Recenter,
    RouteFetched {
        token: RequestToken,
        result: Result<RouteResult, String>,
    },
    WeatherFetched {
        token: RequestToken,
        result: Result<WeatherSnapshot, String>,
    },
    DeviceLocated(Coordinate),
    DeviceLocationFailed(String),
}

#[derive(Deserialize)]
struct DeviceLocationPayload {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DeviceLocationError {
    message: String,
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("device-location"), |event| {
        let detail = event.dyn_into::<web_sys::CustomEvent>().ok()?.detail();
        let payload: DeviceLocationPayload = serde_wasm_bindgen::from_value(detail).ok()?;
        Some(Msg::DeviceLocated(Coordinate {
            lat: payload.lat,
            lng: payload.lng,
        }))
    }));
    orders.stream(streams::window_event(
        Ev::from("device-location-error"),
        |event| {
            let message = event
                .dyn_into::<web_sys::CustomEvent>()
                .ok()
                .and_then(|event| {
                    serde_wasm_bindgen::from_value::<DeviceLocationError>(event.detail()).ok()
                })
                .map(|err| err.message)
                .unwrap_or_else(|| "geolocation unavailable".to_string());
            Msg::DeviceLocationFailed(message)
        },
    ));

    request_device_location();

    Model {
        view: ViewState::default(),
        error: None,
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::OriginChanged(val) => model.view.set_origin(val),
        Msg::DestinationChanged(val) => model.view.set_destination(val),
        Msg::CalculateRoute => {
            let effects = model.view.calculate_route();
            run_effects(effects, orders);
        }
        Msg::RouteFetched { token, result } => {
            match model.view.route_resolved(token, result) {
                Ok(effects) => {
                    model.error = None;
                    run_effects(effects, orders);
                }
                Err(err) => {
                    web_sys::console::error_1(&format!("[frontend] {err}").into());
                    model.error = Some(err.to_string());
                }
            }
            sync_route_on_map(&model.view);
        }
        Msg::WeatherFetched { token, result } => {
            if let Err(err) = &result {
                web_sys::console::error_1(
                    &format!("[frontend] error fetching weather data: {err}").into(),
                );
            }
            if !model.view.weather_resolved(token, result) {
                web_sys::console::debug_1(&"[frontend] dropped stale weather answer".into());
            }
        }
        Msg::ClearRoute => {
            model.view.clear_route();
            model.error = None;
            sync_route_on_map(&model.view);
        }
        Msg::ToggleInstructions => model.view.toggle_instructions(),
        Msg::Recenter => recenter(&JsMap, model.view.center()),
        Msg::DeviceLocated(at) => {
            web_sys::console::debug_1(
                &format!("[frontend] device located lat={:.5} lng={:.5}", at.lat, at.lng).into(),
            );
            let effects = model.view.device_located(at);
            run_effects(effects, orders);
        }
        Msg::DeviceLocationFailed(reason) => {
            web_sys::console::error_1(
                &format!("[frontend] geolocation failed, keeping default center: {reason}").into(),
            );
            let effects = model.view.device_location_failed();
            run_effects(effects, orders);
        }
    }
}

fn run_effects(effects: Vec<Effect>, orders: &mut impl Orders<Msg>) {
    for effect in effects {
        match effect {
            Effect::FetchRoute { token, query } => {
                orders.perform_cmd(send_route_request(token, query));
            }
            Effect::LookupWeather { token, target } => {
                orders.perform_cmd(lookup_weather(token, target));
            }
            Effect::Recenter(center) => recenter(&JsMap, center),
        }
    }
}

async fn send_route_request(token: RequestToken, query: RouteQuery) -> Msg {
    web_sys::console::debug_1(
        &format!(
            "[frontend] sending route request {:?} -> {:?}",
            query.origin, query.destination
        )
        .into(),
    );
    let result = match Request::new(format!("{}/route", api_root()))
        .method(Method::Post)
        .json(&query)
    {
        Err(err) => Err(format!("{err:?}")),
        Ok(request) => fetch_json::<RouteResult>(request).await,
    };

    Msg::RouteFetched { token, result }
}

async fn lookup_weather(token: RequestToken, target: WeatherTarget) -> Msg {
    let root = api_root();
    let location = match target {
        WeatherTarget::Location(at) => Ok(at),
        WeatherTarget::Address(address) => geocode(&root, address).await,
    };
    let result = match location {
        Err(err) => Err(err),
        Ok(at) => fetch_json::<WeatherSnapshot>(Request::new(weather_url(&root, at))).await,
    };

    Msg::WeatherFetched { token, result }
}

async fn geocode(root: &str, address: String) -> Result<Coordinate, String> {
    match Request::new(format!("{root}/geocode"))
        .method(Method::Post)
        .json(&GeocodeRequest { address })
    {
        Err(err) => Err(format!("{err:?}")),
        Ok(request) => fetch_json::<GeocodeResponse>(request)
            .await
            .map(|resp| resp.location),
    }
}

async fn fetch_json<T: DeserializeOwned + 'static>(request: Request<'_>) -> Result<T, String> {
    match request.fetch().await {
        Err(err) => Err(format!("{err:?}")),
        Ok(raw) => match raw.check_status() {
            Err(status_err) => Err(format!("{status_err:?}")),
            Ok(resp) => resp.json::<T>().await.map_err(|err| format!("{err:?}")),
        },
    }
}

pub fn view(model: &Model) -> Node<Msg> {
    div![
        C!["app-container"],
        h1!["Route planner"],
        view_form(model),
        view_summary(model),
        view_instructions(model),
        view_weather(model),
    ]
}

fn view_form(model: &Model) -> Node<Msg> {
    let input_field = |placeholder: &str, value: &str, msg: fn(String) -> Msg| {
        div![
            C!["input-field"],
            input![
                attrs! {
                    At::Type => "text",
                    At::Placeholder => placeholder,
                    At::Value => value,
                    At::AutoComplete => "off",
                },
                input_ev(Ev::Input, msg),
            ]
        ]
    };

    form![
        C!["controls"],
        input_field("Origin", model.view.origin_text(), Msg::OriginChanged),
        input_field(
            "Destination",
            model.view.destination_text(),
            Msg::DestinationChanged
        ),
        button![
            "Calculate Route",
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::CalculateRoute
            }),
        ],
        button![
            "✕",
            C!["clear-btn"],
            attrs! { At::from("aria-label") => "clear route" },
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::ClearRoute
            }),
        ],
        if let Some(error) = &model.error {
            p![C!["error"], error]
        } else {
            empty![]
        }
    ]
}

fn view_summary(model: &Model) -> Node<Msg> {
    let (distance, duration) = model
        .view
        .summary()
        .map(|s| (s.distance_text.as_str(), s.duration_text.as_str()))
        .unwrap_or(("", ""));

    div![
        C!["summary"],
        span![format!("Distance: {distance}")],
        span![format!("Duration: {duration}")],
        button![
            "➤",
            C!["recenter-btn"],
            attrs! { At::from("aria-label") => "center back" },
            ev(Ev::Click, |_| Msg::Recenter),
        ],
    ]
}

fn view_instructions(model: &Model) -> Node<Msg> {
    let instructions = model.view.instructions();
    let panel = if model.view.instructions_visible() && !instructions.is_empty() {
        div![
            C!["instructions"],
            strong!["Turn-by-Turn Directions:"],
            ol![instructions.iter().map(|instruction| li![instruction])],
        ]
    } else {
        empty![]
    };

    div![
        panel,
        button![
            toggle_label(model.view.instructions_visible()),
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::ToggleInstructions
            }),
        ],
    ]
}

fn view_weather(model: &Model) -> Node<Msg> {
    match model.view.weather() {
        Some(weather) => div![
            C!["weather"],
            strong!["Current Weather:"],
            p![format!("Weather: {}", weather.condition_text)],
            small![format!("Temperature: {}°C", weather.temperature_celsius)],
        ],
        None => empty![],
    }
}

fn toggle_label(visible: bool) -> &'static str {
    if visible {
        "Hide Instructions"
    } else {
        "Show Instructions"
    }
}

fn sync_route_on_map(view: &ViewState) {
    let path: &[Coordinate] = view
        .route()
        .and_then(|route| route.primary())
        .map(|route| route.overview_path.as_slice())
        .unwrap_or_default();
    if let Ok(value) = to_value(path) {
        show_route_js(value);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    if let Ok(center) = to_value(&DEFAULT_CENTER) {
        init_map(center, RECENTER_ZOOM);
    }
    App::start("app", init, update, view);
}
