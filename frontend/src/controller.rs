//! View state of the route planner and the commands that change it.
//!
//! Nothing here touches the browser. Commands return [`Effect`]s that the
//! seed shell runs; each asynchronous effect carries a [`RequestToken`] and
//! its answer is only applied while that token is still the latest one of
//! its kind. Clearing the route retires every outstanding token.

use shared::{
    Coordinate, DEFAULT_CENTER, InstructionList, NormalizeError, RECENTER_ZOOM, RouteQuery,
    RouteResult, RouteSummary, WeatherSnapshot, normalize,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Querying,
    Ready,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RequestToken(u64);

#[derive(Clone, PartialEq, Debug)]
pub enum WeatherTarget {
    /// Geocode first, then look the weather up at the result.
    Address(String),
    Location(Coordinate),
}

#[derive(Clone, PartialEq, Debug)]
pub enum Effect {
    FetchRoute {
        token: RequestToken,
        query: RouteQuery,
    },
    LookupWeather {
        token: RequestToken,
        target: WeatherTarget,
    },
    Recenter(Coordinate),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    #[error("route request failed: {0}")]
    RouteFailed(String),
    #[error(transparent)]
    InvalidRoute(#[from] NormalizeError),
}

/// The map widget, as far as the controller is concerned.
pub trait MapHandle {
    fn pan_to(&self, center: Coordinate);
    fn set_zoom(&self, zoom: u8);
}

pub fn recenter(map: &impl MapHandle, center: Coordinate) {
    map.pan_to(center);
    map.set_zoom(RECENTER_ZOOM);
}

#[derive(Clone, Debug)]
struct LoadedRoute {
    result: RouteResult,
    summary: RouteSummary,
    instructions: InstructionList,
}

#[derive(Clone, Debug)]
pub struct ViewState {
    origin_text: String,
    destination_text: String,
    phase: Phase,
    loaded: Option<LoadedRoute>,
    weather: Option<WeatherSnapshot>,
    instructions_visible: bool,
    center: Coordinate,
    last_token: u64,
    pending_route: Option<RequestToken>,
    pending_weather: Option<RequestToken>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            origin_text: String::new(),
            destination_text: String::new(),
            phase: Phase::Idle,
            loaded: None,
            weather: None,
            instructions_visible: true,
            center: DEFAULT_CENTER,
            last_token: 0,
            pending_route: None,
            pending_weather: None,
        }
    }
}

impl ViewState {
    pub fn origin_text(&self) -> &str {
        &self.origin_text
    }

    pub fn destination_text(&self) -> &str {
        &self.destination_text
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.loaded.as_ref().map(|loaded| &loaded.result)
    }

    pub fn summary(&self) -> Option<&RouteSummary> {
        self.loaded.as_ref().map(|loaded| &loaded.summary)
    }

    pub fn instructions(&self) -> &[String] {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.instructions.as_slice())
            .unwrap_or_default()
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    pub fn instructions_visible(&self) -> bool {
        self.instructions_visible
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn set_origin(&mut self, text: String) {
        self.origin_text = text;
    }

    pub fn set_destination(&mut self, text: String) {
        self.destination_text = text;
    }

    /// Starts a driving route request for the current inputs. Blank inputs
    /// make this a no-op.
    pub fn calculate_route(&mut self) -> Vec<Effect> {
        let query = RouteQuery::driving(self.origin_text.clone(), self.destination_text.clone());
        if !query.is_complete() {
            return Vec::new();
        }

        let token = self.issue_token();
        self.pending_route = Some(token);
        self.phase = Phase::Querying;
        vec![Effect::FetchRoute { token, query }]
    }

    /// Applies the answer to a route request.
    ///
    /// A successful answer replaces the held route and asks for the weather at
    /// the origin. A failed or unusable answer drops back to `Idle` with the
    /// route cleared. Answers to superseded requests are ignored.
    pub fn route_resolved(
        &mut self,
        token: RequestToken,
        result: Result<RouteResult, String>,
    ) -> Result<Vec<Effect>, ControllerError> {
        if self.pending_route != Some(token) {
            return Ok(Vec::new());
        }
        self.pending_route = None;

        let outcome = result
            .map_err(ControllerError::RouteFailed)
            .and_then(|result| {
                let (summary, instructions) = normalize(&result)?;
                Ok(LoadedRoute {
                    result,
                    summary,
                    instructions,
                })
            });

        match outcome {
            Ok(loaded) => {
                self.loaded = Some(loaded);
                self.phase = Phase::Ready;

                let weather_token = self.issue_token();
                self.pending_weather = Some(weather_token);
                Ok(vec![Effect::LookupWeather {
                    token: weather_token,
                    target: WeatherTarget::Address(self.origin_text.clone()),
                }])
            }
            Err(err) => {
                self.loaded = None;
                self.phase = Phase::Idle;
                Err(err)
            }
        }
    }

    /// Applies the answer to a weather lookup. Returns whether it was the
    /// latest lookup. A failure leaves the weather as it was.
    pub fn weather_resolved(
        &mut self,
        token: RequestToken,
        result: Result<WeatherSnapshot, String>,
    ) -> bool {
        if self.pending_weather != Some(token) {
            return false;
        }
        self.pending_weather = None;

        if let Ok(snapshot) = result {
            self.weather = Some(snapshot);
        }
        true
    }

    pub fn clear_route(&mut self) {
        self.loaded = None;
        self.weather = None;
        self.origin_text.clear();
        self.destination_text.clear();
        self.phase = Phase::Idle;
        self.pending_route = None;
        self.pending_weather = None;
    }

    pub fn toggle_instructions(&mut self) {
        self.instructions_visible = !self.instructions_visible;
    }

    /// The device reported its position: center there and fetch its weather.
    pub fn device_located(&mut self, at: Coordinate) -> Vec<Effect> {
        self.center = at;
        let token = self.issue_token();
        self.pending_weather = Some(token);
        vec![
            Effect::Recenter(at),
            Effect::LookupWeather {
                token,
                target: WeatherTarget::Location(at),
            },
        ]
    }

    /// Geolocation was refused or is unsupported: the map stays on the
    /// current center and nothing is fetched.
    pub fn device_location_failed(&mut self) -> Vec<Effect> {
        Vec::new()
    }

    fn issue_token(&mut self) -> RequestToken {
        self.last_token += 1;
        RequestToken(self.last_token)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use shared::{Leg, Route, Step, TextValue};

    use super::*;

    fn text(text: &str) -> TextValue {
        TextValue {
            text: text.into(),
            value: 0,
        }
    }

    fn paris_lyon() -> RouteResult {
        let step = |html: &str| Step {
            instruction_html: html.into(),
            distance: text("1 km"),
            duration: text("1 min"),
        };
        RouteResult {
            routes: vec![Route {
                summary: "A6".into(),
                legs: vec![Leg {
                    steps: vec![
                        step("Head south<br>"),
                        step("Merge onto A6"),
                        step("Arrive at destination"),
                    ],
                    distance: text("465 km"),
                    duration: text("4 hours 30 mins"),
                    start_address: "Paris, France".into(),
                    end_address: "Lyon, France".into(),
                    start_location: None,
                    end_location: None,
                }],
                overview_path: Vec::new(),
            }],
        }
    }

    fn with_inputs(origin: &str, destination: &str) -> ViewState {
        let mut state = ViewState::default();
        state.set_origin(origin.into());
        state.set_destination(destination.into());
        state
    }

    fn route_token(effects: &[Effect]) -> RequestToken {
        match effects {
            [Effect::FetchRoute { token, .. }] => *token,
            other => panic!("expected one route fetch, got {other:?}"),
        }
    }

    fn weather_token(effects: &[Effect]) -> RequestToken {
        effects
            .iter()
            .find_map(|effect| match effect {
                Effect::LookupWeather { token, .. } => Some(*token),
                _ => None,
            })
            .expect("weather lookup effect")
    }

    fn ready_state() -> (ViewState, RequestToken) {
        let mut state = with_inputs("Paris, France", "Lyon, France");
        let token = route_token(&state.calculate_route());
        let effects = state.route_resolved(token, Ok(paris_lyon())).unwrap();
        let weather = weather_token(&effects);
        (state, weather)
    }

    #[test]
    fn starts_idle_with_default_center() {
        let state = ViewState::default();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.center(), DEFAULT_CENTER);
        assert!(state.instructions_visible());
        assert!(state.summary().is_none());
        assert!(state.instructions().is_empty());
    }

    #[test]
    fn blank_inputs_are_a_no_op() {
        for (origin, destination) in [("", "Lyon, France"), ("Paris, France", ""), ("  ", "\t")] {
            let mut state = with_inputs(origin, destination);
            assert!(state.calculate_route().is_empty());
            assert_eq!(state.phase(), Phase::Idle);
        }
    }

    #[test]
    fn calculate_route_requests_driving_with_alternatives() {
        let mut state = with_inputs("Paris, France", "Lyon, France");
        let effects = state.calculate_route();

        assert_eq!(state.phase(), Phase::Querying);
        match effects.as_slice() {
            [Effect::FetchRoute { query, .. }] => {
                assert_eq!(query, &RouteQuery::driving("Paris, France", "Lyon, France"));
                assert!(query.provide_route_alternatives);
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn paris_to_lyon_end_to_end() {
        let mut state = with_inputs("Paris, France", "Lyon, France");
        let token = route_token(&state.calculate_route());
        let effects = state.route_resolved(token, Ok(paris_lyon())).unwrap();

        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(
            state.summary(),
            Some(&RouteSummary {
                distance_text: "465 km".into(),
                duration_text: "4 hours 30 mins".into(),
            })
        );
        assert_eq!(
            state.instructions(),
            ["Head south", "Merge onto A6", "Arrive at destination"]
        );
        match effects.as_slice() {
            [Effect::LookupWeather { target, .. }] => {
                assert_eq!(target, &WeatherTarget::Address("Paris, France".into()));
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn weather_lookup_success_is_stored() {
        let (mut state, weather) = ready_state();
        let snapshot = WeatherSnapshot {
            condition_text: "Clear".into(),
            temperature_celsius: 21,
        };
        assert!(state.weather_resolved(weather, Ok(snapshot.clone())));
        assert_eq!(state.weather(), Some(&snapshot));
    }

    #[test]
    fn weather_failure_keeps_route() {
        let (mut state, weather) = ready_state();
        assert!(state.weather_resolved(weather, Err("HTTP 500".into())));

        assert!(state.weather().is_none());
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.summary().map(|s| s.distance_text.as_str()), Some("465 km"));
        assert_eq!(state.instructions().len(), 3);
    }

    #[test]
    fn routing_failure_reverts_to_idle() {
        let (mut state, _) = ready_state();
        let token = route_token(&state.calculate_route());
        let err = state
            .route_resolved(token, Err("network down".into()))
            .unwrap_err();

        assert_eq!(err, ControllerError::RouteFailed("network down".into()));
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.route().is_none());
        assert!(state.summary().is_none());
        assert!(state.instructions().is_empty());
    }

    #[test]
    fn empty_route_result_is_a_failure() {
        let mut state = with_inputs("Paris, France", "Lyon, France");
        let token = route_token(&state.calculate_route());
        let err = state
            .route_resolved(token, Ok(RouteResult::default()))
            .unwrap_err();

        assert!(matches!(err, ControllerError::InvalidRoute(_)));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn requery_keeps_old_route_until_answer() {
        let (mut state, _) = ready_state();
        state.set_destination("Marseille, France".into());
        let token = route_token(&state.calculate_route());

        assert_eq!(state.phase(), Phase::Querying);
        assert!(state.summary().is_some());

        let mut marseille = paris_lyon();
        marseille.routes[0].legs[0].distance = text("775 km");
        state.route_resolved(token, Ok(marseille)).unwrap();
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.summary().unwrap().distance_text, "775 km");
    }

    #[test]
    fn clear_route_from_every_phase() {
        let mut idle = with_inputs("Paris, France", "Lyon, France");
        let mut querying = with_inputs("Paris, France", "Lyon, France");
        querying.calculate_route();
        let (mut ready, weather) = ready_state();
        ready.weather_resolved(
            weather,
            Ok(WeatherSnapshot {
                condition_text: "Rain".into(),
                temperature_celsius: 9,
            }),
        );

        for state in [&mut idle, &mut querying, &mut ready] {
            state.clear_route();
            assert_eq!(state.phase(), Phase::Idle);
            assert!(state.summary().is_none());
            assert!(state.instructions().is_empty());
            assert!(state.weather().is_none());
            assert_eq!(state.origin_text(), "");
            assert_eq!(state.destination_text(), "");
        }
    }

    #[test]
    fn route_answer_after_clear_is_ignored() {
        let mut state = with_inputs("Paris, France", "Lyon, France");
        let token = route_token(&state.calculate_route());
        state.clear_route();

        let effects = state.route_resolved(token, Ok(paris_lyon())).unwrap();
        assert!(effects.is_empty());
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.summary().is_none());
    }

    #[test]
    fn superseded_route_answer_is_ignored() {
        let mut state = with_inputs("Paris, France", "Lyon, France");
        let first = route_token(&state.calculate_route());
        let second = route_token(&state.calculate_route());

        assert!(state.route_resolved(first, Ok(paris_lyon())).unwrap().is_empty());
        assert_eq!(state.phase(), Phase::Querying);

        state.route_resolved(second, Ok(paris_lyon())).unwrap();
        assert_eq!(state.phase(), Phase::Ready);
    }

    #[test]
    fn weather_answer_after_clear_is_ignored() {
        let (mut state, weather) = ready_state();
        state.clear_route();

        let applied = state.weather_resolved(
            weather,
            Ok(WeatherSnapshot {
                condition_text: "Clear".into(),
                temperature_celsius: 20,
            }),
        );
        assert!(!applied);
        assert!(state.weather().is_none());
    }

    #[test]
    fn toggle_twice_restores_visibility() {
        let (mut state, _) = ready_state();
        let before = state.clone();

        state.toggle_instructions();
        assert!(!state.instructions_visible());
        state.toggle_instructions();

        assert_eq!(state.instructions_visible(), before.instructions_visible());
        assert_eq!(state.phase(), before.phase());
        assert_eq!(state.summary(), before.summary());
        assert_eq!(state.instructions(), before.instructions());
        assert_eq!(state.origin_text(), before.origin_text());
    }

    #[derive(Default)]
    struct RecordingMap {
        calls: RefCell<Vec<String>>,
    }

    impl MapHandle for RecordingMap {
        fn pan_to(&self, center: Coordinate) {
            self.calls
                .borrow_mut()
                .push(format!("pan {} {}", center.lat, center.lng));
        }

        fn set_zoom(&self, zoom: u8) {
            self.calls.borrow_mut().push(format!("zoom {zoom}"));
        }
    }

    #[test]
    fn recenter_pans_then_zooms() {
        let map = RecordingMap::default();
        recenter(&map, DEFAULT_CENTER);
        assert_eq!(
            map.calls.into_inner(),
            vec!["pan 48.8584 2.2945".to_string(), "zoom 15".to_string()]
        );
    }

    #[test]
    fn device_location_recenters_and_fetches_weather() {
        let mut state = ViewState::default();
        let here = Coordinate {
            lat: 45.764,
            lng: 4.8357,
        };
        let effects = state.device_located(here);

        assert_eq!(state.center(), here);
        assert_eq!(effects[0], Effect::Recenter(here));
        assert!(matches!(
            &effects[1],
            Effect::LookupWeather {
                target: WeatherTarget::Location(at),
                ..
            } if *at == here
        ));
    }

    #[test]
    fn device_location_failure_keeps_default_center() {
        let mut state = ViewState::default();

        assert!(state.device_location_failed().is_empty());
        assert_eq!(state.center(), DEFAULT_CENTER);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.weather().is_none());
        assert!(state.summary().is_none());
    }

    #[test]
    fn device_location_failure_leaves_loaded_route_alone() {
        let (mut state, weather) = ready_state();
        let snapshot = WeatherSnapshot {
            condition_text: "Clouds".into(),
            temperature_celsius: 17,
        };
        assert!(state.weather_resolved(weather, Ok(snapshot.clone())));
        let summary = state.summary().cloned();

        assert!(state.device_location_failed().is_empty());
        assert_eq!(state.center(), DEFAULT_CENTER);
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.weather(), Some(&snapshot));
        assert_eq!(state.summary().cloned(), summary);
        assert_eq!(state.instructions().len(), 3);
    }

    #[test]
    fn later_weather_lookup_wins() {
        let mut state = ViewState::default();
        let device = weather_token(&state.device_located(DEFAULT_CENTER));

        state.set_origin("Paris, France".into());
        state.set_destination("Lyon, France".into());
        let route = route_token(&state.calculate_route());
        let origin = weather_token(&state.route_resolved(route, Ok(paris_lyon())).unwrap());

        let stale = WeatherSnapshot {
            condition_text: "Fog".into(),
            temperature_celsius: 3,
        };
        assert!(!state.weather_resolved(device, Ok(stale)));
        assert!(state.weather_resolved(
            origin,
            Ok(WeatherSnapshot {
                condition_text: "Clear".into(),
                temperature_celsius: 21,
            })
        ));
        assert_eq!(state.weather().unwrap().condition_text, "Clear");
    }

    #[test]
    fn superseded_device_weather_is_not_restored_when_origin_lookup_fails() {
        let mut state = ViewState::default();
        let device = weather_token(&state.device_located(DEFAULT_CENTER));

        state.set_origin("Nowhere".into());
        state.set_destination("Lyon, France".into());
        let route = route_token(&state.calculate_route());
        let origin = weather_token(&state.route_resolved(route, Ok(paris_lyon())).unwrap());

        let device_weather = WeatherSnapshot {
            condition_text: "Rain".into(),
            temperature_celsius: 9,
        };
        assert!(!state.weather_resolved(device, Ok(device_weather)));
        assert!(state.weather_resolved(origin, Err("no geocoding results".into())));
        assert!(state.weather().is_none());
    }
}
