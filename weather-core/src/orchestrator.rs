//! Drives a lookup from user input to a committed outcome.
//!
//! Every lookup bumps a generation number in the shared state before it
//! starts. When it finishes it only writes its outcome back if no newer lookup
//! has started in the meantime; otherwise the result is dropped. In-flight
//! requests are never cancelled.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    condition::{DEFAULT_BACKDROP, WeatherCategory},
    error::LookupError,
    location::DeviceLocator,
    model::{LocationQuery, LookupFlow, WeatherResult},
    provider::Providers,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum LookupOutcome {
    InProgress,
    Success(WeatherResult),
    Failure(LookupError),
}

impl LookupOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            LookupOutcome::InProgress => "in_progress",
            LookupOutcome::Success(_) => "success",
            LookupOutcome::Failure(_) => "failure",
        }
    }

    pub fn result(&self) -> Option<&WeatherResult> {
        match self {
            LookupOutcome::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<LookupError> {
        match self {
            LookupOutcome::Failure(err) => Some(*err),
            _ => None,
        }
    }
}

impl From<Result<WeatherResult, LookupError>> for LookupOutcome {
    fn from(result: Result<WeatherResult, LookupError>) -> Self {
        match result {
            Ok(result) => LookupOutcome::Success(result),
            Err(err) => LookupOutcome::Failure(err),
        }
    }
}

/// What the presentation layer should be showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    /// No lookup has ever been started.
    Welcome,
    Loading,
    /// A success or a failure is on screen.
    Presenting,
}

/// The single "current outcome" cell, plus what's needed to render it.
#[derive(Debug, Clone, Default)]
pub struct LookupState {
    generation: u64,
    flow: Option<LookupFlow>,
    outcome: Option<LookupOutcome>,
    displayed: Option<WeatherResult>,
}

impl LookupState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outcome(&self) -> Option<&LookupOutcome> {
        self.outcome.as_ref()
    }

    /// Most recent successful result. Survives later failures.
    pub fn displayed(&self) -> Option<&WeatherResult> {
        self.displayed.as_ref()
    }

    pub fn ui_state(&self) -> UiState {
        match &self.outcome {
            None => UiState::Welcome,
            Some(LookupOutcome::InProgress) => UiState::Loading,
            Some(_) => UiState::Presenting,
        }
    }

    /// Loading or failure text to show, if any.
    pub fn status_message(&self) -> Option<String> {
        match (&self.outcome, self.flow) {
            (Some(LookupOutcome::InProgress), Some(LookupFlow::ByCoordinates)) => {
                Some("Getting your weather... please wait a moment".to_string())
            }
            (Some(LookupOutcome::InProgress), _) => {
                Some("Fetching weather data… please wait!".to_string())
            }
            (Some(LookupOutcome::Failure(err)), _) => Some(err.to_string()),
            _ => None,
        }
    }

    /// Category behind the current presentation key, once something succeeded.
    pub fn presented_category(&self) -> Option<WeatherCategory> {
        self.displayed.as_ref().map(|result| result.condition().category)
    }

    pub fn backdrop_key(&self) -> &'static str {
        self.presented_category().map_or(DEFAULT_BACKDROP, |category| category.backdrop_key())
    }
}

/// One orchestrator per UI session.
#[derive(Debug)]
pub struct Orchestrator {
    providers: Providers,
    locator: Arc<dyn DeviceLocator>,
    state: watch::Sender<LookupState>,
}

impl Orchestrator {
    pub fn new(providers: Providers, locator: Arc<dyn DeviceLocator>) -> Self {
        let (state, _) = watch::channel(LookupState::default());
        Self { providers, locator, state }
    }

    /// Receiver that observes every committed state change.
    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LookupState {
        self.state.borrow().clone()
    }

    /// Look up the weather for a free-text place name.
    ///
    /// Returns this run's outcome. It's only committed to the shared state
    /// when no newer lookup was started meanwhile.
    pub async fn lookup_by_name(&self, text: &str) -> LookupOutcome {
        let generation = self.begin(LookupFlow::ByName);

        let query = text.trim();
        if query.is_empty() {
            return self.commit(generation, Err(LookupError::EmptyQuery));
        }

        let result = self.resolve(&LocationQuery::ByName(query.to_string())).await;
        self.commit(generation, result)
    }

    /// Look up the weather where the device currently is.
    pub async fn lookup_by_current_location(&self) -> LookupOutcome {
        let generation = self.begin(LookupFlow::ByCoordinates);

        if !self.locator.is_supported() {
            return self.commit(generation, Err(LookupError::GeolocationUnsupported));
        }

        let at = match self.locator.current_position().await {
            Ok(at) => at,
            Err(err) => {
                warn!(generation, error = %err, "device position unavailable");
                return self.commit(generation, Err(err.into()));
            }
        };

        let result = self.resolve(&LocationQuery::ByCoordinates(at)).await;
        self.commit(generation, result)
    }

    async fn resolve(&self, query: &LocationQuery) -> Result<WeatherResult, LookupError> {
        let (place, at) = match query {
            LocationQuery::ByName(name) => {
                let found = self.providers.geocoder.search(name).await?;
                (found.place, found.coordinates)
            }
            LocationQuery::ByCoordinates(at) => {
                (self.providers.reverse_geocoder.reverse(*at).await?, *at)
            }
        };

        let observation = self.providers.weather.current(at, query.flow()).await?;

        Ok(WeatherResult::new(place, observation))
    }

    fn begin(&self, flow: LookupFlow) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.flow = Some(flow);
            state.outcome = Some(LookupOutcome::InProgress);
        });

        debug!(generation, ?flow, "lookup started");
        generation
    }

    fn commit(&self, generation: u64, result: Result<WeatherResult, LookupError>) -> LookupOutcome {
        let outcome = LookupOutcome::from(result);

        let applied = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            if let LookupOutcome::Success(result) = &outcome {
                state.displayed = Some(result.clone());
            }
            state.outcome = Some(outcome.clone());
            true
        });

        if applied {
            info!(generation, outcome = outcome.kind(), "lookup finished");
        } else {
            debug!(generation, outcome = outcome.kind(), "discarding stale lookup outcome");
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::PositionError,
        model::{Coordinates, GeocodedPlace, ResolvedPlace, UNKNOWN_CITY, WeatherObservation},
        provider::{Geocoder, ReverseGeocoder, WeatherProvider},
    };
    use async_trait::async_trait;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Debug, Default)]
    struct FakeGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(&self, name: &str) -> Result<GeocodedPlace, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match name {
                "Atlantis" => return Err(LookupError::NotFound),
                "Offline" => return Err(LookupError::NetworkError),
                "Slowtown" => tokio::time::sleep(Duration::from_millis(200)).await,
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }

            Ok(GeocodedPlace {
                place: ResolvedPlace {
                    name: name.to_string(),
                    admin_region: None,
                    country: "Testland".into(),
                },
                coordinates: Coordinates::new(10.0, 20.0),
            })
        }
    }

    #[derive(Debug, Default)]
    struct FakeReverseGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReverseGeocoder for FakeReverseGeocoder {
        async fn reverse(&self, _at: Coordinates) -> Result<ResolvedPlace, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ResolvedPlace { name: String::new(), admin_region: None, country: "India".into() })
        }
    }

    #[derive(Debug)]
    struct FakeWeather {
        code: i32,
        failure: Option<LookupError>,
        flows: Mutex<Vec<LookupFlow>>,
    }

    impl FakeWeather {
        fn with_code(code: i32) -> Self {
            Self { code, failure: None, flows: Mutex::new(Vec::new()) }
        }

        fn failing(err: LookupError) -> Self {
            Self { code: 0, failure: Some(err), flows: Mutex::new(Vec::new()) }
        }

        fn flows(&self) -> Vec<LookupFlow> {
            self.flows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current(
            &self,
            _at: Coordinates,
            flow: LookupFlow,
        ) -> Result<WeatherObservation, LookupError> {
            self.flows.lock().unwrap().push(flow);
            if let Some(err) = self.failure {
                return Err(err);
            }
            Ok(WeatherObservation { temperature_c: 21.0, wind_speed_kmh: 7.0, weather_code: self.code })
        }
    }

    #[derive(Debug)]
    struct FakeLocator {
        supported: bool,
        position: Result<Coordinates, PositionError>,
    }

    #[async_trait]
    impl DeviceLocator for FakeLocator {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn current_position(&self) -> Result<Coordinates, PositionError> {
            self.position.clone()
        }
    }

    struct Harness {
        geocoder: Arc<FakeGeocoder>,
        reverse: Arc<FakeReverseGeocoder>,
        weather: Arc<FakeWeather>,
        orchestrator: Orchestrator,
    }

    fn harness(weather: FakeWeather, locator: FakeLocator) -> Harness {
        let geocoder = Arc::new(FakeGeocoder::default());
        let reverse = Arc::new(FakeReverseGeocoder::default());
        let weather = Arc::new(weather);

        let providers = Providers {
            geocoder: geocoder.clone(),
            reverse_geocoder: reverse.clone(),
            weather: weather.clone(),
        };

        Harness { geocoder, reverse, weather, orchestrator: Orchestrator::new(providers, Arc::new(locator)) }
    }

    fn granted() -> FakeLocator {
        FakeLocator { supported: true, position: Ok(Coordinates::new(18.52, 73.86)) }
    }

    #[test]
    fn starts_in_welcome() {
        let h = harness(FakeWeather::with_code(0), granted());
        let state = h.orchestrator.snapshot();

        assert_eq!(state.ui_state(), UiState::Welcome);
        assert_eq!(state.backdrop_key(), DEFAULT_BACKDROP);
        assert!(state.status_message().is_none());
    }

    #[tokio::test]
    async fn blank_queries_fail_without_provider_calls() {
        let h = harness(FakeWeather::with_code(0), granted());

        for text in ["", "   ", "\t\n"] {
            let outcome = h.orchestrator.lookup_by_name(text).await;
            assert_eq!(outcome, LookupOutcome::Failure(LookupError::EmptyQuery));
        }

        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
        assert!(h.weather.flows().is_empty());

        let state = h.orchestrator.snapshot();
        assert_eq!(state.ui_state(), UiState::Presenting);
        assert_eq!(state.outcome(), Some(&LookupOutcome::Failure(LookupError::EmptyQuery)));
    }

    #[tokio::test]
    async fn by_name_success_classifies_and_uses_name_flow() {
        let h = harness(FakeWeather::with_code(65), granted());

        let outcome = h.orchestrator.lookup_by_name("  London ").await;
        let result = outcome.result().expect("lookup should succeed");

        assert_eq!(result.place.name, "London");
        assert_eq!(result.condition().category, WeatherCategory::Rain);
        assert_eq!(h.weather.flows(), vec![LookupFlow::ByName]);

        let state = h.orchestrator.snapshot();
        assert_eq!(state.presented_category(), Some(WeatherCategory::Rain));
        assert_eq!(state.backdrop_key(), "rainy");
    }

    #[tokio::test]
    async fn not_found_keeps_previous_result_on_screen() {
        let h = harness(FakeWeather::with_code(1), granted());

        h.orchestrator.lookup_by_name("Paris").await;
        let outcome = h.orchestrator.lookup_by_name("Atlantis").await;
        assert_eq!(outcome.error(), Some(LookupError::NotFound));

        let state = h.orchestrator.snapshot();
        assert_eq!(state.outcome(), Some(&LookupOutcome::Failure(LookupError::NotFound)));
        assert_eq!(state.displayed().map(|r| r.place.name.as_str()), Some("Paris"));
        assert_eq!(state.backdrop_key(), "sunny");
        assert!(state.status_message().unwrap().contains("can't find that city"));
    }

    #[tokio::test]
    async fn geocoder_network_error_skips_weather() {
        let h = harness(FakeWeather::with_code(1), granted());

        let outcome = h.orchestrator.lookup_by_name("Offline").await;

        assert_eq!(outcome.error(), Some(LookupError::NetworkError));
        assert!(h.weather.flows().is_empty());
    }

    #[tokio::test]
    async fn weather_failure_is_reported() {
        let h = harness(FakeWeather::failing(LookupError::NoData), granted());

        let outcome = h.orchestrator.lookup_by_name("Lima").await;

        assert_eq!(outcome.error(), Some(LookupError::NoData));
        assert!(h.orchestrator.snapshot().displayed().is_none());
    }

    #[tokio::test]
    async fn last_request_wins() {
        let h = harness(FakeWeather::with_code(3), granted());

        let (slow, fast) = tokio::join!(
            h.orchestrator.lookup_by_name("Slowtown"),
            h.orchestrator.lookup_by_name("Fastville"),
        );

        // Both runs complete, but only the newer one is committed.
        assert_eq!(slow.result().map(|r| r.place.name.as_str()), Some("Slowtown"));
        assert_eq!(fast.result().map(|r| r.place.name.as_str()), Some("Fastville"));

        let state = h.orchestrator.snapshot();
        assert_eq!(state.generation(), 2);
        assert_eq!(state.displayed().map(|r| r.place.name.as_str()), Some("Fastville"));
        assert_eq!(state.outcome().and_then(|o| o.result()).map(|r| r.place.name.as_str()), Some("Fastville"));
    }

    #[tokio::test]
    async fn stale_failure_does_not_overwrite_newer_loading_state() {
        let h = harness(FakeWeather::with_code(3), granted());
        let mut rx = h.orchestrator.subscribe();

        let (_, _) = tokio::join!(h.orchestrator.lookup_by_name("Slowtown"), async {
            // Starts after Slowtown and fails quickly; Slowtown then finishes
            // last but must not replace this newer outcome.
            h.orchestrator.lookup_by_name("Atlantis").await
        });

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.outcome(), Some(&LookupOutcome::Failure(LookupError::NotFound)));
        assert!(state.displayed().is_none());
    }

    #[tokio::test]
    async fn current_location_unsupported() {
        let locator = FakeLocator {
            supported: false,
            position: Err(PositionError::Unavailable("none".into())),
        };
        let h = harness(FakeWeather::with_code(0), locator);

        let outcome = h.orchestrator.lookup_by_current_location().await;

        assert_eq!(outcome.error(), Some(LookupError::GeolocationUnsupported));
        assert_eq!(h.reverse.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn current_location_denied_never_touches_providers() {
        let locator = FakeLocator { supported: true, position: Err(PositionError::PermissionDenied) };
        let h = harness(FakeWeather::with_code(0), locator);

        let outcome = h.orchestrator.lookup_by_current_location().await;

        assert_eq!(outcome.error(), Some(LookupError::PermissionDenied));
        assert_eq!(h.reverse.calls.load(Ordering::SeqCst), 0);
        assert!(h.weather.flows().is_empty());
    }

    #[tokio::test]
    async fn current_location_success_uses_coordinates_flow() {
        let h = harness(FakeWeather::with_code(95), granted());

        let outcome = h.orchestrator.lookup_by_current_location().await;
        let result = outcome.result().expect("lookup should succeed");

        // Reverse geocoder reported no name.
        assert_eq!(result.place.name, UNKNOWN_CITY);
        assert_eq!(result.condition().category, WeatherCategory::Storm);
        assert_eq!(h.reverse.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.weather.flows(), vec![LookupFlow::ByCoordinates]);
        assert_eq!(h.orchestrator.snapshot().backdrop_key(), "storm");
    }

    #[test]
    fn loading_message_depends_on_flow() {
        let mut state = LookupState {
            generation: 1,
            flow: Some(LookupFlow::ByCoordinates),
            outcome: Some(LookupOutcome::InProgress),
            displayed: None,
        };
        assert_eq!(state.ui_state(), UiState::Loading);
        assert!(state.status_message().unwrap().starts_with("Getting your weather"));

        state.flow = Some(LookupFlow::ByName);
        assert!(state.status_message().unwrap().starts_with("Fetching weather data"));
    }
}
