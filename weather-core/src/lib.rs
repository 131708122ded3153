//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration handling (endpoints, fallback proxies, device location)
//! - Ordered transport fallback over direct calls and proxies
//! - Geocoding, reverse geocoding and weather providers
//! - Weather code classification
//! - The lookup orchestrator and its observable state
//!
//! It is used by `weather-cli`, but can also be reused by other front-ends.

pub mod condition;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod transport;

pub use condition::{Condition, WeatherCategory, classify};
pub use config::{Config, Endpoints};
pub use error::{LookupError, PositionError};
pub use location::{ConfiguredLocator, DeviceLocator};
pub use model::{
    Coordinates, GeocodedPlace, LocationQuery, LookupFlow, ResolvedPlace, UNKNOWN_CITY,
    WeatherObservation, WeatherResult,
};
pub use orchestrator::{LookupOutcome, LookupState, Orchestrator, UiState};
pub use provider::{Geocoder, Providers, ReverseGeocoder, WeatherProvider};
pub use transport::{ProxyTemplate, Transport};
