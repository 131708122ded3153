use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, classify};

/// Name used when no provider can tell us where we are.
pub const UNKNOWN_CITY: &str = "Unknown City";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// What the user asked for in one lookup attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    ByName(String),
    ByCoordinates(Coordinates),
}

/// Which entry point started a lookup. Decides the weather transport order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFlow {
    ByName,
    ByCoordinates,
}

impl LocationQuery {
    pub fn flow(&self) -> LookupFlow {
        match self {
            LocationQuery::ByName(_) => LookupFlow::ByName,
            LocationQuery::ByCoordinates(_) => LookupFlow::ByCoordinates,
        }
    }
}

/// Canonical place label as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub name: String,
    pub admin_region: Option<String>,
    pub country: String,
}

impl ResolvedPlace {
    /// "name, region, country", skipping empty parts.
    pub fn label(&self) -> String {
        [Some(self.name.as_str()), self.admin_region.as_deref(), Some(self.country.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of a forward geocode: the place plus where it is.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub place: ResolvedPlace,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResult {
    pub place: ResolvedPlace,
    pub observation: WeatherObservation,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherResult {
    /// Build a result, substituting [`UNKNOWN_CITY`] for a blank place name.
    pub fn new(mut place: ResolvedPlace, observation: WeatherObservation) -> Self {
        if place.name.trim().is_empty() {
            place.name = UNKNOWN_CITY.to_string();
        }

        Self { place, observation, fetched_at: Utc::now() }
    }

    pub fn condition(&self) -> Condition {
        classify(self.observation.weather_code)
    }
}
