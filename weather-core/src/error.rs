use serde::Serialize;
use thiserror::Error;

/// Every way a lookup can fail.
///
/// The `Display` text is what the presentation layer shows to the user, so it
/// must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupError {
    #[error("Please enter a city name.")]
    EmptyQuery,

    #[error("Hmm… can't find that city. Please check the spelling and try again!")]
    NotFound,

    #[error("No weather data available for this location right now.")]
    NoData,

    #[error("Couldn't connect to the weather service. Please check your internet or try again!")]
    NetworkError,

    #[error("Geolocation is not supported on this device.")]
    GeolocationUnsupported,

    #[error("Please allow location access to detect your weather.")]
    PermissionDenied,
}

impl LookupError {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupError::EmptyQuery => "empty_query",
            LookupError::NotFound => "not_found",
            LookupError::NoData => "no_data",
            LookupError::NetworkError => "network_error",
            LookupError::GeolocationUnsupported => "geolocation_unsupported",
            LookupError::PermissionDenied => "permission_denied",
        }
    }
}

/// Failure reported by a device locator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

// Any locator failure surfaces as the permission prompt message.
impl From<PositionError> for LookupError {
    fn from(_: PositionError) -> Self {
        LookupError::PermissionDenied
    }
}
