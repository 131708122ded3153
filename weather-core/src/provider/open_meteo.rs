use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::LookupError,
    model::{Coordinates, GeocodedPlace, LookupFlow, ResolvedPlace, WeatherObservation},
    transport::{ProxyTemplate, Transport, fetch_first_success},
};

use super::{Geocoder, WeatherProvider};

/// Place-name search against the Open-Meteo geocoding API.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    search_url: Url,
    transports: Vec<Transport>,
}

impl OpenMeteoGeocoder {
    /// Searches go direct first, then through `proxies` in order.
    pub fn new(http: Client, search_url: Url, proxies: &[ProxyTemplate]) -> Self {
        Self { http, search_url, transports: Transport::direct_then(proxies) }
    }

    fn request_url(&self, name: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair("name", name).append_pair("count", "1");
        url
    }
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: String,
    admin1: Option<String>,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    // Open-Meteo omits the field entirely when nothing matches.
    #[serde(default)]
    results: Option<Vec<GeoResult>>,
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, name: &str) -> Result<GeocodedPlace, LookupError> {
        let url = self.request_url(name);

        let parsed: GeoSearchResponse =
            fetch_first_success(&self.http, &url, &self.transports, "geocoding").await?;

        let first = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(LookupError::NotFound)?;

        debug!(query = name, found = %first.name, "geocoded place");

        Ok(GeocodedPlace {
            place: ResolvedPlace {
                name: first.name,
                admin_region: first.admin1.filter(|s| !s.is_empty()),
                country: first.country,
            },
            coordinates: Coordinates::new(first.latitude, first.longitude),
        })
    }
}

/// Current conditions from the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    http: Client,
    forecast_url: Url,
    proxies: Vec<ProxyTemplate>,
}

impl OpenMeteoWeather {
    pub fn new(http: Client, forecast_url: Url, proxies: Vec<ProxyTemplate>) -> Self {
        Self { http, forecast_url, proxies }
    }

    /// The by-name flow never goes direct: it goes through the proxies only.
    /// The by-coordinates flow tries direct first and falls back to proxies.
    pub fn transports(&self, flow: LookupFlow) -> Vec<Transport> {
        match flow {
            LookupFlow::ByName => Transport::proxies_only(&self.proxies),
            LookupFlow::ByCoordinates => Transport::direct_then(&self.proxies),
        }
    }

    fn request_url(&self, at: Coordinates) -> Url {
        let mut url = self.forecast_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &at.latitude.to_string())
            .append_pair("longitude", &at.longitude.to_string())
            .append_pair("current_weather", "true");
        url
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    async fn current(
        &self,
        at: Coordinates,
        flow: LookupFlow,
    ) -> Result<WeatherObservation, LookupError> {
        let url = self.request_url(at);
        let transports = self.transports(flow);

        let parsed: ForecastResponse =
            fetch_first_success(&self.http, &url, &transports, "weather").await?;

        let current = parsed.current_weather.ok_or(LookupError::NoData)?;

        Ok(WeatherObservation {
            temperature_c: current.temperature,
            wind_speed_kmh: current.windspeed,
            weather_code: current.weathercode,
        })
    }
}
