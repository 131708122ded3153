use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::LookupError,
    model::{Coordinates, GeocodedPlace, LookupFlow, ResolvedPlace, WeatherObservation},
    provider::{
        bigdatacloud::BigDataCloudReverseGeocoder,
        open_meteo::{OpenMeteoGeocoder, OpenMeteoWeather},
    },
};

pub mod bigdatacloud;
pub mod open_meteo;

/// Resolves a free-text place name to a place and its coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn search(&self, name: &str) -> Result<GeocodedPlace, LookupError>;
}

/// Resolves coordinates to a place label.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn reverse(&self, at: Coordinates) -> Result<ResolvedPlace, LookupError>;
}

/// Fetches current conditions. `flow` picks the transport order.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(
        &self,
        at: Coordinates,
        flow: LookupFlow,
    ) -> Result<WeatherObservation, LookupError>;
}

/// The three providers one orchestrator drives.
#[derive(Debug, Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub reverse_geocoder: Arc<dyn ReverseGeocoder>,
    pub weather: Arc<dyn WeatherProvider>,
}

impl Providers {
    /// Construct the HTTP-backed providers described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("weather-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let endpoints = &config.endpoints;

        Ok(Self {
            geocoder: Arc::new(OpenMeteoGeocoder::new(
                http.clone(),
                endpoints.geocoding()?,
                &config.proxies,
            )),
            reverse_geocoder: Arc::new(BigDataCloudReverseGeocoder::new(
                http.clone(),
                endpoints.reverse_geocoding()?,
                config.fallback_country.clone(),
            )),
            weather: Arc::new(OpenMeteoWeather::new(
                http,
                endpoints.forecast()?,
                config.proxies.clone(),
            )),
        })
    }
}
