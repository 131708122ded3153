use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::LookupError,
    model::{Coordinates, ResolvedPlace, UNKNOWN_CITY},
    transport::{Transport, fetch_first_success},
};

use super::ReverseGeocoder;

/// Reverse geocoding via the BigDataCloud client endpoint.
///
/// There is a single direct transport. Missing fields never fail the lookup;
/// they fall back to placeholders instead.
#[derive(Debug, Clone)]
pub struct BigDataCloudReverseGeocoder {
    http: Client,
    reverse_url: Url,
    fallback_country: String,
}

impl BigDataCloudReverseGeocoder {
    pub fn new(http: Client, reverse_url: Url, fallback_country: String) -> Self {
        Self { http, reverse_url, fallback_country }
    }

    fn request_url(&self, at: Coordinates) -> Url {
        let mut url = self.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &at.latitude.to_string())
            .append_pair("longitude", &at.longitude.to_string())
            .append_pair("localityLanguage", "en");
        url
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReverseResponse {
    city: Option<String>,
    locality: Option<String>,
    principal_subdivision: Option<String>,
    country_name: Option<String>,
}

impl ReverseResponse {
    fn into_place(self, fallback_country: &str) -> ResolvedPlace {
        let subdivision = non_empty(self.principal_subdivision);

        let name = non_empty(self.city)
            .or_else(|| non_empty(self.locality))
            .or_else(|| subdivision.clone())
            .unwrap_or_else(|| UNKNOWN_CITY.to_string());

        let country = non_empty(self.country_name).unwrap_or_else(|| fallback_country.to_string());

        ResolvedPlace { name, admin_region: subdivision, country }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl ReverseGeocoder for BigDataCloudReverseGeocoder {
    async fn reverse(&self, at: Coordinates) -> Result<ResolvedPlace, LookupError> {
        let url = self.request_url(at);

        let parsed: ReverseResponse =
            fetch_first_success(&self.http, &url, &[Transport::Direct], "reverse geocoding")
                .await?;

        let place = parsed.into_place(&self.fallback_country);
        debug!(latitude = at.latitude, longitude = at.longitude, place = %place.label(), "reverse geocoded");

        Ok(place)
    }
}
