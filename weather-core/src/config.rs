use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{model::Coordinates, transport::ProxyTemplate};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_REVERSE_GEOCODING_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";
pub const DEFAULT_FALLBACK_COUNTRY: &str = "India";

/// Base URLs of the upstream services (without query parameters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub reverse_geocoding_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            reverse_geocoding_url: DEFAULT_REVERSE_GEOCODING_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one host, keeping the default paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            geocoding_url: format!("{base}/v1/search"),
            forecast_url: format!("{base}/v1/forecast"),
            reverse_geocoding_url: format!("{base}/data/reverse-geocode-client"),
        }
    }

    pub fn geocoding(&self) -> Result<Url> {
        parse_endpoint("geocoding_url", &self.geocoding_url)
    }

    pub fn forecast(&self) -> Result<Url> {
        parse_endpoint("forecast_url", &self.forecast_url)
    }

    pub fn reverse_geocoding(&self) -> Result<Url> {
        parse_endpoint("reverse_geocoding_url", &self.reverse_geocoding_url)
    }
}

fn parse_endpoint(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("Invalid URL for endpoints.{key}: {value}"))
}

pub fn default_proxies() -> Vec<ProxyTemplate> {
    vec![
        ProxyTemplate::new("https://corsproxy.io/?{url}"),
        ProxyTemplate::new("https://api.allorigins.win/raw?url={url_encoded}"),
    ]
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// fallback_country = "India"
/// proxies = ["https://corsproxy.io/?{url}"]
///
/// [device]
/// latitude = 18.52
/// longitude = 73.86
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Country reported when reverse geocoding doesn't name one.
    pub fallback_country: String,

    /// Ordered fallback proxies.
    pub proxies: Vec<ProxyTemplate>,

    pub endpoints: Endpoints,

    /// Position used as the device location. Absent means geolocation is
    /// unsupported.
    pub device: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_country: DEFAULT_FALLBACK_COUNTRY.to_string(),
            proxies: default_proxies(),
            endpoints: Endpoints::default(),
            device: None,
        }
    }
}

impl Config {
    /// Check the values a hand-edited file might get wrong.
    pub fn validate(&self) -> Result<()> {
        self.endpoints.geocoding()?;
        self.endpoints.forecast()?;
        self.endpoints.reverse_geocoding()?;

        if let Some(device) = self.device {
            if !device.is_valid() {
                bail!(
                    "Device location ({}, {}) is out of range.\n\
                     Hint: latitude must be within -90..90 and longitude within -180..180.",
                    device.latitude,
                    device.longitude
                );
            }
        }

        if self.fallback_country.trim().is_empty() {
            bail!("fallback_country must not be empty");
        }

        Ok(())
    }

    pub fn set_device_location(&mut self, coordinates: Coordinates) {
        self.device = Some(coordinates);
    }

    pub fn clear_device_location(&mut self) {
        self.device = None;
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
