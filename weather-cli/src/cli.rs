use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Text};
use std::{process::ExitCode, sync::Arc};
use weather_core::{
    Config, ConfiguredLocator, Coordinates, DeviceLocator, LookupOutcome, Orchestrator,
    ProxyTemplate, Providers,
};

use crate::{locator::PromptingLocator, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a city or your location")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides this).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure device location, fallback proxies and fallback country.
    Configure,

    /// Show the current weather for a city.
    Show {
        /// City name; prompted for when omitted.
        city: Option<String>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the current weather where this device is.
    Here {
        /// Latitude to use instead of the configured device location.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude to use instead of the configured device location.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Don't ask for permission to use the location.
        #[arg(short, long)]
        yes: bool,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { city, json } => {
                let config = Config::load()?;
                let locator = Arc::new(ConfiguredLocator::new(config.device));
                let orchestrator = build_orchestrator(&config, locator)?;

                let city = match city {
                    Some(city) => city,
                    None => {
                        render::welcome(&orchestrator.snapshot());
                        Text::new("Enter city name...").prompt().context("No city entered")?
                    }
                };

                let outcome =
                    render::with_progress(&orchestrator, orchestrator.lookup_by_name(&city), json)
                        .await;
                Ok(finish(&orchestrator, &outcome, json))
            }
            Command::Here { lat, lon, yes, json } => {
                let config = Config::load()?;
                let position = match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
                    _ => config.device,
                };
                let locator = Arc::new(PromptingLocator::new(position, yes));
                let orchestrator = build_orchestrator(&config, locator)?;

                let outcome = render::with_progress(
                    &orchestrator,
                    orchestrator.lookup_by_current_location(),
                    json,
                )
                .await;
                Ok(finish(&orchestrator, &outcome, json))
            }
        }
    }
}

fn build_orchestrator(
    config: &Config,
    locator: Arc<dyn DeviceLocator>,
) -> anyhow::Result<Orchestrator> {
    let providers = Providers::from_config(config)?;
    Ok(Orchestrator::new(providers, locator))
}

fn finish(orchestrator: &Orchestrator, outcome: &LookupOutcome, json: bool) -> ExitCode {
    if json {
        render::json(outcome);
    } else {
        render::state(&orchestrator.snapshot());
    }

    match outcome {
        LookupOutcome::Success(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Interactively edit and save the config file.
fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let use_device = Confirm::new("Set a device location for `weather here`?")
        .with_default(config.device.is_some())
        .prompt()?;

    if use_device {
        let current = config.device.unwrap_or(Coordinates::new(0.0, 0.0));
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_default(current.latitude)
            .with_error_message("Please type a valid number")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_default(current.longitude)
            .with_error_message("Please type a valid number")
            .prompt()?;
        config.set_device_location(Coordinates::new(latitude, longitude));
    } else {
        config.clear_device_location();
    }

    let joined = config.proxies.iter().map(ProxyTemplate::as_str).collect::<Vec<_>>().join(", ");
    let proxies = Text::new("Fallback proxies (comma separated, use {url} or {url_encoded}):")
        .with_default(&joined)
        .prompt()?;
    config.proxies = proxies
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ProxyTemplate::new)
        .collect();

    let country = Text::new("Country to report when reverse geocoding has none:")
        .with_default(&config.fallback_country)
        .prompt()?;
    config.fallback_country = country.trim().to_string();

    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
