//! Human-friendly (and JSON) output of lookup state.

use chrono::Local;
use std::future::Future;
use tokio::sync::watch;
use weather_core::{LookupOutcome, LookupState, Orchestrator, UiState, WeatherResult};

pub fn welcome(state: &LookupState) {
    if state.ui_state() == UiState::Welcome {
        println!("😊 Welcome! Let's explore today's weather together 🌤️");
        println!();
    }
}

/// Drive `lookup` while echoing loading messages from the orchestrator.
pub async fn with_progress<F>(orchestrator: &Orchestrator, lookup: F, quiet: bool) -> LookupOutcome
where
    F: Future<Output = LookupOutcome>,
{
    let updates = orchestrator.subscribe();
    let (outcome, ()) = tokio::join!(lookup, report_progress(updates, quiet));
    outcome
}

async fn report_progress(mut updates: watch::Receiver<LookupState>, quiet: bool) {
    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        match state.ui_state() {
            UiState::Loading => {
                if let Some(message) = state.status_message().filter(|_| !quiet) {
                    eprintln!("⏳ {message}");
                }
            }
            UiState::Presenting | UiState::Welcome => break,
        }
    }
}

pub fn state(state: &LookupState) {
    match state.outcome() {
        Some(LookupOutcome::Success(result)) => result_card(result),
        Some(LookupOutcome::Failure(_)) => {
            if let Some(message) = state.status_message() {
                eprintln!("{message}");
            }
        }
        Some(LookupOutcome::InProgress) | None => {}
    }
}

pub fn result_card(result: &WeatherResult) {
    let category = result.condition().category;

    println!("{} {}", category.glyph(), result.place.label());
    println!("{}°C", result.observation.temperature_c);
    println!("{} {}", category.glyph(), category);
    println!("💨 Wind: {} km/h", result.observation.wind_speed_kmh);
    println!("Observed at {}", result.fetched_at.with_timezone(&Local).format("%H:%M"));
}

pub fn json(outcome: &LookupOutcome) {
    match serde_json::to_string_pretty(outcome) {
        Ok(text) => println!("{text}"),
        Err(err) => tracing::error!(error = %err, "failed to serialize outcome"),
    }
}
