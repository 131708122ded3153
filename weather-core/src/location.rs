use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::PositionError, model::Coordinates};

/// Source of the device's current position.
#[async_trait]
pub trait DeviceLocator: Send + Sync + Debug {
    /// Whether this device can report a position at all.
    fn is_supported(&self) -> bool;

    /// Ask for the current position. May prompt for permission.
    async fn current_position(&self) -> Result<Coordinates, PositionError>;
}

/// Locator backed by a fixed position, typically from the config file.
///
/// Without a position it reports itself as unsupported.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocator {
    position: Option<Coordinates>,
}

impl ConfiguredLocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl DeviceLocator for ConfiguredLocator {
    fn is_supported(&self) -> bool {
        self.position.is_some()
    }

    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        self.position
            .ok_or_else(|| PositionError::Unavailable("no device location configured".into()))
    }
}
