use async_trait::async_trait;
use inquire::{Confirm, InquireError};
use weather_core::{Coordinates, DeviceLocator, PositionError};

/// Device locator that asks the user before handing out the position.
#[derive(Debug, Clone)]
pub struct PromptingLocator {
    position: Option<Coordinates>,
    assume_yes: bool,
}

impl PromptingLocator {
    pub fn new(position: Option<Coordinates>, assume_yes: bool) -> Self {
        Self { position, assume_yes }
    }
}

#[async_trait]
impl DeviceLocator for PromptingLocator {
    fn is_supported(&self) -> bool {
        self.position.is_some()
    }

    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        let position = self
            .position
            .ok_or_else(|| PositionError::Unavailable("no device location configured".into()))?;

        if self.assume_yes {
            return Ok(position);
        }

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow weather to use your location?").with_default(true).prompt()
        })
        .await
        .map_err(|e| PositionError::Unavailable(e.to_string()))?;

        match answer {
            Ok(true) => Ok(position),
            Ok(false)
            | Err(InquireError::OperationCanceled)
            | Err(InquireError::OperationInterrupted) => Err(PositionError::PermissionDenied),
            Err(e) => Err(PositionError::Unavailable(e.to_string())),
        }
    }
}
