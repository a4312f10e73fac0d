//! Build errors for the machine builder.

use crate::scene::SceneError;
use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Entity not specified. Call .entity(id) before .build()")]
    MissingEntity,

    #[error("State '{0}' added more than once")]
    DuplicateState(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}
