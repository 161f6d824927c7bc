//! Error types shared across the Palisade workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
