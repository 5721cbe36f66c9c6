use std::sync::Arc;

use thiserror::Error;

use crate::validation::ValidationError;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error, Clone)]
pub enum HrError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Empleado con ID {id} no encontrado.")]
    NotFound { id: i32 },
    #[error("unexpected storage failure: {0:#}")]
    Unexpected(Arc<anyhow::Error>),
}

impl HrError {
    pub fn unexpected(err: anyhow::Error) -> Self {
        Self::Unexpected(Arc::new(err))
    }
}

impl From<anyhow::Error> for HrError {
    fn from(value: anyhow::Error) -> Self {
        Self::unexpected(value)
    }
}
