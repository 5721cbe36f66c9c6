use thiserror::Error;

use crate::model::EmployeeDraft;

/// Minimum number of characters in a trimmed name.
pub const MIN_NAME_CHARS: usize = 3;

/// A violated field rule. Rules are checked in declaration order and only the
/// first violation is reported.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El nombre debe tener al menos 3 caracteres.")]
    NameTooShort,
    #[error("La edad debe ser un número positivo.")]
    AgeNotPositive,
    #[error("El puesto es obligatorio.")]
    PositionMissing,
    #[error("El departamento es obligatorio.")]
    DepartmentMissing,
}

/// Field rules shared by create and update.
pub fn validate_draft(draft: &EmployeeDraft) -> Result<(), ValidationError> {
    if draft.name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(ValidationError::NameTooShort);
    }
    if draft.age <= 0 {
        return Err(ValidationError::AgeNotPositive);
    }
    if draft.position.trim().is_empty() {
        return Err(ValidationError::PositionMissing);
    }
    if draft.department.trim().is_empty() {
        return Err(ValidationError::DepartmentMissing);
    }
    Ok(())
}
