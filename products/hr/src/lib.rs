//! HR vertical slice.
//!
//! [`EmployeeService`] owns every business rule for employee records. It talks
//! to storage only through [`EmployeeStore`], so the sea-orm backed
//! [`SeaOrmEmployeeStore`] can be swapped for any other implementation.

mod error;
mod model;
mod service;
mod stats;
mod store;
mod validation;

pub use error::{HrError, HrResult};
pub use model::{
    DepartmentCount, Employee, EmployeeDraft, EmployeeFilter, EmployeeStatistics, PositionCount,
};
pub use service::{EmployeeService, SENIOR_AGE_THRESHOLD};
pub use stats::{round_to_hundredths, summarize};
pub use store::{EmployeeStore, SeaOrmEmployeeStore};
pub use validation::{MIN_NAME_CHARS, ValidationError, validate_draft};
