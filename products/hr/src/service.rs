use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, instrument};

use crate::{
    error::{HrError, HrResult},
    model::{Employee, EmployeeDraft, EmployeeFilter, EmployeeStatistics},
    stats::summarize,
    store::{EmployeeStore, SeaOrmEmployeeStore},
    validation::validate_draft,
};

/// Age an employee must exceed to appear in [`EmployeeService::list_older_than_30`].
pub const SENIOR_AGE_THRESHOLD: i32 = 30;

/// Employee operations. Each call is independent; the service keeps no state
/// besides its store handle.
#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    pub fn with_connection(db: Arc<DatabaseConnection>) -> Self {
        Self::new(Arc::new(SeaOrmEmployeeStore::new(db)))
    }

    #[instrument(name = "hr.employees.create", skip_all, fields(position = %draft.position, department = %draft.department))]
    pub async fn create(&self, draft: EmployeeDraft) -> HrResult<Employee> {
        check(&draft)?;
        let employee = self.store.add(draft).await.map_err(storage_failure)?;
        info!(id = employee.id, "employee created");
        Ok(employee)
    }

    #[instrument(name = "hr.employees.get", skip(self))]
    pub async fn get_by_id(&self, id: i32) -> HrResult<Employee> {
        self.find_existing(id).await
    }

    #[instrument(
        name = "hr.employees.list",
        skip_all,
        fields(
            min_age = ?filter.min_age,
            max_age = ?filter.max_age,
            position = ?filter.position(),
            department = ?filter.department()
        )
    )]
    pub async fn list(&self, filter: EmployeeFilter) -> HrResult<Vec<Employee>> {
        let records = self.store.query(&filter).await.map_err(storage_failure)?;
        debug!(count = records.len(), "employees listed");
        Ok(records)
    }

    #[instrument(name = "hr.employees.list_older_than_30", skip(self))]
    pub async fn list_older_than_30(&self) -> HrResult<Vec<Employee>> {
        let filter = EmployeeFilter::older_than(SENIOR_AGE_THRESHOLD);
        let records = self.store.query(&filter).await.map_err(storage_failure)?;
        debug!(count = records.len(), "employees older than threshold listed");
        Ok(records)
    }

    /// Existence is checked before the payload, so an unknown id is always
    /// `NotFound`.
    #[instrument(name = "hr.employees.update", skip(self, draft))]
    pub async fn update(&self, id: i32, draft: EmployeeDraft) -> HrResult<Employee> {
        let mut employee = self.find_existing(id).await?;
        check(&draft)?;
        employee.apply(draft);
        let saved = self.store.save(&employee).await.map_err(storage_failure)?;
        info!(id, "employee updated");
        Ok(saved)
    }

    #[instrument(name = "hr.employees.delete", skip(self))]
    pub async fn delete(&self, id: i32) -> HrResult<()> {
        self.find_existing(id).await?;
        self.store.remove(id).await.map_err(storage_failure)?;
        info!(id, "employee deleted");
        Ok(())
    }

    #[instrument(name = "hr.employees.statistics", skip(self))]
    pub async fn statistics(&self) -> HrResult<EmployeeStatistics> {
        let records = self
            .store
            .query(&EmployeeFilter::default())
            .await
            .map_err(storage_failure)?;
        Ok(summarize(&records))
    }

    async fn find_existing(&self, id: i32) -> HrResult<Employee> {
        match self.store.find_by_id(id).await.map_err(storage_failure)? {
            Some(employee) => Ok(employee),
            None => {
                debug!(id, "employee not found");
                Err(HrError::NotFound { id })
            }
        }
    }
}

fn check(draft: &EmployeeDraft) -> HrResult<()> {
    validate_draft(draft).map_err(|rule| {
        debug!(%rule, "employee payload rejected");
        HrError::from(rule)
    })
}

fn storage_failure(err: anyhow::Error) -> HrError {
    error!(error = %format!("{err:#}"), "employee store failure");
    HrError::unexpected(err)
}
