use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use entity::employees;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Select,
};

use crate::model::{Employee, EmployeeDraft, EmployeeFilter};

/// Narrow persistence interface the service depends on.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Insert a new record and return it with its storage-assigned id.
    async fn add(&self, draft: EmployeeDraft) -> Result<Employee>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Employee>>;

    /// All records matching every supplied filter.
    async fn query(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>>;

    /// Overwrite the mutable fields of an existing record.
    async fn save(&self, employee: &Employee) -> Result<Employee>;

    async fn remove(&self, id: i32) -> Result<()>;
}

/// [`EmployeeStore`] over a sea-orm connection (Postgres in production,
/// SQLite in tests).
#[derive(Clone, Debug)]
pub struct SeaOrmEmployeeStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmEmployeeStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmployeeStore for SeaOrmEmployeeStore {
    async fn add(&self, draft: EmployeeDraft) -> Result<Employee> {
        let model = employees::ActiveModel {
            name: Set(draft.name),
            age: Set(draft.age),
            position: Set(draft.position),
            department: Set(draft.department),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .context("failed to insert employee")?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Employee>> {
        let record = employees::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .with_context(|| format!("failed to load employee {id}"))?;
        Ok(record.map(Employee::from))
    }

    async fn query(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        let rows = apply_filter(employees::Entity::find(), filter)
            .order_by_asc(employees::Column::Id)
            .all(self.db.as_ref())
            .await
            .context("failed to query employees")?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn save(&self, employee: &Employee) -> Result<Employee> {
        let model = employees::ActiveModel {
            id: Unchanged(employee.id),
            name: Set(employee.name.clone()),
            age: Set(employee.age),
            position: Set(employee.position.clone()),
            department: Set(employee.department.clone()),
        }
        .update(self.db.as_ref())
        .await
        .with_context(|| format!("failed to update employee {}", employee.id))?;
        Ok(model.into())
    }

    async fn remove(&self, id: i32) -> Result<()> {
        employees::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("failed to delete employee {id}"))?;
        Ok(())
    }
}

fn apply_filter(
    mut query: Select<employees::Entity>,
    filter: &EmployeeFilter,
) -> Select<employees::Entity> {
    if let Some(min) = filter.min_age {
        query = query.filter(employees::Column::Age.gte(min));
    }
    if let Some(max) = filter.max_age {
        query = query.filter(employees::Column::Age.lte(max));
    }
    if let Some(position) = filter.position() {
        query = query.filter(lower_eq(employees::Column::Position, position));
    }
    if let Some(department) = filter.department() {
        query = query.filter(lower_eq(employees::Column::Department, department));
    }
    query
}

/// `LOWER(column) = LOWER(value)`, folded by the database on both sides.
fn lower_eq(column: employees::Column, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(Func::lower(Expr::val(value.to_string())))
}
