//! [`DirectoryLookup`] over the `employees` and `departments` tables.

use async_trait::async_trait;
use opsportal_core::directory::{DepartmentHead, DirectoryError, DirectoryLookup, Employee};
use sqlx::PgPool;

use crate::models::employee::{DepartmentHeadRow, EmployeeRow};

fn unavailable(err: sqlx::Error) -> DirectoryError {
    tracing::error!(error = %err, "Directory query failed");
    DirectoryError::Unavailable(err.to_string())
}

#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryLookup for PgDirectory {
    async fn employee(&self, employee_id: &str) -> Result<Option<Employee>, DirectoryError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, department FROM employees WHERE id = $1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(row.map(Employee::from))
    }

    async fn department_head(
        &self,
        department: &str,
    ) -> Result<Option<DepartmentHead>, DirectoryError> {
        let row = sqlx::query_as::<_, DepartmentHeadRow>(
            "SELECT e.id AS user_id, e.name \
             FROM departments d \
             JOIN employees e ON e.id = d.head_user_id \
             WHERE d.name = $1",
        )
        .bind(department)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(row.map(DepartmentHead::from))
    }
}
