//! Directory rows: employees and department heads.

use opsportal_core::directory::{DepartmentHead, Employee};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmployeeRow {
    pub id: String,
    pub name: String,
    pub department: String,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            name: row.name,
            department: row.department,
        }
    }
}

/// The head of a department, joined from `departments` and `employees`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentHeadRow {
    pub user_id: String,
    pub name: String,
}

impl From<DepartmentHeadRow> for DepartmentHead {
    fn from(row: DepartmentHeadRow) -> Self {
        DepartmentHead {
            user_id: row.user_id,
            name: row.name,
        }
    }
}
