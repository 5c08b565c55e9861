//! Directory lookup collaborator: employee → department, department → head.
//!
//! The engine only reads from the directory. [`CachedDirectory`] puts a
//! short-TTL cache in front of any implementation so that bulk member
//! additions do not repeat the same escalation lookups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EmployeeId;

/// Default time-to-live for cached directory answers.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Default maximum number of cached answers per lookup kind.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentHead {
    pub user_id: EmployeeId,
    pub name: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DirectoryError> for CoreError {
    fn from(err: DirectoryError) -> Self {
        CoreError::DependencyUnavailable(err.to_string())
    }
}

/// Read-only view of the organisation directory.
///
/// `Ok(None)` means "no such record"; `Err` means the directory could not be
/// asked.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    async fn employee(&self, employee_id: &str) -> Result<Option<Employee>, DirectoryError>;

    async fn department_head(
        &self,
        department: &str,
    ) -> Result<Option<DepartmentHead>, DirectoryError>;
}

// ---------------------------------------------------------------------------
// In-memory directory
// ---------------------------------------------------------------------------

/// Fixed in-memory directory, used by tests and local tooling.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    employees: HashMap<EmployeeId, Employee>,
    heads: HashMap<String, DepartmentHead>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(
        mut self,
        id: impl Into<EmployeeId>,
        name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        let id = id.into();
        self.employees.insert(
            id.clone(),
            Employee {
                id,
                name: name.into(),
                department: department.into(),
            },
        );
        self
    }

    /// Register `user_id` as head of `department`.
    ///
    /// The head is not added as an employee; call [`with_employee`] as well
    /// when the head also needs a home department.
    ///
    /// [`with_employee`]: StaticDirectory::with_employee
    pub fn with_head(
        mut self,
        department: impl Into<String>,
        user_id: impl Into<EmployeeId>,
        name: impl Into<String>,
    ) -> Self {
        self.heads.insert(
            department.into(),
            DepartmentHead {
                user_id: user_id.into(),
                name: name.into(),
            },
        );
        self
    }

    /// Simulate an outage: every lookup fails until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of lookups answered (or refused) so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DirectoryError::Unavailable("static directory offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DirectoryLookup for StaticDirectory {
    async fn employee(&self, employee_id: &str) -> Result<Option<Employee>, DirectoryError> {
        self.check_available()?;
        Ok(self.employees.get(employee_id).cloned())
    }

    async fn department_head(
        &self,
        department: &str,
    ) -> Result<Option<DepartmentHead>, DirectoryError> {
        self.check_available()?;
        Ok(self.heads.get(department).cloned())
    }
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

/// TTL cache in front of another directory.
///
/// Both positive and negative answers are cached; failures are not, so an
/// outage is retried on the next call.
pub struct CachedDirectory {
    inner: Arc<dyn DirectoryLookup>,
    employees: Cache<EmployeeId, Option<Employee>>,
    heads: Cache<String, Option<DepartmentHead>>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn DirectoryLookup>, ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner,
            employees: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            heads: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl DirectoryLookup for CachedDirectory {
    async fn employee(&self, employee_id: &str) -> Result<Option<Employee>, DirectoryError> {
        let inner = Arc::clone(&self.inner);
        let key = employee_id.to_string();
        self.employees
            .try_get_with(key.clone(), async move { inner.employee(&key).await })
            .await
            .map_err(|err| (*err).clone())
    }

    async fn department_head(
        &self,
        department: &str,
    ) -> Result<Option<DepartmentHead>, DirectoryError> {
        let inner = Arc::clone(&self.inner);
        let key = department.to_string();
        self.heads
            .try_get_with(key.clone(), async move { inner.department_head(&key).await })
            .await
            .map_err(|err| (*err).clone())
    }
}
