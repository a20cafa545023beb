//! Employee directory.
//!
//! The engine only reads from the directory: role, approval level and
//! manager. [`InMemoryDirectory`] is an id-indexed arena that keeps the
//! manager relation acyclic by checking every assignment.
//!
//! ## Invariants
//! - A manager reference always points at an existing employee
//! - Following `manager_id` from any employee never revisits an employee

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, EmployeeId, Role};

/// Read-only directory lookup used by the engine.
pub trait Directory: Send + Sync {
    /// Looks up an employee by id.
    fn employee(&self, id: EmployeeId) -> EngineResult<Option<Employee>>;

    /// Returns every employee with the accountant role.
    fn accountants(&self) -> EngineResult<Vec<EmployeeId>>;

    /// Looks up an employee, failing with `NotFound` when absent.
    fn require(&self, id: EmployeeId) -> EngineResult<Employee> {
        self.employee(id)?
            .ok_or_else(|| EngineError::not_found("employee", id))
    }
}

/// In-memory directory for the binary and for tests.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    employees: RwLock<HashMap<EmployeeId, Employee>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an employee.
    ///
    /// Fails with `Validation` if the manager is unknown or if the manager
    /// relation would become cyclic.
    pub fn insert(&self, employee: Employee) -> EngineResult<()> {
        let mut employees = self.employees.write().map_err(|_| EngineError::poisoned())?;
        if let Some(manager) = employee.manager_id {
            check_assignment(&employees, employee.id, manager)?;
        }
        debug!(employee_id = %employee.id, role = %employee.role, "Directory entry stored");
        employees.insert(employee.id, employee);
        Ok(())
    }

    /// Changes (or clears) an employee's manager.
    ///
    /// # Example
    ///
    /// ```
    /// use leave_engine::directory::InMemoryDirectory;
    /// use leave_engine::error::ErrorKind;
    /// use leave_engine::models::{Employee, Role};
    ///
    /// let directory = InMemoryDirectory::new();
    /// let boss = Employee::new("Boss", "boss@example.com", Role::Manager);
    /// let report = Employee::new("Report", "r@example.com", Role::Employee).reporting_to(boss.id);
    /// directory.insert(boss.clone()).unwrap();
    /// directory.insert(report.clone()).unwrap();
    ///
    /// // The boss cannot report to their own report.
    /// let err = directory.assign_manager(boss.id, Some(report.id)).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Validation);
    /// ```
    pub fn assign_manager(
        &self,
        employee_id: EmployeeId,
        manager: Option<EmployeeId>,
    ) -> EngineResult<()> {
        let mut employees = self.employees.write().map_err(|_| EngineError::poisoned())?;
        if !employees.contains_key(&employee_id) {
            return Err(EngineError::not_found("employee", employee_id));
        }
        if let Some(manager) = manager {
            check_assignment(&employees, employee_id, manager)?;
        }
        if let Some(employee) = employees.get_mut(&employee_id) {
            employee.manager_id = manager;
        }
        debug!(employee_id = %employee_id, manager = ?manager, "Manager assigned");
        Ok(())
    }

    /// Returns the chain of managers above an employee, nearest first.
    pub fn manager_chain(&self, employee_id: EmployeeId) -> EngineResult<Vec<EmployeeId>> {
        let employees = self.employees.read().map_err(|_| EngineError::poisoned())?;
        let mut current = employees
            .get(&employee_id)
            .ok_or_else(|| EngineError::not_found("employee", employee_id))?
            .manager_id;
        let mut chain = Vec::new();
        while let Some(id) = current {
            if chain.contains(&id) || chain.len() > employees.len() {
                break;
            }
            chain.push(id);
            current = employees.get(&id).and_then(|e| e.manager_id);
        }
        Ok(chain)
    }

    /// Number of employees stored.
    pub fn len(&self) -> usize {
        self.employees.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns true if no employees are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Verifies that `employee` may report to `manager`.
fn check_assignment(
    employees: &HashMap<EmployeeId, Employee>,
    employee: EmployeeId,
    manager: EmployeeId,
) -> EngineResult<()> {
    if manager == employee {
        return Err(EngineError::validation(
            "manager_id",
            "an employee cannot manage themselves",
        ));
    }
    if !employees.contains_key(&manager) {
        return Err(EngineError::validation(
            "manager_id",
            format!("unknown manager {}", manager),
        ));
    }

    let mut seen = HashSet::new();
    let mut current = Some(manager);
    while let Some(id) = current {
        if id == employee {
            return Err(EngineError::validation(
                "manager_id",
                format!("assigning {} as manager of {} creates a cycle", manager, employee),
            ));
        }
        if !seen.insert(id) {
            break;
        }
        current = employees.get(&id).and_then(|e| e.manager_id);
    }
    Ok(())
}

impl Directory for InMemoryDirectory {
    fn employee(&self, id: EmployeeId) -> EngineResult<Option<Employee>> {
        let employees = self.employees.read().map_err(|_| EngineError::poisoned())?;
        Ok(employees.get(&id).cloned())
    }

    fn accountants(&self) -> EngineResult<Vec<EmployeeId>> {
        let employees = self.employees.read().map_err(|_| EngineError::poisoned())?;
        let mut accountants: Vec<&Employee> = employees
            .values()
            .filter(|e| e.role == Role::Accountant)
            .collect();
        accountants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(accountants.into_iter().map(|e| e.id).collect())
    }
}
