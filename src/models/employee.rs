//! Employee model and related types.
//!
//! The engine never owns employees: it reads their role, approval level and
//! manager from the directory.

use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// The organisational role of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular employee; may only act on their own requests.
    Employee,
    /// Line manager ("jefe"); approves the first stage for their reports.
    Manager,
    /// Accountant ("contadora"); approves the final stage.
    Accountant,
    /// Administrator; may act on any request.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Employee => write!(f, "employee"),
            Role::Manager => write!(f, "manager"),
            Role::Accountant => write!(f, "accountant"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Approval level carried by the directory entry.
///
/// `0` cannot approve anything, `1` may approve the manager stage for direct
/// reports, `2` may approve the accountant stage.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct ApprovalLevel(u8);

impl ApprovalLevel {
    /// No approval rights.
    pub const NONE: ApprovalLevel = ApprovalLevel(0);
    /// First-stage approver.
    pub const MANAGER: ApprovalLevel = ApprovalLevel(1);
    /// Final-stage approver.
    pub const ACCOUNTANT: ApprovalLevel = ApprovalLevel(2);

    /// Returns the raw level.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ApprovalLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= 2 {
            Ok(ApprovalLevel(value))
        } else {
            Err(format!("approval level must be 0, 1 or 2, got {}", value))
        }
    }
}

impl From<ApprovalLevel> for u8 {
    fn from(level: ApprovalLevel) -> Self {
        level.0
    }
}

/// A directory entry as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: EmployeeId,
    /// Display name, used in notifications.
    pub name: String,
    /// Contact address for notifications.
    pub email: String,
    /// Organisational role.
    pub role: Role,
    /// Approval level (0, 1 or 2).
    #[serde(default)]
    pub approval_level: ApprovalLevel,
    /// The employee's line manager, if any.
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
}

impl Employee {
    /// Creates an employee with no manager and the level implied by the role.
    ///
    /// # Examples
    ///
    /// ```
    /// use leave_engine::models::{ApprovalLevel, Employee, Role};
    ///
    /// let accountant = Employee::new("Marta", "marta@example.com", Role::Accountant);
    /// assert_eq!(accountant.approval_level, ApprovalLevel::ACCOUNTANT);
    /// assert!(accountant.manager_id.is_none());
    /// ```
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        let approval_level = match role {
            Role::Employee => ApprovalLevel::NONE,
            Role::Manager => ApprovalLevel::MANAGER,
            Role::Accountant | Role::Admin => ApprovalLevel::ACCOUNTANT,
        };
        Self {
            id: EmployeeId::new(),
            name: name.into(),
            email: email.into(),
            role,
            approval_level,
            manager_id: None,
        }
    }

    /// Sets the manager, builder style.
    pub fn reporting_to(mut self, manager: EmployeeId) -> Self {
        self.manager_id = Some(manager);
        self
    }

    /// Returns true if the employee is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
