//! Actor roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission class of whoever performs an action.
///
/// Staff roles come from a validated token. `Customer` is never read from
/// a client claim; it is assigned to every customer-app request, which is
/// then CPF-verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Waiter,
    Kitchen,
    Customer,
}

impl Role {
    /// Admin or manager
    pub fn is_management(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Front-of-house staff: waiter, admin, manager
    pub fn is_front_of_house(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Waiter)
    }

    /// Any authenticated employee
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Customer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Waiter => "waiter",
            Role::Kitchen => "kitchen",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity attached to every coordinator action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Employee id; `None` for customers
    pub user_id: Option<i64>,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn staff(user_id: i64, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            name: name.into(),
            role,
        }
    }

    pub fn customer(name: impl Into<String>) -> Self {
        Self {
            user_id: None,
            name: name.into(),
            role: Role::Customer,
        }
    }
}
