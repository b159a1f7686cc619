//! Waiter Call Model

use super::order::CustomerInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the customer is calling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallReason {
    Assistance,
    Order,
    Bill,
    Complaint,
    Question,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Pending,
    Attending,
    Resolved,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallStatus::Pending => "pending",
            CallStatus::Attending => "attending",
            CallStatus::Resolved => "resolved",
        })
    }
}

/// A customer's request for a waiter.
///
/// Broadcast to every waiter so whoever is free can claim it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiterCall {
    pub id: i64,
    pub table_id: i64,
    pub order_id: i64,
    pub customer: CustomerInfo,
    pub reason: CallReason,
    pub custom_reason: Option<String>,
    pub status: CallStatus,
    pub waiter_id: Option<i64>,
    /// Resolution notes
    pub notes: Option<String>,
    pub created_at: i64,
    pub attended_at: Option<i64>,
    pub resolved_at: Option<i64>,
    #[serde(default)]
    pub version: u64,
}

impl WaiterCall {
    pub fn is_open(&self) -> bool {
        self.status != CallStatus::Resolved
    }
}
