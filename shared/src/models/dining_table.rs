//! Dining Table Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Floor section a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableSection {
    #[default]
    Main,
    Deck,
    Beach,
    Vip,
}

/// Occupancy status
///
/// `WaitingPayment` is advisory: it tells the floor the guests asked to
/// settle, but closing is accepted from `Occupied` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Free,
    Occupied,
    WaitingPayment,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Free => "free",
            TableStatus::Occupied => "occupied",
            TableStatus::WaitingPayment => "waiting_payment",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table entity (桌台), the aggregate root of a visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    /// Display label, not necessarily numeric
    pub number: String,
    pub section: TableSection,
    pub status: TableStatus,
    pub occupants: u32,
    /// Assigned waiter (weak reference)
    pub waiter_id: Option<i64>,
    /// Set when the table leaves `Free`
    pub open_time: Option<i64>,
    /// Set while the table is not `Free`
    pub current_order_id: Option<i64>,
    /// Secret printed in the table's QR code
    pub qr_token: String,
    #[serde(default)]
    pub version: u64,
}

impl DiningTable {
    pub fn is_free(&self) -> bool {
        self.status == TableStatus::Free
    }

    /// `free ⇔ current_order_id.is_none() ⇔ open_time.is_none()`
    pub fn is_consistent(&self) -> bool {
        let free = self.is_free();
        free == self.current_order_id.is_none() && free == self.open_time.is_none()
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    /// Explicit id; generated when absent
    pub id: Option<i64>,
    pub number: String,
    #[serde(default)]
    pub section: TableSection,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(status: TableStatus, order: Option<i64>, open: Option<i64>) -> DiningTable {
        DiningTable {
            id: 5,
            number: "5".to_string(),
            section: TableSection::Deck,
            status,
            occupants: 0,
            waiter_id: None,
            open_time: open,
            current_order_id: order,
            qr_token: "t".to_string(),
            version: 1,
        }
    }

    #[test]
    fn test_consistency() {
        assert!(table(TableStatus::Free, None, None).is_consistent());
        assert!(table(TableStatus::Occupied, Some(1), Some(10)).is_consistent());
        assert!(table(TableStatus::WaitingPayment, Some(1), Some(10)).is_consistent());
        assert!(!table(TableStatus::Free, Some(1), None).is_consistent());
        assert!(!table(TableStatus::Occupied, Some(1), None).is_consistent());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&TableStatus::WaitingPayment).unwrap(),
            "\"waiting_payment\""
        );
        let section: TableSection = serde_json::from_str("\"vip\"").unwrap();
        assert_eq!(section, TableSection::Vip);
    }
}
