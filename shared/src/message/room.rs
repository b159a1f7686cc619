//! Broadcast rooms
//!
//! A room is a named group of live connections. Names on the wire:
//!
//! | Room | Name | Audience |
//! |------|------|----------|
//! | `Tables` | `tables` | table map, dashboards |
//! | `Kitchen` | `kitchen` | kitchen display |
//! | `Waiters` | `waiters` | waiter tablets |
//! | `Reports` | `reports` | live sales/occupancy dashboards |
//! | `Table(id)` | `table:{id}` | views focused on one table |
//! | `Order(id)` | `order:{id}` | the customer app for that order |

use crate::models::Role;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    Tables,
    Kitchen,
    Waiters,
    Reports,
    Table(i64),
    Order(i64),
}

impl Room {
    /// Whether a connection with this identity may join the room.
    ///
    /// Customers only ever see their own order.
    pub fn admits(&self, role: Role, own_order: Option<i64>) -> bool {
        match (role, self) {
            (Role::Customer, Room::Order(id)) => own_order == Some(*id),
            (Role::Customer, _) => false,
            _ => true,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Tables => f.write_str("tables"),
            Room::Kitchen => f.write_str("kitchen"),
            Room::Waiters => f.write_str("waiters"),
            Room::Reports => f.write_str("reports"),
            Room::Table(id) => write!(f, "table:{}", id),
            Room::Order(id) => write!(f, "order:{}", id),
        }
    }
}

/// Unparseable room name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRoom(pub String);

impl fmt::Display for InvalidRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid room: {}", self.0)
    }
}

impl std::error::Error for InvalidRoom {}

impl FromStr for Room {
    type Err = InvalidRoom;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tables" => return Ok(Room::Tables),
            "kitchen" => return Ok(Room::Kitchen),
            "waiters" => return Ok(Room::Waiters),
            "reports" => return Ok(Room::Reports),
            _ => {}
        }
        let invalid = || InvalidRoom(s.to_string());
        let (prefix, id) = s.split_once(':').ok_or_else(invalid)?;
        let id: i64 = id.parse().map_err(|_| invalid())?;
        match prefix {
            "table" => Ok(Room::Table(id)),
            "order" => Ok(Room::Order(id)),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Room {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
