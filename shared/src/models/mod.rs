//! Data models
//!
//! Shared between edge-server and frontends (via API and realtime events).
//! All IDs are `i64` snowflakes (see [`crate::util::snowflake_id`]), except
//! tables which may be numbered by the operator.

pub mod dining_table;
pub mod order;
pub mod product;
pub mod role;
pub mod waiter_call;

// Re-exports
pub use dining_table::*;
pub use order::*;
pub use product::*;
pub use role::*;
pub use waiter_call::*;
