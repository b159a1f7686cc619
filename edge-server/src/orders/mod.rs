//! Table & order lifecycle
//!
//! - **machine**: pure transition rules (tables, orders, items)
//! - **locks**: per-table async locks with bounded wait
//! - **money**: price and total arithmetic
//! - **coordinator**: the single writer; lock → validate → commit → publish
//! - **delay_monitor**: periodic preparation-delay alerts
//!
//! # Architecture
//!
//! ```text
//! HTTP action → LifecycleCoordinator ──▶ machine (validate)
//!                      │
//!                      ├──▶ EntityStore.commit(batch)   (atomic)
//!                      └──▶ EventSink.publish(payload)  (after commit, under table lock)
//!                                   │
//!                             RealtimeGateway → rooms → sessions
//! ```

pub mod coordinator;
pub mod delay_monitor;
pub mod locks;
pub mod machine;
pub mod money;

pub use coordinator::{
    AddItem, CallWaiter, CoordinatorError, CoordinatorResult, ErrorKind, IdSource, KitchenItem,
    LifecycleCoordinator, OpenTable,
};
pub use delay_monitor::{DelayMonitor, DelayThresholds};
pub use locks::{LockTimeout, TableLocks};
pub use machine::{RejectReason, TransitionError};
