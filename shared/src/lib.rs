//! Shared types for the table & order coordinator
//!
//! Types used by both the edge server and its clients (admin dashboard,
//! waiter tablets, kitchen display, customer app):
//!
//! - [`error`]: error codes, [`AppError`](error::AppError) and the unified API response
//! - [`models`]: tables, orders, items, waiter calls, products, roles
//! - [`message`]: realtime events, rooms and websocket frames
//! - [`cache`]: the client-side last-write-wins view

pub mod cache;
pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use message::{EventPayload, RealtimeEvent, Room};
