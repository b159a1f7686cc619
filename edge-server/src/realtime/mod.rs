//! Realtime fan-out
//!
//! - **router**: pure event → rooms mapping
//! - **gateway**: connection registry, room membership, best-effort delivery
//! - **session**: one live connection with an explicit join/leave API
//! - **ws**: axum websocket transport

pub mod gateway;
pub mod router;
pub mod session;
pub mod ws;

pub use gateway::{EventSink, GatewayError, PublishReport, RealtimeGateway};
pub use router::compute_audience;
pub use session::{Session, SessionId, SessionInfo};
