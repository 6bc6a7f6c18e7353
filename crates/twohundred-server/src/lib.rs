//! Tokio host for the 200 engine.
//!
//! Owns the registry of running games, serializes actions per game, drives
//! bot seats and closes games that sit idle. The socket transport is not
//! part of this crate; it calls the entry points in [`service`] and forwards
//! [`protocol::ServerMessage`]s to clients.

pub mod config;
pub mod monitor;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod table;

pub use config::ServerConfig;
pub use monitor::TimeoutMonitor;
pub use protocol::{EndReason, ServerMessage};
pub use registry::{GameRegistry, ServiceError};
pub use service::SeatRequest;
