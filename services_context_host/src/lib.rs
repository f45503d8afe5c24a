//! # Context Host Service
//!
//! This crate publishes editor contexts from the editor core to any number
//! of presentation clients.
//!
//! ## Philosophy
//!
//! - **Snapshots, not streams**: Every frame carries a complete context
//! - **Immutable frames**: Frames are shared by `Arc`, never mutated
//! - **Monotonic revisions**: Revisions strictly increase per host
//! - **Latest wins**: A slow subscriber skips superseded frames
//! - **Validated at the door**: The configured policy runs before publishing
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A transport (sockets, framing)
//! - A diff or patch protocol
//! - A renderer

pub mod config;
pub mod frame;
pub mod host;

pub use config::{ConfigError, ConfigResult, HostConfig};
pub use frame::{ContextFrame, HostId};
pub use host::{ContextHost, ContextSubscriber, HostError};
