//! mqrpc - Lazily-initialized RPC client facade over message-queue transports.
//!
//! This crate builds a table of typed call handlers for named remote
//! services before any broker connection exists, then resolves the
//! per-service transport sessions at start time. Calls issued early suspend
//! on a one-shot deferred client; responses are demultiplexed into success,
//! typed remote failure, or protocol anomaly.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Environment-profile settings and service descriptors.
pub mod config;
/// One-shot deferred client cell and its resolve capability.
pub mod deferred;
/// Error taxonomy for lifecycle and call failures.
pub mod error;
/// Call handlers and response-envelope interpretation.
pub mod handler;
/// Queue-name derivation and per-process instance tokens.
pub mod naming;
/// Registry lifecycle: initialize and start phases.
pub mod registry;
/// Transport collaborator contracts and wire types.
pub mod transport;
