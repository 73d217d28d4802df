//! Transport collaborator contracts and wire types.
//!
//! The message-queue transport is an external collaborator: it connects,
//! declares the two queues, and performs correlated request/response
//! delivery. This module defines the traits it must implement and the wire
//! types that cross the boundary: queue specifications and the response
//! envelope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::BoxError;

/// Wire-level response contract returned for every call.
///
/// `status = 1` means `data` is the authoritative result. `status = 0` with
/// `error` present is a recoverable, caller-visible failure. Anything else is
/// a protocol anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Outcome discriminator: 1 for success, 0 for a domain failure.
    pub status: u8,
    /// Result value, authoritative when `status` is 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Remote-supplied error value for domain failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Envelope {
    /// Builds a success envelope carrying `data`.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            status: 1,
            data: Some(data),
            error: None,
        }
    }

    /// Builds a recoverable domain-failure envelope carrying `error`.
    #[must_use]
    pub fn domain_error(error: Value) -> Self {
        Self {
            status: 0,
            data: None,
            error: Some(error),
        }
    }
}

/// Declaration parameters for one queue, derived per service per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSpec {
    /// Queue name on the broker.
    pub name: String,
    /// Whether the queue survives broker restarts.
    pub durable: bool,
    /// Whether the broker deletes the queue once unused.
    #[serde(rename = "autoDelete")]
    pub auto_delete: bool,
    /// Additional broker-specific declaration arguments.
    #[serde(flatten)]
    pub arguments: Map<String, Value>,
}

impl QueueSpec {
    /// Input-queue defaults: durable, never auto-deleted, shared across
    /// process instances via a stable name.
    #[must_use]
    pub fn input(name: String) -> Self {
        Self {
            name,
            durable: true,
            auto_delete: false,
            arguments: Map::new(),
        }
    }

    /// Output-queue defaults: non-durable, auto-deleted, uniquely named per
    /// process so responses route back to this process only.
    #[must_use]
    pub fn output(name: String) -> Self {
        Self {
            name,
            durable: false,
            auto_delete: true,
            arguments: Map::new(),
        }
    }

    /// Applies per-service override fields on top of the role defaults.
    /// Override fields win, including the name.
    #[must_use]
    pub fn apply(mut self, overrides: &QueueOverrides) -> Self {
        if let Some(name) = &overrides.name {
            self.name.clone_from(name);
        }
        if let Some(durable) = overrides.durable {
            self.durable = durable;
        }
        if let Some(auto_delete) = overrides.auto_delete {
            self.auto_delete = auto_delete;
        }
        for (key, value) in &overrides.arguments {
            self.arguments.insert(key.clone(), value.clone());
        }
        self
    }
}

/// Per-service override fields for one queue role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueOverrides {
    /// Replaces the derived queue name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replaces the role's durability default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable: Option<bool>,
    /// Replaces the role's auto-delete default.
    #[serde(rename = "autoDelete", default, skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    /// Extra declaration arguments merged into the spec.
    #[serde(flatten)]
    pub arguments: Map<String, Value>,
}

/// Parameters for establishing one service's transport session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Broker connection URL.
    pub url: String,
    /// Queue the remote service consumes requests from.
    pub input_queue: QueueSpec,
    /// Process-exclusive queue responses are delivered to.
    pub output_queue: QueueSpec,
}

/// An established transport session scoped to one service's queues.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Issues one correlated call and returns the response envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to deliver the request or
    /// receive the correlated response.
    async fn call(&self, method: &str, payload: Value) -> Result<Envelope, BoxError>;
}

impl std::fmt::Debug for dyn RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn RpcClient")
    }
}

/// Factory for per-service transport sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects to the broker, declares both queues, and returns a client
    /// bound to them.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker is unreachable or queue declaration
    /// fails.
    async fn connect(&self, options: ConnectOptions) -> Result<Arc<dyn RpcClient>, BoxError>;
}
