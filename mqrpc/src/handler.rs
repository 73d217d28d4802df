//! Typed call handlers and response-envelope interpretation.
//!
//! A [`CallHandler`] is the externally visible product of the registry: one
//! callable per (service, method) pair, handed out before the transport is
//! ready. Invoking it awaits the service's deferred client, issues the call,
//! and demultiplexes the response envelope into success, typed remote
//! failure, or protocol anomaly.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::deferred::DeferredClient;
use crate::error::RpcError;
use crate::transport::Envelope;

/// Per-service logging capability, chosen once at handler construction.
///
/// When a service's `logs` switch is off, both the notice and emerg paths
/// are no-ops for every one of its handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLogger {
    /// Log call and response lines through `tracing`.
    Enabled,
    /// Suppress all logging for the service.
    Disabled,
}

impl CallLogger {
    /// Picks the capability from the service's `logs` flag.
    #[must_use]
    pub fn for_service(logs: bool) -> Self {
        if logs {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    fn notice(self, message: &str) {
        if self == Self::Enabled {
            info!("{message}");
        }
    }

    fn notice_with(self, message: &str, detail: &Value) {
        if self == Self::Enabled {
            info!(detail = %detail, "{message}");
        }
    }

    fn emerg(self, message: &str, detail: &Value) {
        if self == Self::Enabled {
            error!(detail = %detail, "{message}");
        }
    }
}

struct HandlerInner {
    service: String,
    method: String,
    client: DeferredClient,
    logger: CallLogger,
}

/// Callable bound to one (service, method) pair.
///
/// Cheap to clone; safe to invoke concurrently and repeatedly. Stateless
/// beyond its construction-time bindings.
#[derive(Clone)]
pub struct CallHandler {
    inner: Arc<HandlerInner>,
}

impl CallHandler {
    pub(crate) fn new(
        service: String,
        method: String,
        client: DeferredClient,
        logger: CallLogger,
    ) -> Self {
        Self {
            inner: Arc::new(HandlerInner {
                service,
                method,
                client,
                logger,
            }),
        }
    }

    /// Service this handler dispatches to.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.inner.service
    }

    /// Remote method this handler invokes.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Dispatches one call and returns the `data` field of a successful
    /// envelope.
    ///
    /// Suspends until the service's client is resolved by the start phase;
    /// after a successful start there is no suspension beyond the call
    /// itself. No retries; one attempt per invocation.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Unavailable`] if the service's client can never resolve.
    /// - [`RpcError::Transport`] if the transport fails to deliver the call.
    /// - [`RpcError::Remote`] for a status-0 envelope carrying an error, the
    ///   recoverable failure callers are expected to branch on.
    /// - [`RpcError::Protocol`] for any other envelope shape.
    pub async fn call(&self, payload: Value) -> Result<Value, RpcError> {
        let inner = &self.inner;
        let description = format!("{}.{}()", inner.service, inner.method);
        inner.logger.notice(&format!("RPC call - {description}"));

        let client = inner.client.get().await?;
        let envelope = client
            .call(&inner.method, payload)
            .await
            .map_err(|source| RpcError::Transport {
                service: inner.service.clone(),
                source,
            })?;

        match envelope {
            Envelope {
                status: 1, data, ..
            } => {
                inner.logger.notice(&format!("RPC response of {description} - OK"));
                Ok(data.unwrap_or(Value::Null))
            }
            Envelope {
                status: 0,
                error: Some(error),
                ..
            } => {
                inner
                    .logger
                    .notice_with(&format!("RPC response of {description} - ERROR"), &error);
                Err(RpcError::Remote(error))
            }
            envelope => {
                let raw = serde_json::to_value(&envelope).unwrap_or(Value::Null);
                inner
                    .logger
                    .emerg(&format!("RPC response of {description} - FAIL"), &raw);
                Err(RpcError::Protocol(envelope.error.unwrap_or(raw)))
            }
        }
    }
}

impl std::fmt::Debug for CallHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHandler")
            .field("service", &self.inner.service)
            .field("method", &self.inner.method)
            .field("logger", &self.inner.logger)
            .finish()
    }
}
