//! Error types for registry lifecycle and call dispatch.
//!
//! This module contains the error taxonomy for configuration, connection,
//! and per-call failures.

use serde_json::Value;

/// Boxed error type used at the transport collaborator boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the registry and its call handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Malformed or duplicate service/method declarations
    #[error("Configuration Error: {0}")]
    Config(String),
    /// The registry's start phase was invoked more than once
    #[error("Registry Already Started")]
    AlreadyStarted,
    /// The transport failed to establish a session during start
    #[error("Connection Error for service '{service}': {source}")]
    Connection {
        /// Service whose connection attempt failed.
        service: String,
        /// Underlying transport failure.
        #[source]
        source: BoxError,
    },
    /// The service's client can never resolve (start failed or was abandoned)
    #[error("Service '{service}' never became available")]
    Unavailable {
        /// Service whose deferred client was dropped unresolved.
        service: String,
    },
    /// Recoverable remote failure carried in a status-0 envelope
    #[error("Remote Error: {0}")]
    Remote(Value),
    /// Malformed or unexpected response envelope
    #[error("Protocol Anomaly: {0}")]
    Protocol(Value),
    /// The call itself failed at the transport layer
    #[error("Transport Error for service '{service}': {source}")]
    Transport {
        /// Service whose call failed in flight.
        service: String,
        /// Underlying transport failure.
        #[source]
        source: BoxError,
    },
}

impl RpcError {
    /// Returns `true` if this is a recoverable remote-domain failure the
    /// caller is expected to branch on.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns `true` if this is a protocol anomaly: a malformed envelope
    /// callers should treat as "should not happen".
    #[must_use]
    pub fn is_protocol_anomaly(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns `true` if this error aborts an entire lifecycle phase rather
    /// than a single call.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::AlreadyStarted | Self::Connection { .. })
    }

    /// Returns the remote-supplied error value for [`RpcError::Remote`].
    #[must_use]
    pub fn remote_error(&self) -> Option<&Value> {
        match self {
            Self::Remote(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_classification() {
        assert!(RpcError::Remote(json!({"code": 42})).is_remote());
        assert!(!RpcError::Remote(json!(null)).is_protocol_anomaly());
        assert!(RpcError::Protocol(json!({"status": 2})).is_protocol_anomaly());
        assert!(!RpcError::Protocol(json!(null)).is_remote());

        assert!(RpcError::Config("duplicate".into()).is_fatal());
        assert!(RpcError::AlreadyStarted.is_fatal());
        assert!(!RpcError::Remote(json!(null)).is_fatal());
        assert!(!RpcError::Protocol(json!(null)).is_fatal());
    }

    #[test]
    fn test_remote_error_accessor() {
        let error = RpcError::Remote(json!({"reason": "quota"}));
        assert_eq!(error.remote_error(), Some(&json!({"reason": "quota"})));
        assert_eq!(RpcError::AlreadyStarted.remote_error(), None);
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::Config("service 'Notifier' declared twice".into());
        assert_eq!(
            err.to_string(),
            "Configuration Error: service 'Notifier' declared twice"
        );

        let err = RpcError::Unavailable {
            service: "Notifier".into(),
        };
        assert_eq!(err.to_string(), "Service 'Notifier' never became available");

        let err = RpcError::Remote(json!({"code": 7}));
        assert_eq!(err.to_string(), r#"Remote Error: {"code":7}"#);
    }
}
