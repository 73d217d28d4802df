//! One-shot deferred client cell.
//!
//! Call handlers are handed out before any transport session exists. Each
//! service gets a [`DeferredClient`], a single-assignment cell that any
//! number of in-flight calls can await, and the start phase holds the
//! matching [`ClientResolver`], the capability to fill the cell exactly once.

use std::sync::Arc;
use tokio::sync::watch;

use crate::error::RpcError;
use crate::transport::RpcClient;

type Slot = Option<Arc<dyn RpcClient>>;

/// Awaitable handle to a service's not-yet-established client.
///
/// Cheap to clone; every clone observes the same resolved client. If the
/// resolver is dropped unresolved (the start phase failed), waiters fail
/// with [`RpcError::Unavailable`] instead of hanging.
#[derive(Clone)]
pub struct DeferredClient {
    service: Arc<str>,
    rx: watch::Receiver<Slot>,
}

/// Capability to resolve one [`DeferredClient`], held by the start phase.
///
/// Resolution consumes the capability, so a handle cannot be assigned twice.
pub struct ClientResolver {
    tx: watch::Sender<Slot>,
}

/// Creates an unresolved cell and its resolve capability for `service`.
#[must_use]
pub fn deferred_client(service: &str) -> (DeferredClient, ClientResolver) {
    let (tx, rx) = watch::channel(None);
    (
        DeferredClient {
            service: Arc::from(service),
            rx,
        },
        ClientResolver { tx },
    )
}

impl DeferredClient {
    /// Waits for the client, suspending the caller until the start phase
    /// resolves this service.
    ///
    /// Returns immediately once resolved; later waiters never suspend.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Unavailable`] if the resolver was dropped without
    /// resolving: the service can never become available in this process.
    pub async fn get(&self) -> Result<Arc<dyn RpcClient>, RpcError> {
        let mut rx = self.rx.clone();
        let slot = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| RpcError::Unavailable {
                service: self.service.to_string(),
            })?;
        slot.as_ref().map(Arc::clone).ok_or_else(|| RpcError::Unavailable {
            service: self.service.to_string(),
        })
    }

    /// Returns `true` once the start phase has assigned a client.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Name of the service this handle belongs to.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl std::fmt::Debug for DeferredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredClient")
            .field("service", &self.service)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl ClientResolver {
    /// Assigns the client, waking every pending waiter.
    pub fn resolve(self, client: Arc<dyn RpcClient>) {
        // Waiters hold receiver clones; send_replace works even if none are
        // currently parked.
        let _ = self.tx.send_replace(Some(client));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::transport::Envelope;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;

    struct NullClient;

    #[async_trait]
    impl RpcClient for NullClient {
        async fn call(&self, _method: &str, _payload: Value) -> Result<Envelope, BoxError> {
            Ok(Envelope::ok(Value::Null))
        }
    }

    #[tokio::test]
    async fn test_waiters_resolve_after_assignment() {
        let (deferred, resolver) = deferred_client("Notifier");
        assert_eq!(deferred.service(), "Notifier");
        assert!(!deferred.is_resolved());

        let waiter = {
            let deferred = deferred.clone();
            tokio::spawn(async move { deferred.get().await.map(|_| ()) })
        };

        // Give the waiter a chance to park on the cell first.
        tokio::task::yield_now().await;
        resolver.resolve(Arc::new(NullClient));

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter task should not panic")
            .expect("waiter should receive the client");
        assert!(deferred.is_resolved());
    }

    #[tokio::test]
    async fn test_all_waiters_observe_the_same_client() {
        let (deferred, resolver) = deferred_client("Notifier");
        let client: Arc<dyn RpcClient> = Arc::new(NullClient);
        resolver.resolve(Arc::clone(&client));

        let first = deferred.get().await.expect("resolved");
        let second = deferred.clone().get().await.expect("resolved");
        assert!(Arc::ptr_eq(&first, &client));
        assert!(Arc::ptr_eq(&second, &client));
    }

    #[tokio::test]
    async fn test_dropped_resolver_fails_waiters() {
        let (deferred, resolver) = deferred_client("Notifier");
        drop(resolver);

        let err = deferred.get().await.expect_err("cell can never resolve");
        match err {
            RpcError::Unavailable { service } => assert_eq!(service, "Notifier"),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolution_survives_resolver_drop() {
        let (deferred, resolver) = deferred_client("Notifier");
        resolver.resolve(Arc::new(NullClient));
        // Resolver is consumed; the value must still be observable.
        assert!(deferred.get().await.is_ok());
    }
}
