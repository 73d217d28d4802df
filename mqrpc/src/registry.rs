//! Client registry lifecycle: initialize and start phases.
//!
//! The registry is built in two steps. `initialize` is synchronous and never
//! touches the transport: it validates the configured services, creates one
//! deferred client per service, and exposes the full handler table so the
//! rest of the application can hold call handlers before any broker session
//! exists. `start` then connects every service concurrently and resolves the
//! deferred clients.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::config::{RpcSettings, ServiceDescriptor};
use crate::deferred::{deferred_client, ClientResolver};
use crate::error::RpcError;
use crate::handler::{CallHandler, CallLogger};
use crate::naming::{instance_token, queue_name};
use crate::transport::{ConnectOptions, QueueSpec, Transport};

/// Nested handler table: service name → method name → [`CallHandler`].
///
/// Cheap to clone and safe to share across unrelated application code; every
/// clone dispatches through the same deferred clients.
#[derive(Debug, Clone, Default)]
pub struct Handlers {
    inner: HashMap<String, HashMap<String, CallHandler>>,
}

impl Handlers {
    /// Looks up the handler for one (service, method) pair.
    #[must_use]
    pub fn get(&self, service: &str, method: &str) -> Option<&CallHandler> {
        self.inner.get(service).and_then(|methods| methods.get(method))
    }

    /// Returns the method table for one service.
    #[must_use]
    pub fn service(&self, service: &str) -> Option<&HashMap<String, CallHandler>> {
        self.inner.get(service)
    }

    /// Iterates over service names.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Number of configured services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` when no services are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Lazily-initialized RPC client registry for a set of configured services.
pub struct RpcRegistry {
    url: String,
    namespace: String,
    services: Vec<ServiceDescriptor>,
    handlers: Handlers,
    // Taken exactly once by start; aligned with `services` by index.
    resolvers: Mutex<Option<Vec<ClientResolver>>>,
}

impl RpcRegistry {
    /// Builds the registry from settings: one deferred client per service and
    /// one handler per declared method.
    ///
    /// Synchronous and transport-free, so handler references can be
    /// distributed before the broker is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Config`] for malformed descriptors: a duplicate
    /// service name, an empty method list, or a method declared twice.
    pub fn initialize(settings: &RpcSettings) -> Result<Self, RpcError> {
        Self::from_descriptors(&settings.url, &settings.namespace, settings.descriptors())
    }

    /// Builds the registry from already-flattened descriptors.
    ///
    /// # Errors
    ///
    /// Same validation as [`RpcRegistry::initialize`].
    pub fn from_descriptors(
        url: &str,
        namespace: &str,
        descriptors: Vec<ServiceDescriptor>,
    ) -> Result<Self, RpcError> {
        validate(&descriptors)?;

        let mut handlers = HashMap::with_capacity(descriptors.len());
        let mut resolvers = Vec::with_capacity(descriptors.len());

        for service in &descriptors {
            let (deferred, resolver) = deferred_client(&service.name);
            let logger = CallLogger::for_service(service.logs);

            let methods: HashMap<String, CallHandler> = service
                .methods
                .iter()
                .map(|method| {
                    let handler = CallHandler::new(
                        service.name.clone(),
                        method.clone(),
                        deferred.clone(),
                        logger,
                    );
                    (method.clone(), handler)
                })
                .collect();

            handlers.insert(service.name.clone(), methods);
            resolvers.push(resolver);
        }

        Ok(Self {
            url: url.to_string(),
            namespace: namespace.to_string(),
            services: descriptors,
            handlers: Handlers { inner: handlers },
            resolvers: Mutex::new(Some(resolvers)),
        })
    }

    /// Returns the handler table. Available immediately after initialize;
    /// calls issued through it suspend until start resolves their service.
    #[must_use]
    pub fn handlers(&self) -> Handlers {
        self.handlers.clone()
    }

    /// Namespace used as a queue-name fragment.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Connects every configured service concurrently and resolves its
    /// deferred client.
    ///
    /// All-or-nothing: the first connection failure fails the whole phase and
    /// no partially-activated state is supported. Services whose resolvers
    /// are abandoned by the failure report [`RpcError::Unavailable`] to any
    /// waiting caller instead of leaving it suspended.
    ///
    /// # Errors
    ///
    /// - [`RpcError::AlreadyStarted`] if start was already invoked.
    /// - [`RpcError::Connection`] for the first service whose transport
    ///   session could not be established.
    pub async fn start(&self, transport: &dyn Transport) -> Result<(), RpcError> {
        let resolvers = self
            .resolvers
            .lock()
            .take()
            .ok_or(RpcError::AlreadyStarted)?;

        let connects = self
            .services
            .iter()
            .zip(resolvers)
            .map(|(service, resolver)| self.connect_service(transport, service, resolver));

        futures_util::future::try_join_all(connects).await?;
        info!("RPC registry started - {} service(s) connected", self.services.len());
        Ok(())
    }

    async fn connect_service(
        &self,
        transport: &dyn Transport,
        service: &ServiceDescriptor,
        resolver: ClientResolver,
    ) -> Result<(), RpcError> {
        let input_queue = QueueSpec::input(queue_name([
            service.name.as_str(),
            self.namespace.as_str(),
            "input",
        ]))
        .apply(&service.input_queue);

        let output_queue = QueueSpec::output(queue_name([
            service.name.as_str(),
            self.namespace.as_str(),
            "output",
            instance_token().as_str(),
        ]))
        .apply(&service.output_queue);

        let client = transport
            .connect(ConnectOptions {
                url: self.url.clone(),
                input_queue,
                output_queue,
            })
            .await
            .map_err(|source| RpcError::Connection {
                service: service.name.clone(),
                source,
            })?;

        info!("RPC service connected - {}", service.name);
        resolver.resolve(client);
        Ok(())
    }
}

impl std::fmt::Debug for RpcRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcRegistry")
            .field("namespace", &self.namespace)
            .field("services", &self.services.len())
            .field("started", &self.resolvers.lock().is_none())
            .finish()
    }
}

fn validate(descriptors: &[ServiceDescriptor]) -> Result<(), RpcError> {
    let mut names = HashSet::new();
    for service in descriptors {
        if !names.insert(service.name.as_str()) {
            return Err(RpcError::Config(format!(
                "service '{}' declared twice",
                service.name
            )));
        }
        if service.methods.is_empty() {
            return Err(RpcError::Config(format!(
                "service '{}' declares no methods",
                service.name
            )));
        }
        let mut methods = HashSet::new();
        for method in &service.methods {
            if !methods.insert(method.as_str()) {
                return Err(RpcError::Config(format!(
                    "service '{}' declares method '{method}' twice",
                    service.name
                )));
            }
        }
    }
    Ok(())
}
