//! Environment-profile settings and service descriptors.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::transport::QueueOverrides;

/// RPC facade settings for one environment profile.
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    /// Broker connection URL.
    pub url: String,
    /// Environment-scoped queue-name prefix; may be empty.
    #[serde(default)]
    pub namespace: String,
    /// Active services keyed by name. An empty set is valid and yields a
    /// registry exposing no handlers.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSettings>,
}

/// Per-service configuration entry.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSettings {
    /// Methods the remote service exposes.
    pub methods: Vec<String>,
    /// Per-service logging switch; all-or-nothing for the service's handlers.
    #[serde(default = "default_logs")]
    pub logs: bool,
    /// Override fields for the service's input queue.
    #[serde(default)]
    pub input_queue: QueueOverrides,
    /// Override fields for the service's output queue.
    #[serde(default)]
    pub output_queue: QueueOverrides,
}

fn default_logs() -> bool {
    true
}

impl RpcSettings {
    /// Loads settings for a named environment profile.
    ///
    /// Sources, later winning: built-in defaults, `config/<profile>.toml`
    /// (optional), then `MQRPC__`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or the merged settings do
    /// not deserialize.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("url", "amqp://127.0.0.1:5672")?
            .set_default("namespace", "")?
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            .add_source(Environment::with_prefix("MQRPC").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Flattens the service table into descriptors, in name order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.services
            .iter()
            .map(|(name, settings)| ServiceDescriptor {
                name: name.clone(),
                methods: settings.methods.clone(),
                logs: settings.logs,
                input_queue: settings.input_queue.clone(),
                output_queue: settings.output_queue.clone(),
            })
            .collect()
    }
}

/// One configured service, flattened from [`RpcSettings`].
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Unique service name.
    pub name: String,
    /// Declared method names.
    pub methods: Vec<String>,
    /// Logging switch for this service's handlers.
    pub logs: bool,
    /// Input-queue override fields.
    pub input_queue: QueueOverrides,
    /// Output-queue override fields.
    pub output_queue: QueueOverrides,
}

impl ServiceDescriptor {
    /// Builds a descriptor with defaults (logs on, no overrides).
    #[must_use]
    pub fn new(name: impl Into<String>, methods: Vec<String>) -> Self {
        Self {
            name: name.into(),
            methods,
            logs: true,
            input_queue: QueueOverrides::default(),
            output_queue: QueueOverrides::default(),
        }
    }
}
