//! Shared mock transport for registry and dispatch tests.

use async_trait::async_trait;
use mqrpc::error::BoxError;
use mqrpc::transport::{ConnectOptions, Envelope, RpcClient, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Scripted behavior for one service's connection attempt.
#[derive(Clone)]
pub enum ConnectOutcome {
    /// Connect succeeds; every call answers with this envelope.
    Respond(Envelope),
    /// Connect succeeds; calls answer per method, unknown methods get a
    /// status-0 envelope without an error field.
    Script(HashMap<String, Envelope>),
    /// Connect fails with this message.
    Fail(String),
    /// Connect never completes.
    Hang,
}

/// In-memory transport double that records connection options.
#[derive(Default)]
pub struct MockTransport {
    outcomes: Mutex<HashMap<String, ConnectOutcome>>,
    connects: Mutex<Vec<ConnectOptions>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the outcome for `service` (matched against the first fragment
    /// of the derived input-queue name).
    pub fn on_connect(self, service: &str, outcome: ConnectOutcome) -> Self {
        self.outcomes.lock().insert(service.to_string(), outcome);
        self
    }

    /// Connection options seen so far, in arrival order.
    pub fn connects(&self) -> Vec<ConnectOptions> {
        self.connects.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, options: ConnectOptions) -> Result<Arc<dyn RpcClient>, BoxError> {
        let service = options
            .input_queue
            .name
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string();
        self.connects.lock().push(options);

        let outcome = self
            .outcomes
            .lock()
            .get(&service)
            .cloned()
            .unwrap_or(ConnectOutcome::Respond(Envelope::ok(Value::Null)));

        match outcome {
            ConnectOutcome::Respond(envelope) => Ok(Arc::new(MockClient {
                default: envelope,
                script: HashMap::new(),
            })),
            ConnectOutcome::Script(script) => Ok(Arc::new(MockClient {
                default: Envelope {
                    status: 0,
                    data: None,
                    error: None,
                },
                script,
            })),
            ConnectOutcome::Fail(message) => Err(message.into()),
            ConnectOutcome::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never completes")
            }
        }
    }
}

struct MockClient {
    default: Envelope,
    script: HashMap<String, Envelope>,
}

#[async_trait]
impl RpcClient for MockClient {
    async fn call(&self, method: &str, _payload: Value) -> Result<Envelope, BoxError> {
        Ok(self.script.get(method).cloned().unwrap_or_else(|| self.default.clone()))
    }
}
