//! Bridge facade: the single object handed across the trust boundary.
//!
//! `request` never fails; every failure comes back as a `ResponseEnvelope`
//! with a `code`. Lifecycle and log helpers return `Result` so callers can
//! handle `BridgeError` directly.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use lumen_core::error::{BridgeError, Result};
use lumen_core::protocol::body::{serialize, Headers, RequestBody};
use lumen_core::protocol::envelope::{validate_path, Reply, RequestEnvelope, ResponseEnvelope};
use lumen_core::protocol::events::{HealthStatus, LogEntry, QueueProgress};
use lumen_core::protocol::normalize;

use crate::config::BridgeConfig;
use crate::invoker::{Deadline, Invoker};
use crate::retry::{with_retry, RetryPolicy};
use crate::subscriptions::{Subscription, SubscriptionRegistry};
use crate::transport::{Channel, IpcEvent, ListenerId};

/// Options for one HTTP-shaped request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub path: String,
    pub method: String,
    pub headers: Headers,
    pub body: RequestBody,
    /// Falls back to `request.default_timeout_ms`.
    pub timeout_ms: Option<u64>,
    /// Opt-in retries; a single attempt otherwise.
    pub retry: Option<RetryPolicy>,
    pub cancel: CancellationToken,
}

impl RequestOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: "GET".into(),
            headers: Headers::new(),
            body: RequestBody::Empty,
            timeout_ms: None,
            retry: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    pub fn post(path: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        Self::new(path).method("POST").body(body)
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

pub struct Bridge {
    cfg: Arc<BridgeConfig>,
    invoker: Invoker,
    subscriptions: SubscriptionRegistry,
}

impl Bridge {
    pub fn new(transport: Arc<dyn Channel>, cfg: BridgeConfig) -> Self {
        Self {
            cfg: Arc::new(cfg),
            invoker: Invoker::new(Arc::clone(&transport)),
            subscriptions: SubscriptionRegistry::new(transport),
        }
    }

    pub fn with_defaults(transport: Arc<dyn Channel>) -> Self {
        Self::new(transport, BridgeConfig::default())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.cfg
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Issue an HTTP-shaped request to the engine. Never fails.
    ///
    /// A structured reply from the engine comes back exactly as sent.
    pub async fn request(&self, opts: RequestOptions) -> ResponseEnvelope {
        let path = opts.path.clone();
        match self.try_request(opts).await {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(%path, code = e.code().as_str(), error = %e, "request failed");
                ResponseEnvelope::from_error(&e)
            }
        }
    }

    async fn try_request(&self, opts: RequestOptions) -> Result<ResponseEnvelope> {
        validate_path(&opts.path)?;
        let body = serialize(&opts.body, &opts.headers)?;

        let channel = self.cfg.channels.request.as_str();
        let timeout_ms = opts.timeout_ms.unwrap_or(self.cfg.request.default_timeout_ms);
        let deadline = Deadline::new(timeout_ms, self.cfg.request.timeout_grace_ms);

        let envelope = RequestEnvelope {
            path: opts.path,
            method: opts.method,
            headers: body.headers().cloned().unwrap_or(opts.headers),
            body,
            timeout_ms,
        };
        tracing::debug!(
            channel,
            path = %envelope.path,
            method = %envelope.method,
            body = envelope.body.kind(),
            "dispatching request"
        );
        let payload = serde_json::to_value(&envelope)
            .map_err(|e| BridgeError::BadRequest(format!("envelope encode failed: {e}")))?;

        let policy = opts.retry.unwrap_or_else(RetryPolicy::once);
        let cancel = &opts.cancel;
        let invoker = &self.invoker;
        let raw = with_retry(policy, channel, cancel, || {
            invoker.invoke(channel, payload.clone(), Some(deadline), cancel)
        })
        .await?;

        match Reply::classify(channel, raw)? {
            Reply::Structured(env) => Ok(env),
            Reply::Raw(v) => Err(BridgeError::bad_response(
                channel,
                format!("expected a response envelope, got {}", json_kind(&v)),
            )),
        }
    }

    /// Start the backing engine, retried with the configured policy.
    pub async fn start(&self) -> Result<Value> {
        self.call(&self.cfg.channels.start, Value::Null, &CancellationToken::new())
            .await
    }

    /// Stop the backing engine, retried with the configured policy.
    pub async fn stop(&self) -> Result<Value> {
        self.call(&self.cfg.channels.stop, Value::Null, &CancellationToken::new())
            .await
    }

    /// Retried, normalized invoke on a bare-payload channel.
    ///
    /// No timeout is applied here; the transport default bounds these calls.
    pub async fn call(
        &self,
        channel: &str,
        payload: Value,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let invoker = &self.invoker;
        let payload = &payload;
        with_retry(self.cfg.retry, channel, cancel, || {
            let payload = payload.clone();
            async move {
                let raw = invoker.invoke(channel, payload, None, cancel).await?;
                normalize(channel, Reply::classify(channel, raw)?)
            }
        })
        .await
    }

    /// Health status pushes.
    pub fn on_status<F>(&self, handler: F) -> Subscription
    where
        F: Fn(HealthStatus) + Send + Sync + 'static,
    {
        self.subscriptions
            .subscribe_typed(&self.cfg.channels.status, handler)
    }

    pub fn logs(&self) -> Logs<'_> {
        Logs { bridge: self }
    }

    pub fn queue(&self) -> Queue<'_> {
        Queue { bridge: self }
    }

    /// Raw listener, bypassing normalization.
    pub fn on<F>(&self, channel: &str, listener: F) -> ListenerId
    where
        F: Fn(&IpcEvent) + Send + Sync + 'static,
    {
        self.invoker.transport().listen(channel, Arc::new(listener))
    }

    pub fn off(&self, channel: &str, id: ListenerId) -> bool {
        self.invoker.transport().unlisten(channel, id)
    }

    pub fn remove_all_listeners(&self, channel: &str) -> usize {
        self.invoker.transport().unlisten_all(channel)
    }

    /// Dispose every subscription created through this bridge.
    pub fn shutdown(&self) -> usize {
        let n = self.subscriptions.dispose_all();
        tracing::info!(disposed = n, "bridge shut down");
        n
    }
}

/// Log helpers (`bridge.logs()`).
pub struct Logs<'a> {
    bridge: &'a Bridge,
}

impl Logs<'_> {
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(LogEntry) + Send + Sync + 'static,
    {
        self.bridge
            .subscriptions
            .subscribe_typed(&self.bridge.cfg.channels.log, handler)
    }

    /// Most recent log lines; `None` uses `logs.recent_limit`.
    pub async fn recent(&self, limit: Option<u32>) -> Result<Vec<LogEntry>> {
        let cfg = &self.bridge.cfg;
        let channel = cfg.channels.logs_recent.as_str();
        let limit = limit.unwrap_or(cfg.logs.recent_limit);

        let value = self
            .bridge
            .call(channel, json!({ "limit": limit }), &CancellationToken::new())
            .await?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::bad_response(channel, format!("invalid log entries: {e}")))
    }
}

/// Indexing queue helpers (`bridge.queue()`).
pub struct Queue<'a> {
    bridge: &'a Bridge,
}

impl Queue<'_> {
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(QueueProgress) + Send + Sync + 'static,
    {
        self.bridge
            .subscriptions
            .subscribe_typed(&self.bridge.cfg.channels.queue, handler)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without `ok`",
    }
}
