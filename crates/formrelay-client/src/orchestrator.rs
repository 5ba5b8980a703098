use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use formrelay_protocol::{ErrorBody, RequestError};

use crate::auth::AuthContext;
use crate::http;
use crate::idempotency;
use crate::inflight::InFlightRegistry;

/// Tenant scoping header.
pub const HEADER_ORG: &str = "x-org-id";
/// Canonical casing; lowercase variants seen in older clients are a
/// migration fix, not something to replicate.
pub const HEADER_IDEMPOTENCY: &str = "Idempotency-Key";

const DEFAULT_FAILURE_MESSAGE: &str = "Request failed, please try again";

/// Description of one outbound API call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Requests sharing a key must not run concurrently; the newest one
    /// supersedes the rest. Defaults to `"<METHOD> <url>"`.
    pub dedupe_key: Option<String>,
    /// Logical action name seeding the idempotency-key prefix for mutating
    /// calls, e.g. `form:create`. Derived from method and path when unset.
    pub operation: Option<String>,
    /// Shown when a failure carries no extractable message.
    pub fallback_message: Option<String>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            dedupe_key: None,
            operation: None,
            fallback_message: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        let mut descriptor = Self::new(Method::POST, url);
        descriptor.body = Some(body);
        descriptor
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        let mut descriptor = Self::new(Method::PUT, url);
        descriptor.body = Some(body);
        descriptor
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = Some(message.into());
        self
    }

    fn effective_dedupe_key(&self) -> String {
        self.dedupe_key
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.url))
    }

    fn is_mutating(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    fn idempotency_prefix(&self) -> String {
        self.operation.clone().unwrap_or_else(|| {
            format!(
                "{}:{}",
                self.method.as_str().to_ascii_lowercase(),
                path_of(&self.url)
            )
        })
    }
}

/// Issues described requests with auth headers, idempotency keys, in-flight
/// dedup/cancellation, and error classification. All auth state arrives via
/// the [`AuthContext`] parameter; nothing here reads ambient stores.
pub struct Orchestrator {
    http: reqwest::Client,
    registry: Arc<InFlightRegistry>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_client(http::client().clone())
    }

    /// Use a specific client, e.g. one with a short timeout.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            http: client,
            registry: InFlightRegistry::new(),
        }
    }

    pub fn registry(&self) -> &Arc<InFlightRegistry> {
        &self.registry
    }

    /// Issue `descriptor`, superseding any pending request with the same
    /// dedupe key. Resolves to the parsed JSON body on 2xx, or a classified
    /// failure. `Cancelled` outcomes are bookkeeping, not errors.
    pub async fn send(
        &self,
        descriptor: &RequestDescriptor,
        auth: &AuthContext,
    ) -> Result<Value, RequestError> {
        let key = descriptor.effective_dedupe_key();
        let ticket = self.registry.begin(&key);
        debug!(
            target: "orchestrator",
            method = %descriptor.method,
            url = %descriptor.url,
            "issuing request"
        );

        let mut request = self
            .http
            .request(descriptor.method.clone(), descriptor.url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = auth.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(org) = auth.org_id.as_deref() {
            request = request.header(HEADER_ORG, org);
        }
        if descriptor.is_mutating() {
            request = request.header(
                HEADER_IDEMPOTENCY,
                idempotency::generate_key(&descriptor.idempotency_prefix()),
            );
        }
        if let Some(body) = &descriptor.body {
            // also sets Content-Type: application/json
            request = request.json(body);
        }

        let fallback = descriptor.fallback_message.as_deref();
        let outcome = tokio::select! {
            _ = ticket.cancelled() => Err(RequestError::Cancelled),
            result = request.send() => match result {
                Ok(response) => classify_response(response, fallback).await,
                Err(err) => Err(classify_transport(&err)),
            },
        };

        // A newer request may have superseded this one while the response was
        // in transit; its result wins even though ours settled.
        if ticket.is_cancelled() {
            debug!(target: "orchestrator", key = %key, "request superseded; dropping result");
            return Err(RequestError::Cancelled);
        }

        if let Err(err) = &outcome {
            match err {
                RequestError::Cancelled => {}
                RequestError::Unauthorized => {
                    debug!(target: "orchestrator", url = %descriptor.url, "unauthorized response");
                }
                other => {
                    warn!(target: "orchestrator", url = %descriptor.url, error = %other, "request failed");
                }
            }
        }
        outcome
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

async fn classify_response(
    response: reqwest::Response,
    fallback: Option<&str>,
) -> Result<Value, RequestError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RequestError::Unauthorized);
    }
    if status.is_success() {
        let text = response
            .text()
            .await
            .map_err(|err| RequestError::server(err.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&text)
            .map_err(|err| RequestError::server(format!("invalid JSON response: {err}")));
    }

    let extracted = response.text().await.ok().and_then(|text| extract_message(&text));
    if status == StatusCode::CONFLICT {
        let message = extracted.unwrap_or_else(|| "Resource already exists".to_string());
        return Err(RequestError::conflict(message));
    }
    if let Some(message) = &extracted {
        if is_conflict_message(message) {
            return Err(RequestError::conflict(message.clone()));
        }
    }
    let message = extracted
        .or_else(|| fallback.map(str::to_string))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
    Err(RequestError::Server { message })
}

fn classify_transport(err: &reqwest::Error) -> RequestError {
    if err.is_timeout() {
        return RequestError::server("Request timed out");
    }
    RequestError::server(err.to_string())
}

fn extract_message(text: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(text)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
}

fn is_conflict_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("already exists") || lower.contains("unique constraint")
}

fn path_of(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "/",
    }
}
