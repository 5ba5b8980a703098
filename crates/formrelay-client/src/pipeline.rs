use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::debug;

use formrelay_protocol::{FieldIssue, RequestError};
use formrelay_schema::{FieldKind, FieldModel};

use crate::auth::AuthContext;
use crate::orchestrator::{Orchestrator, RequestDescriptor};

/// Where a form instance currently is in its submit lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed(RequestError),
}

/// One logical form instance: validates entered values against its field
/// list, then submits them through the orchestrator.
///
/// The UI disables its trigger while a submit runs, but the pipeline guards
/// against double invocation on its own as well; a re-entrant submit resolves
/// to `Cancelled` and leaves no trace.
pub struct SubmitPipeline {
    orchestrator: Arc<Orchestrator>,
    url: String,
    operation: String,
    phase: Mutex<SubmitPhase>,
    busy: AtomicBool,
}

impl SubmitPipeline {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        url: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            url: url.into(),
            operation: operation.into(),
            phase: Mutex::new(SubmitPhase::Idle),
            busy: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase.lock().expect("phase lock poisoned").clone()
    }

    /// Return to `Idle` once a terminal phase has been acted on, so the user
    /// may correct input and retry. A manual retry is a new user action and
    /// gets a new idempotency key.
    pub fn acknowledge(&self) {
        let mut phase = self.phase.lock().expect("phase lock poisoned");
        if matches!(*phase, SubmitPhase::Succeeded | SubmitPhase::Failed(_)) {
            *phase = SubmitPhase::Idle;
        }
    }

    /// Validate `values` against `fields` and submit. Validation failures
    /// resolve without touching the network.
    pub async fn submit(
        &self,
        fields: &[FieldModel],
        values: &Map<String, Value>,
        auth: &AuthContext,
    ) -> Result<Value, RequestError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            debug!(target: "pipeline", url = %self.url, "submit already in progress; ignoring");
            return Err(RequestError::Cancelled);
        }
        let result = self.run(fields, values, auth).await;
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    async fn run(
        &self,
        fields: &[FieldModel],
        values: &Map<String, Value>,
        auth: &AuthContext,
    ) -> Result<Value, RequestError> {
        self.set_phase(SubmitPhase::Validating);
        let issues = validate(fields, values);
        if !issues.is_empty() {
            let err = RequestError::Validation { issues };
            self.set_phase(SubmitPhase::Failed(err.clone()));
            return Err(err);
        }

        self.set_phase(SubmitPhase::Submitting);
        let payload = build_payload(fields, values);
        let descriptor = RequestDescriptor::post(self.url.as_str(), Value::Object(payload))
            .operation(self.operation.clone())
            .dedupe_key(format!("submit {}", self.url));
        match self.orchestrator.send(&descriptor, auth).await {
            Ok(data) => {
                self.set_phase(SubmitPhase::Succeeded);
                Ok(data)
            }
            Err(RequestError::Cancelled) => {
                // superseded submits leave no user-visible state behind
                self.set_phase(SubmitPhase::Idle);
                Err(RequestError::Cancelled)
            }
            Err(err) => {
                self.set_phase(SubmitPhase::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn set_phase(&self, next: SubmitPhase) {
        *self.phase.lock().expect("phase lock poisoned") = next;
    }
}

/// Required-field and type checks run before any network call.
pub fn validate(fields: &[FieldModel], values: &Map<String, Value>) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    for field in fields {
        if !field.config.required {
            continue;
        }
        let value = values.get(&field.config.name);
        let filled = match field.kind.rendered() {
            FieldKind::Checkbox => value.and_then(Value::as_bool).unwrap_or(false),
            _ => value.is_some_and(|v| match v {
                Value::String(text) => !text.trim().is_empty(),
                Value::Null => false,
                _ => true,
            }),
        };
        if !filled {
            issues.push(FieldIssue::new(
                field.config.name.clone(),
                format!("{} is required", field.label),
            ));
        }
    }
    issues
}

/// Submission payload keyed by each field's `config.name`. Unchecked
/// checkboxes submit as `false`; other untouched fields are omitted.
pub fn build_payload(fields: &[FieldModel], values: &Map<String, Value>) -> Map<String, Value> {
    let mut payload = Map::new();
    for field in fields {
        let name = &field.config.name;
        match values.get(name) {
            Some(value) => {
                payload.insert(name.clone(), value.clone());
            }
            None => {
                if field.kind.rendered() == FieldKind::Checkbox {
                    payload.insert(name.clone(), Value::Bool(false));
                }
            }
        }
    }
    payload
}
