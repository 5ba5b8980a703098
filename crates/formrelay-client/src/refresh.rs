use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use formrelay_protocol::RequestError;

use crate::auth::AuthContext;
use crate::orchestrator::{Orchestrator, RequestDescriptor};

/// Keeps one displayed collection in sync with the backend.
///
/// Callers trigger [`refresh`](Self::refresh) on mount and whenever a
/// dependency changes (auth token, org, filter selection). All fetches share
/// one dedupe key, so a newer refresh supersedes an older in-flight one, and
/// a superseded fetch never clears or overwrites data already on screen.
pub struct ListRefresher {
    orchestrator: Arc<Orchestrator>,
    url: String,
    dedupe_key: String,
    state: Mutex<RefreshState>,
}

#[derive(Default)]
struct RefreshState {
    data: Option<Value>,
    error: Option<String>,
}

impl ListRefresher {
    pub fn new(orchestrator: Arc<Orchestrator>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            orchestrator,
            dedupe_key: format!("refresh {url}"),
            url,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Last successfully fetched collection, if any.
    pub fn data(&self) -> Option<Value> {
        self.state.lock().expect("refresh state lock poisoned").data.clone()
    }

    /// Inline-displayable message from the last failed refresh, if any.
    pub fn error(&self) -> Option<String> {
        self.state
            .lock()
            .expect("refresh state lock poisoned")
            .error
            .clone()
    }

    /// Fetch with the given query, superseding any refresh still pending.
    pub async fn refresh(
        &self,
        query: &[(&str, &str)],
        auth: &AuthContext,
    ) -> Result<Value, RequestError> {
        let url = compose_url(&self.url, query);
        let descriptor = RequestDescriptor::get(url).dedupe_key(self.dedupe_key.clone());
        match self.orchestrator.send(&descriptor, auth).await {
            Ok(data) => {
                let mut state = self.state.lock().expect("refresh state lock poisoned");
                state.data = Some(data.clone());
                state.error = None;
                Ok(data)
            }
            Err(RequestError::Cancelled) => {
                debug!(target: "refresh", url = %self.url, "fetch superseded; keeping displayed data");
                Err(RequestError::Cancelled)
            }
            Err(err) => {
                // keep the last-good data visible alongside the error
                let mut state = self.state.lock().expect("refresh state lock poisoned");
                state.error = err.inline_message();
                Err(err)
            }
        }
    }

    /// Cancel any refresh still pending; the unmount hook.
    pub fn detach(&self) {
        self.orchestrator.registry().cancel(&self.dedupe_key);
    }
}

impl Drop for ListRefresher {
    fn drop(&mut self) {
        self.detach();
    }
}

fn compose_url(base: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return base.to_string();
    }
    match reqwest::Url::parse_with_params(base, query) {
        Ok(url) => url.to_string(),
        Err(_) => base.to_string(),
    }
}
