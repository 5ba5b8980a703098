use std::sync::Mutex;

/// A place credentials can be read from: the live session store, persisted
/// settings, or anything else a host application provides.
pub trait CredentialSource {
    fn token(&self) -> Option<String>;
    fn org_id(&self) -> Option<String>;
}

/// In-memory credential store, the primary source while a session is live.
#[derive(Default)]
pub struct MemoryCredentials {
    inner: Mutex<Stored>,
}

#[derive(Default, Clone)]
struct Stored {
    token: Option<String>,
    org_id: Option<String>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.inner.lock().expect("credentials lock poisoned").token = Some(token.into());
    }

    pub fn set_org_id(&self, org_id: impl Into<String>) {
        self.inner.lock().expect("credentials lock poisoned").org_id = Some(org_id.into());
    }

    /// Forget everything, e.g. on logout.
    pub fn clear(&self) {
        *self.inner.lock().expect("credentials lock poisoned") = Stored::default();
    }
}

impl CredentialSource for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("credentials lock poisoned")
            .token
            .clone()
    }

    fn org_id(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("credentials lock poisoned")
            .org_id
            .clone()
    }
}

/// Resolved auth values attached to outbound requests. Passed explicitly into
/// the orchestrator; nothing in the request path reads ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub token: Option<String>,
    pub org_id: Option<String>,
}

impl AuthContext {
    /// Blank strings count as absent.
    pub fn new(token: Option<String>, org_id: Option<String>) -> Self {
        Self {
            token: non_blank(token),
            org_id: non_blank(org_id),
        }
    }

    /// Resolve from a primary source, falling back to a persistent one per
    /// value when the primary holds nothing usable.
    pub fn resolve(primary: &dyn CredentialSource, fallback: &dyn CredentialSource) -> Self {
        Self {
            token: non_blank(primary.token()).or_else(|| non_blank(fallback.token())),
            org_id: non_blank(primary.org_id()).or_else(|| non_blank(fallback.org_id())),
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
