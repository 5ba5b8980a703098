use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Wire shape of backend error payloads. Lenient on purpose: the backend is
/// only expected to provide `{ "message": ... }`, and not always that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// One client-side validation finding, keyed by submission name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Classified outcome of an orchestrated request. Returned, never thrown:
/// callers match on the variant to drive rendering without inspecting raw
/// HTTP details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Session invalid (401/403). The caller navigates to login; this is
    /// never rendered as inline text.
    #[error("session expired or unauthorized")]
    Unauthorized,
    /// Domain conflict (409, or a duplicate-flavored message). User-correctable.
    #[error("{message}")]
    Conflict { message: String },
    /// Local validation failure; the request never reached the wire.
    #[error("validation failed for {} field(s)", .issues.len())]
    Validation { issues: Vec<FieldIssue> },
    /// Superseded or aborted. Callers drop this silently; it is not an error
    /// state and must not be logged as one.
    #[error("request cancelled")]
    Cancelled,
    /// Anything else, carrying the best message that could be extracted from
    /// the response body or transport error.
    #[error("{message}")]
    Server { message: String },
}

impl RequestError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for inline display, or `None` for outcomes that must
    /// not be shown inline (cancellation, auth redirects).
    pub fn inline_message(&self) -> Option<String> {
        match self {
            Self::Unauthorized | Self::Cancelled => None,
            Self::Conflict { message } | Self::Server { message } => Some(message.clone()),
            Self::Validation { issues } => Some(
                issues
                    .iter()
                    .map(|issue| issue.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

/// Transient UI message with an explicit expiry, evaluated by the caller.
/// Replaces timer-based message clearing: whoever renders the text decides
/// when `is_expired` and drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedMessage {
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

impl TimedMessage {
    pub fn new(text: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            expires_at,
        }
    }

    /// Message expiring `ttl` from now.
    pub fn lasting(text: impl Into<String>, ttl: TimeDelta) -> Self {
        Self::new(text, Utc::now() + ttl)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
