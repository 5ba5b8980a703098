//! Request orchestration for the console and portal frontends.
//!
//! Everything an API-backed page needs between "user did something" and
//! "backend answered": auth-header injection from an explicit
//! [`AuthContext`], idempotency keys for mutating calls, last-write-wins
//! dedup/cancellation of concurrent requests, and classification of failures
//! into the closed [`RequestError`] set. The submission pipeline and list
//! refresher compose those pieces for the two page shapes that repeat across
//! every data-driven screen.

pub mod auth;
pub mod http;
pub mod idempotency;
pub mod inflight;
pub mod orchestrator;
pub mod pipeline;
pub mod refresh;
#[cfg(test)]
mod test_support;

pub use auth::{AuthContext, CredentialSource, MemoryCredentials};
pub use idempotency::generate_key;
pub use inflight::{FlightTicket, InFlightRegistry};
pub use orchestrator::{Orchestrator, RequestDescriptor, HEADER_IDEMPOTENCY, HEADER_ORG};
pub use pipeline::{SubmitPhase, SubmitPipeline};
pub use refresh::ListRefresher;

pub use formrelay_protocol::{ErrorBody, FieldIssue, RequestError, TimedMessage};
pub use formrelay_schema::{FieldConfig, FieldKind, FieldModel};
