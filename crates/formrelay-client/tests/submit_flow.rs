mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};

use formrelay_client::{AuthContext, Orchestrator, RequestError, SubmitPhase, SubmitPipeline};
use formrelay_schema::normalize;

fn org_fields() -> Vec<formrelay_schema::FieldModel> {
    normalize(&json!({
        "properties": {
            "name": {"type": "string", "title": "Name"},
            "active": {"type": "boolean", "title": "Active"}
        },
        "required": ["name"]
    }))
}

fn entered(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn auth() -> AuthContext {
    AuthContext::new(Some("tok".to_string()), None)
}

type Hits = Arc<AtomicUsize>;

async fn create_org(State(hits): State<Hits>, Json(body): Json<Value>) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"id": "org-1", "echo": body}))
}

fn counted_router(hits: Hits) -> Router {
    Router::new()
        .route("/orgs", post(create_org))
        .with_state(hits)
}

#[tokio::test]
async fn validation_failure_never_touches_the_network() {
    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let (base, _server) = support::spawn(counted_router(Arc::clone(&hits))).await;
    let pipeline = SubmitPipeline::new(
        Arc::new(Orchestrator::new()),
        format!("{base}/orgs"),
        "org:create",
    );

    let err = pipeline
        .submit(&org_fields(), &entered(&[("name", json!("  "))]), &auth())
        .await
        .expect_err("must fail validation");

    match &err {
        RequestError::Validation { issues } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "name");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.phase(), SubmitPhase::Failed(err));

    pipeline.acknowledge();
    assert_eq!(pipeline.phase(), SubmitPhase::Idle);
}

#[tokio::test]
async fn successful_submit_posts_payload_keyed_by_submission_names() {
    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let (base, _server) = support::spawn(counted_router(Arc::clone(&hits))).await;
    let pipeline = SubmitPipeline::new(
        Arc::new(Orchestrator::new()),
        format!("{base}/orgs"),
        "org:create",
    );

    let data = pipeline
        .submit(&org_fields(), &entered(&[("name", json!("acme"))]), &auth())
        .await
        .expect("submit");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(data["id"], "org-1");
    // untouched checkbox submits as false
    assert_eq!(data["echo"], json!({"name": "acme", "active": false}));
    assert_eq!(pipeline.phase(), SubmitPhase::Succeeded);

    pipeline.acknowledge();
    assert_eq!(pipeline.phase(), SubmitPhase::Idle);
}

#[tokio::test]
async fn conflict_returns_inline_message_for_display() {
    async fn taken() -> (StatusCode, Json<Value>) {
        (
            StatusCode::CONFLICT,
            Json(json!({"message": "Organization name already exists"})),
        )
    }
    let (base, _server) = support::spawn(Router::new().route("/orgs", post(taken))).await;
    let pipeline = SubmitPipeline::new(
        Arc::new(Orchestrator::new()),
        format!("{base}/orgs"),
        "org:create",
    );

    let err = pipeline
        .submit(&org_fields(), &entered(&[("name", json!("acme"))]), &auth())
        .await
        .expect_err("must conflict");

    assert_eq!(
        err.inline_message().as_deref(),
        Some("Organization name already exists")
    );
    assert_eq!(pipeline.phase(), SubmitPhase::Failed(err));
}

#[tokio::test]
async fn unauthorized_submit_propagates_for_redirect() {
    async fn expired() -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
    let (base, _server) = support::spawn(Router::new().route("/orgs", post(expired))).await;
    let pipeline = SubmitPipeline::new(
        Arc::new(Orchestrator::new()),
        format!("{base}/orgs"),
        "org:create",
    );

    let err = pipeline
        .submit(&org_fields(), &entered(&[("name", json!("acme"))]), &auth())
        .await
        .expect_err("must fail");

    assert_eq!(err, RequestError::Unauthorized);
    // nothing to render inline; the caller navigates to login instead
    assert_eq!(err.inline_message(), None);
}

#[tokio::test]
async fn reentrant_submit_is_ignored_while_one_is_running() {
    async fn slow_create(State(hits): State<Hits>, Json(body): Json<Value>) -> Json<Value> {
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        Json(json!({"echo": body}))
    }
    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/orgs", post(slow_create))
        .with_state(Arc::clone(&hits));
    let (base, _server) = support::spawn(router).await;
    let pipeline = Arc::new(SubmitPipeline::new(
        Arc::new(Orchestrator::new()),
        format!("{base}/orgs"),
        "org:create",
    ));

    let first = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline
                .submit(&org_fields(), &entered(&[("name", json!("acme"))]), &auth())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = pipeline
        .submit(&org_fields(), &entered(&[("name", json!("acme"))]), &auth())
        .await
        .expect_err("second submit is ignored");
    assert!(second.is_cancelled());

    first.await.expect("join").expect("first submit");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
