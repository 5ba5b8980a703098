use axum::Router;
use tokio::task::JoinHandle;

/// Serve `router` on an ephemeral loopback port; returns the base URL and the
/// server task (aborted when dropped at test end is fine).
pub async fn spawn(router: Router) -> (String, JoinHandle<()>) {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test app");
    });
    (format!("http://{addr}"), handle)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
