//! greeter-api: HTTP surface of the greeter service.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Welcome text |
//! | GET | `/hello/{name}` | Count a greeting for `name` and greet them |
//! | GET | `/counts` | Every name with its greeting count (`/count` is an alias) |
//! | GET | `/health` | This node's health report |
//! | GET | `/health/cluster` | Health reports of every discovered peer |
//!
//! Success bodies are the bare payloads (peers decode `/health` as-is).
//! Failures carry a status code and `{"success":false,"error":"..."}`.

pub mod handlers;

use axum::Router;
use axum::routing::get;

use greeter_cluster::ClusterReporter;
use greeter_health::HostProbe;
use greeter_store::CounterStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: CounterStore,
    pub probe: HostProbe,
    pub cluster: ClusterReporter,
}

/// Build the complete router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/hello/{name}", get(handlers::hello))
        .route("/counts", get(handlers::list_counts))
        .route("/count", get(handlers::list_counts))
        .route("/health", get(handlers::node_health))
        .route("/health/cluster", get(handlers::cluster_health))
        .with_state(state)
}
