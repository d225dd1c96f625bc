//! HTTP 查询参数接口，与 gRPC 接口提供相同的五个操作

pub mod extractor;
pub mod handlers;
pub mod response;

use axum::Router;
use axum::routing::{any, get};

use crate::services::registry::RegistryStore;

pub fn router(store: RegistryStore) -> Router {
    Router::new()
        .route("/register", any(handlers::register))
        .route("/deregister", any(handlers::deregister))
        .route("/getservices", any(handlers::get_services))
        .route("/getrandservice", any(handlers::get_rand_service))
        .route("/heartbeat", any(handlers::heartbeat))
        .route("/stats", get(handlers::stats))
        .with_state(store)
}
