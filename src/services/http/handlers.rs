use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

use super::extractor::{InstanceQuery, ServiceQuery};
use super::response::{self, SuccessBody};
use crate::services::registry::RegistryStore;

pub async fn register(
    State(store): State<RegistryStore>,
    Query(query): Query<InstanceQuery>,
) -> Json<SuccessBody> {
    store.register(&query.service_name, &query.address);
    response::success(true)
}

pub async fn deregister(
    State(store): State<RegistryStore>,
    Query(query): Query<InstanceQuery>,
) -> Response {
    match store.deregister(&query.service_name, &query.address) {
        Ok(()) => response::success(true).into_response(),
        Err(err) => response::deregister_error(&err),
    }
}

pub async fn get_services(
    State(store): State<RegistryStore>,
    Query(query): Query<ServiceQuery>,
) -> Json<Vec<String>> {
    Json(store.list_addresses(&query.service_name))
}

pub async fn get_rand_service(
    State(store): State<RegistryStore>,
    Query(query): Query<ServiceQuery>,
) -> Response {
    match store.pick_random_address(&query.service_name) {
        Ok(address) => Json(address).into_response(),
        Err(err) => response::pick_error(&err),
    }
}

pub async fn heartbeat(
    State(store): State<RegistryStore>,
    Query(query): Query<InstanceQuery>,
) -> Json<SuccessBody> {
    let refreshed = store.heartbeat(&query.service_name, &query.address);
    response::success(refreshed)
}

// 各服务实例数量
pub async fn stats(State(store): State<RegistryStore>) -> Json<BTreeMap<String, usize>> {
    Json(store.instance_counts())
}
