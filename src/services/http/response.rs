use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::services::registry::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuccessBody {
    pub success: bool,
}

pub fn success(success: bool) -> Json<SuccessBody> {
    Json(SuccessBody { success })
}

// 注册表错误转换为 HTTP 响应，响应体格式与成功时保持一致
pub fn deregister_error(err: &RegistryError) -> Response {
    (status_for(err), success(false)).into_response()
}

pub fn pick_error(err: &RegistryError) -> Response {
    (status_for(err), Json(Option::<String>::None)).into_response()
}

fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
        RegistryError::NoInstancesAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}
