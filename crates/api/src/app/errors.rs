use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use habitlog_core::DomainError;
use habitlog_infra::images::ImageHostError;
use habitlog_infra::store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Constraint(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        StoreError::Storage(msg) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "database error")
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "not owner"),
    }
}

pub fn upload_error_to_response(err: ImageHostError) -> axum::response::Response {
    tracing::error!(error = %err, "image upload failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "upload_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Success envelope: `{"message": ..., "result": ...}`.
pub fn json_ok(
    status: StatusCode,
    message: &'static str,
    result: impl Serialize,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "message": message,
            "result": result,
        })),
    )
        .into_response()
}

pub fn invalid_json(err: axum::extract::rejection::JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_payload", err.body_text())
}
