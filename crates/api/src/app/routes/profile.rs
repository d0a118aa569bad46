use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use uuid::Uuid;

use habitlog_infra::images::ImageHost;
use habitlog_infra::store::UserStore;

use crate::app::multipart::read_form;
use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::UserContext;

pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> axum::response::Response {
    match services.store.profile(ctx.user_id()).await {
        Ok(Some(profile)) => errors::json_ok(StatusCode::OK, "profile", profile),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Accepts either a multipart `image` upload or JSON `{"profile_image": "<url>"}`.
///
/// Any non-multipart body is decoded as JSON whatever its content type.
pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    req: Request,
) -> axum::response::Response {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let url = if is_multipart {
        let multipart = match Multipart::from_request(req, &()).await {
            Ok(m) => m,
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.body_text()),
        };
        let form = match read_form(multipart, "image").await {
            Ok(f) => f,
            Err(resp) => return resp,
        };
        let Some(file) = form.file else {
            return errors::json_error(StatusCode::BAD_REQUEST, "image_required", "image file missing");
        };

        let file_name = format!(
            "avatar-{}-{}{}",
            ctx.user_id(),
            Uuid::now_v7().simple(),
            file.extension()
        );
        match services.images.upload(&file_name, file.bytes).await {
            Ok(url) => url,
            Err(e) => return errors::upload_error_to_response(e),
        }
    } else {
        let raw = match Bytes::from_request(req, &()).await {
            Ok(b) => b,
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_payload", e.body_text()),
        };
        let body: dto::ProfileImageRequest = match serde_json::from_slice(&raw) {
            Ok(b) => b,
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_payload", e.to_string()),
        };
        let url = body.profile_image.trim().to_string();
        if url.is_empty() {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_payload", "profile_image is required");
        }
        url
    };

    if let Err(e) = services.store.set_profile_image(ctx.user_id(), &url).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(user_id = %ctx.user_id(), "profile image updated");

    errors::json_ok(
        StatusCode::OK,
        "profile image updated",
        dto::ProfileImageResponse { profile_image: url },
    )
}
