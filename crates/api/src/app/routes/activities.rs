use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Extension, Multipart, Path},
    http::StatusCode,
};

use habitlog_core::{
    ensure_completable, parse_activity_date, Clock, DomainError, Entity, GoalId, NewActivity,
};
use habitlog_infra::images::ImageHost;
use habitlog_infra::store::{ActivityStore, GoalStore, StoreError};

use crate::app::multipart::read_form;
use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::UserContext;

/// Mark a goal done for today with a photo (multipart `image`, optional
/// `date` and `note` fields).
pub async fn complete_activity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> axum::response::Response {
    let goal_id: GoalId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let goal = match services.store.get_goal(goal_id).await {
        Ok(Some(g)) => g,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "goal not found"),
        Err(e) => return errors::store_error_to_response(e),
    };
    if !goal.is_owned_by(ctx.user_id()) {
        return errors::domain_error_to_response(DomainError::Forbidden);
    }

    let Ok(multipart) = multipart else {
        return errors::json_error(StatusCode::BAD_REQUEST, "multipart_required", "multipart/form-data body required");
    };
    let form = match read_form(multipart, "image").await {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    let today = services.clock.today();
    let date = match form.field("date") {
        Some(raw) => match parse_activity_date(raw) {
            Ok(d) => d,
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => today,
    };
    if let Err(e) = ensure_completable(date, today, &goal.weekdays) {
        return errors::domain_error_to_response(e);
    }

    let note = form.field("note").map(str::to_string);
    let Some(file) = form.file else {
        return errors::json_error(StatusCode::BAD_REQUEST, "image_required", "image required");
    };

    let url = match services.images.upload(&file.file_name, file.bytes).await {
        Ok(url) => url,
        Err(e) => return errors::upload_error_to_response(e),
    };

    let activity = NewActivity::new(goal_id, date, url, note);
    match services.store.record_activity(&activity).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "duplicate_activity",
                "activity already completed for this date",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    tracing::info!(user_id = %ctx.user_id(), %goal_id, %date, "activity completed");
    errors::json_ok(StatusCode::OK, "activity completed", ())
}

pub async fn list_activities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> axum::response::Response {
    match services.store.list_activities(ctx.user_id()).await {
        Ok(entries) => errors::json_ok(
            StatusCode::OK,
            "activities",
            dto::ActivityLogResponse {
                id: ctx.user_id(),
                result: entries,
            },
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
