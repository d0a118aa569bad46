use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};

use habitlog_core::{GoalDraft, GoalId};
use habitlog_infra::store::GoalStore;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::UserContext;

fn parse_goal_id(id: &str) -> Result<GoalId, axum::response::Response> {
    id.parse().map_err(errors::domain_error_to_response)
}

fn draft_from(body: dto::GoalRequest) -> Result<GoalDraft, axum::response::Response> {
    GoalDraft::new(&body.name, &body.description, body.tags, body.weekdays)
        .map_err(errors::domain_error_to_response)
}

pub async fn create_goal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    payload: Result<Json<dto::GoalRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(e) => return errors::invalid_json(e),
    };
    let draft = match draft_from(body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let goal_id = match services.store.create_goal(ctx.user_id(), &draft).await {
        Ok(id) => id,
        Err(e) => return errors::store_error_to_response(e),
    };

    tracing::info!(user_id = %ctx.user_id(), %goal_id, "goal created");

    errors::json_ok(
        StatusCode::CREATED,
        "goal created",
        dto::GoalCreatedResponse { goal_id: goal_id.get() },
    )
}

pub async fn list_goals(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> axum::response::Response {
    match services.store.list_goals(ctx.user_id()).await {
        Ok(goals) => errors::json_ok(StatusCode::OK, "goals", goals),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_goal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::GoalRequest>, JsonRejection>,
) -> axum::response::Response {
    let goal_id = match parse_goal_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match payload {
        Ok(b) => b,
        Err(e) => return errors::invalid_json(e),
    };
    let draft = match draft_from(body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match services.store.update_goal(ctx.user_id(), goal_id, &draft).await {
        Ok(()) => {}
        Err(e) => return errors::store_error_to_response(e),
    }

    tracing::info!(user_id = %ctx.user_id(), %goal_id, "goal updated");
    errors::json_ok(StatusCode::OK, "goal updated", ())
}

pub async fn delete_goal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let goal_id = match parse_goal_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if let Err(e) = services.store.delete_goal(ctx.user_id(), goal_id).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(user_id = %ctx.user_id(), %goal_id, "goal deleted");
    errors::json_ok(StatusCode::OK, "goal deleted", ())
}
