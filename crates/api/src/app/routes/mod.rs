use axum::{
    routing::{get, post, put},
    Router,
};

pub mod activities;
pub mod auth;
pub mod goals;
pub mod profile;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/signup", post(auth::signup))
        .route("/api/signin", post(auth::signin))
}

/// Router for all authenticated (caller-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/profile", get(profile::get_profile).post(profile::update_profile))
        .route("/api/goals", get(goals::list_goals).post(goals::create_goal))
        .route("/api/goals/:id", put(goals::update_goal).delete(goals::delete_goal))
        .route("/api/goals/:id/activities", post(activities::complete_activity))
        .route("/api/activities", get(activities::list_activities))
}
