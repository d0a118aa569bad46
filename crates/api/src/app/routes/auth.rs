//! Account registration and sign-in.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use habitlog_auth::TokenIssuer;
use habitlog_core::{validate_password, Email, NewUser};
use habitlog_infra::store::StoreError;
use habitlog_infra::store::UserStore;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::SignupRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(e) => return errors::invalid_json(e),
    };

    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name is required");
    }
    let email = match Email::parse(&body.email) {
        Ok(e) => e,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if let Err(e) = validate_password(&body.password) {
        return errors::domain_error_to_response(e);
    }

    let hasher = services.hasher;
    let password = body.password;
    let hash = match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
        Ok(Ok(h)) => h,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "hash_error", "password hashing failed");
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "hash_error", "password hashing failed");
        }
    };

    let user = match NewUser::new(&body.name, email, hash) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.create_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => {
            return errors::json_error(StatusCode::CONFLICT, "duplicate_email", "email already registered");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    tracing::info!(user_id = %user.id, "user signed up");

    errors::json_ok(
        StatusCode::CREATED,
        "signup succeeded",
        dto::SignupResponse {
            email: user.email.into_inner(),
            name: user.name,
        },
    )
}

pub async fn signin(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::SigninRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(e) => return errors::invalid_json(e),
    };

    let user = match services.store.find_user_by_email(body.email.trim()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return errors::json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "unknown email");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let hasher = services.hasher;
    let password = body.password;
    let stored = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .unwrap_or(false);
    if !verified {
        tracing::info!(user_id = %user.id, "sign-in rejected: wrong password");
        return errors::json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "wrong password");
    }

    let token = match services.tokens.issue(user.id, Utc::now()) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "token signing failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_error", "could not issue token");
        }
    };

    tracing::info!(user_id = %user.id, "user signed in");

    errors::json_ok(StatusCode::OK, "signin succeeded", token)
}
