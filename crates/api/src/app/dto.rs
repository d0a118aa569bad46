use serde::{Deserialize, Serialize};

use habitlog_core::{ActivityEntry, UserId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileImageRequest {
    #[serde(default)]
    pub profile_image: String,
}

/// Create and update share one shape; weekdays use 1 = Monday .. 7 = Sunday.
#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub weekdays: Vec<i64>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileImageResponse {
    pub profile_image: String,
}

#[derive(Debug, Serialize)]
pub struct GoalCreatedResponse {
    pub goal_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ActivityLogResponse {
    pub id: UserId,
    pub result: Vec<ActivityEntry>,
}
