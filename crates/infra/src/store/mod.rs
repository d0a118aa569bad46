//! Persistence seams for users, goals and activities.
//!
//! Two implementations are provided:
//! - [`InMemoryStore`]: single-process tables for tests/dev.
//! - [`PostgresStore`]: the production store; invariants live in the schema.
//!
//! Both enforce the same rules (unique email, at most five tags per goal, one
//! activity per goal per date, activity weekday must be scheduled, cascading
//! goal deletion), so callers observe identical behaviour.

use async_trait::async_trait;
use thiserror::Error;

use habitlog_core::{ActivityEntry, Goal, GoalDraft, GoalId, NewActivity, NewUser, Profile, User, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Store error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// A check / trigger / foreign-key rule rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Duplicate` when the email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<(), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError>;

    /// Insert or replace the profile image URL.
    async fn set_profile_image(&self, user_id: UserId, url: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Insert a goal with its weekdays and tags atomically.
    async fn create_goal(&self, user_id: UserId, draft: &GoalDraft) -> Result<GoalId, StoreError>;

    /// Goals owned by `user_id`, oldest first.
    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>, StoreError>;

    /// Any user's goal (ownership is checked by the caller).
    async fn get_goal(&self, goal_id: GoalId) -> Result<Option<Goal>, StoreError>;

    /// Replace name, description, weekdays and tags atomically.
    /// `NotFound` when the goal does not exist or is owned by someone else.
    async fn update_goal(&self, user_id: UserId, goal_id: GoalId, draft: &GoalDraft) -> Result<(), StoreError>;

    /// `NotFound` when the goal does not exist or is owned by someone else.
    async fn delete_goal(&self, user_id: UserId, goal_id: GoalId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Record a completion.
    ///
    /// `Duplicate` when the goal already has an activity on that date,
    /// `Constraint` when the date's weekday is not scheduled.
    async fn record_activity(&self, activity: &NewActivity) -> Result<(), StoreError>;

    /// Completed activities across all goals of `user_id`, by date.
    async fn list_activities(&self, user_id: UserId) -> Result<Vec<ActivityEntry>, StoreError>;
}

/// Everything the API needs from persistence.
pub trait Store: UserStore + GoalStore + ActivityStore {}

impl<T> Store for T where T: UserStore + GoalStore + ActivityStore {}
