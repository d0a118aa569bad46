//! `habitlog-core`: domain building blocks.
//!
//! This crate contains **pure domain** types and rules (no infrastructure concerns).

pub mod activity;
pub mod clock;
pub mod entity;
pub mod error;
pub mod goal;
pub mod id;
pub mod user;
pub mod value_object;
pub mod weekday;

pub use activity::{ActivityEntry, NewActivity, ensure_completable, parse_activity_date};
pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use goal::{Goal, GoalDraft, MAX_TAGS_PER_GOAL};
pub use id::{GoalId, UserId};
pub use user::{Email, NewUser, Profile, User, validate_password};
pub use value_object::ValueObject;
pub use weekday::Weekday;
