//! Goals: recurring habits with a weekday schedule and a handful of tags.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{DomainError, DomainResult, Entity, GoalId, UserId, Weekday};

/// Maximum number of distinct tags a goal may carry.
pub const MAX_TAGS_PER_GOAL: usize = 5;

/// Validated goal contents, used for both creation and full replacement.
///
/// # Invariants
/// - `name` is trimmed and non-empty.
/// - `tags` are trimmed, non-empty, distinct, sorted, and at most
///   [`MAX_TAGS_PER_GOAL`].
/// - `weekdays` are distinct and ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    name: String,
    description: String,
    tags: Vec<String>,
    weekdays: Vec<Weekday>,
}

impl GoalDraft {
    pub fn new(
        name: &str,
        description: &str,
        tags: Vec<String>,
        weekdays: Vec<i64>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name required"));
        }

        let tags: BTreeSet<String> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if tags.len() > MAX_TAGS_PER_GOAL {
            return Err(DomainError::validation(format!(
                "a goal can have at most {MAX_TAGS_PER_GOAL} tags"
            )));
        }

        let weekdays = weekdays
            .into_iter()
            .map(Weekday::from_number)
            .collect::<DomainResult<BTreeSet<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            tags: tags.into_iter().collect(),
            weekdays: weekdays.into_iter().collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }
}

/// A stored goal as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Goal {
    #[serde(rename = "goal_id")]
    pub id: GoalId,
    #[serde(skip)]
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub weekdays: Vec<Weekday>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

impl Entity for Goal {
    type Id = GoalId;

    fn id(&self) -> &GoalId {
        &self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }
}
