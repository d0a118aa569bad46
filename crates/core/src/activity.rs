//! Activities: dated, photo-verified completions of a goal.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{DomainError, DomainResult, GoalId, Weekday};

/// A completion about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub goal_id: GoalId,
    pub date: NaiveDate,
    pub image_url: String,
    pub note: Option<String>,
}

impl NewActivity {
    pub fn new(goal_id: GoalId, date: NaiveDate, image_url: String, note: Option<String>) -> Self {
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        Self {
            goal_id,
            date,
            image_url,
            note,
        }
    }
}

/// A recorded completion, joined with the name of its goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    /// Name of the goal the activity belongs to.
    pub name: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub image: String,
    pub note: String,
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format("%Y-%m-%d"))
}

/// Parse a `YYYY-MM-DD` form value.
pub fn parse_activity_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation("date must be formatted as YYYY-MM-DD"))
}

/// An activity can only be completed for today, on a day the goal is scheduled.
pub fn ensure_completable(date: NaiveDate, today: NaiveDate, schedule: &[Weekday]) -> DomainResult<()> {
    if date != today {
        return Err(DomainError::validation("activity can only be completed today"));
    }
    let day = Weekday::of(date);
    if !schedule.contains(&day) {
        return Err(DomainError::validation(format!(
            "goal is not scheduled on weekday {day}"
        )));
    }
    Ok(())
}
