use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use habitlog_core::{
    ActivityEntry, Goal, GoalDraft, GoalId, MAX_TAGS_PER_GOAL, NewActivity, NewUser, Profile, User, UserId, Weekday,
};

use super::{ActivityStore, GoalStore, StoreError, UserStore};

#[derive(Debug, Clone)]
struct GoalRow {
    user_id: UserId,
    name: String,
    description: String,
    tags: Vec<String>,
    weekdays: Vec<Weekday>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ActivityRow {
    seq: u64,
    image_url: String,
    note: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    profiles: HashMap<UserId, String>,
    goals: BTreeMap<GoalId, GoalRow>,
    activities: BTreeMap<(GoalId, NaiveDate), ActivityRow>,
    next_goal_id: i64,
    next_activity_seq: u64,
}

impl Tables {
    fn goal(&self, id: GoalId, row: &GoalRow) -> Goal {
        Goal {
            id,
            user_id: row.user_id,
            name: row.name.clone(),
            description: row.description.clone(),
            tags: row.tags.clone(),
            weekdays: row.weekdays.clone(),
            created_at: row.created_at,
        }
    }
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Storage("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Storage("in-memory store lock poisoned".into()))
    }
}

fn check_tag_limit(draft: &GoalDraft) -> Result<(), StoreError> {
    if draft.tags().len() > MAX_TAGS_PER_GOAL {
        return Err(StoreError::Constraint(format!(
            "a goal can have at most {MAX_TAGS_PER_GOAL} tags"
        )));
    }
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if t.users.values().any(|u| u.email == user.email.as_str()) {
            return Err(StoreError::Duplicate(format!("email {} already registered", user.email)));
        }
        if t.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("user {} already exists", user.id)));
        }
        t.users.insert(
            user.id,
            User {
                id: user.id,
                name: user.name.clone(),
                email: user.email.as_str().to_string(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.read()?;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        let t = self.read()?;
        Ok(t.users.get(&user_id).map(|u| Profile {
            name: u.name.clone(),
            email: u.email.clone(),
            profile_image: t.profiles.get(&user_id).cloned().unwrap_or_default(),
        }))
    }

    async fn set_profile_image(&self, user_id: UserId, url: &str) -> Result<(), StoreError> {
        let mut t = self.write()?;
        if !t.users.contains_key(&user_id) {
            return Err(StoreError::Constraint(format!("user {user_id} does not exist")));
        }
        t.profiles.insert(user_id, url.to_string());
        Ok(())
    }
}

#[async_trait]
impl GoalStore for InMemoryStore {
    async fn create_goal(&self, user_id: UserId, draft: &GoalDraft) -> Result<GoalId, StoreError> {
        check_tag_limit(draft)?;
        let mut t = self.write()?;
        if !t.users.contains_key(&user_id) {
            return Err(StoreError::Constraint(format!("user {user_id} does not exist")));
        }
        t.next_goal_id += 1;
        let id = GoalId::new(t.next_goal_id);
        t.goals.insert(
            id,
            GoalRow {
                user_id,
                name: draft.name().to_string(),
                description: draft.description().to_string(),
                tags: draft.tags().to_vec(),
                weekdays: draft.weekdays().to_vec(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>, StoreError> {
        let t = self.read()?;
        let mut goals: Vec<Goal> = t
            .goals
            .iter()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(id, row)| t.goal(*id, row))
            .collect();
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(goals)
    }

    async fn get_goal(&self, goal_id: GoalId) -> Result<Option<Goal>, StoreError> {
        let t = self.read()?;
        Ok(t.goals.get(&goal_id).map(|row| t.goal(goal_id, row)))
    }

    async fn update_goal(&self, user_id: UserId, goal_id: GoalId, draft: &GoalDraft) -> Result<(), StoreError> {
        check_tag_limit(draft)?;
        let mut t = self.write()?;
        let row = match t.goals.get_mut(&goal_id) {
            Some(row) if row.user_id == user_id => row,
            _ => return Err(StoreError::NotFound),
        };
        row.name = draft.name().to_string();
        row.description = draft.description().to_string();
        row.tags = draft.tags().to_vec();
        row.weekdays = draft.weekdays().to_vec();
        Ok(())
    }

    async fn delete_goal(&self, user_id: UserId, goal_id: GoalId) -> Result<(), StoreError> {
        let mut t = self.write()?;
        match t.goals.get(&goal_id) {
            Some(row) if row.user_id == user_id => {}
            _ => return Err(StoreError::NotFound),
        }
        t.goals.remove(&goal_id);
        t.activities.retain(|(g, _), _| *g != goal_id);
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn record_activity(&self, activity: &NewActivity) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let goal = t
            .goals
            .get(&activity.goal_id)
            .ok_or_else(|| StoreError::Constraint(format!("goal {} does not exist", activity.goal_id)))?;

        let day = Weekday::of(activity.date);
        if !goal.weekdays.contains(&day) {
            return Err(StoreError::Constraint(format!(
                "goal {} is not scheduled on weekday {day}",
                activity.goal_id
            )));
        }

        let key = (activity.goal_id, activity.date);
        if t.activities.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "goal {} already has an activity on {}",
                activity.goal_id, activity.date
            )));
        }

        t.next_activity_seq += 1;
        let seq = t.next_activity_seq;
        t.activities.insert(
            key,
            ActivityRow {
                seq,
                image_url: activity.image_url.clone(),
                note: activity.note.clone(),
            },
        );
        Ok(())
    }

    async fn list_activities(&self, user_id: UserId) -> Result<Vec<ActivityEntry>, StoreError> {
        let t = self.read()?;
        let mut rows: Vec<(NaiveDate, u64, ActivityEntry)> = t
            .activities
            .iter()
            .filter_map(|((goal_id, date), row)| {
                let goal = t.goals.get(goal_id)?;
                (goal.user_id == user_id).then(|| {
                    (
                        *date,
                        row.seq,
                        ActivityEntry {
                            name: goal.name.clone(),
                            date: *date,
                            image: row.image_url.clone(),
                            note: row.note.clone().unwrap_or_default(),
                        },
                    )
                })
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(rows.into_iter().map(|(_, _, entry)| entry).collect())
    }
}
