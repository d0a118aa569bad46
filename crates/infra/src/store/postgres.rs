//! Postgres-backed store.
//!
//! The schema (see `migrations/`) owns the invariants: unique email, the
//! five-tag cap and the scheduled-weekday rule are enforced by constraints and
//! triggers. This module only runs parameterized statements and maps failures.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `Constraint` |
//! | Database (check violation, raised by triggers too) | `23514` | `Constraint` |
//! | RowNotFound | N/A | `NotFound` |
//! | anything else | N/A | `Storage` |
//!
//! Multi-statement writes run inside a transaction; dropping the transaction
//! on an early `?` return rolls it back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use habitlog_core::{
    ActivityEntry, Goal, GoalDraft, GoalId, NewActivity, NewUser, Profile, User, UserId, Weekday,
};

use super::{ActivityStore, GoalStore, StoreError, UserStore};

const GOAL_SELECT: &str = r#"
    SELECT
        g.goal_id,
        g.user_id,
        g.name,
        COALESCE(g.description, '') AS description,
        g.created_at,
        COALESCE(array_agg(DISTINCT t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL), '{}') AS tags,
        COALESCE(array_agg(DISTINCT gd.weekday ORDER BY gd.weekday) FILTER (WHERE gd.weekday IS NOT NULL), '{}') AS weekdays
    FROM goals g
    LEFT JOIN goal_tags gt ON gt.goal_id = g.goal_id
    LEFT JOIN tags t ON t.tag_id = gt.tag_id
    LEFT JOIN goal_days gd ON gd.goal_id = g.goal_id
"#;

/// Postgres-backed store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; cloning is cheap.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

/// Insert weekdays and tags for a goal (tags are upserted by name).
async fn insert_schedule(
    tx: &mut Transaction<'_, Postgres>,
    goal_id: i64,
    draft: &GoalDraft,
) -> Result<(), StoreError> {
    for day in draft.weekdays() {
        sqlx::query("INSERT INTO goal_days (goal_id, weekday) VALUES ($1, $2)")
            .bind(goal_id)
            .bind(day.number())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_goal_day", e))?;
    }

    for tag in draft.tags() {
        let row = sqlx::query(
            r#"
            INSERT INTO tags (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING tag_id
            "#,
        )
        .bind(tag)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_tag", e))?;
        let tag_id: i64 = row
            .try_get("tag_id")
            .map_err(|e| map_sqlx_error("upsert_tag", e))?;

        sqlx::query("INSERT INTO goal_tags (goal_id, tag_id) VALUES ($1, $2)")
            .bind(goal_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_goal_tag", e))?;
    }

    Ok(())
}

fn goal_from_row(row: &PgRow) -> Result<Goal, StoreError> {
    let decode = |e| map_sqlx_error("decode_goal", e);

    let goal_id: i64 = row.try_get("goal_id").map_err(decode)?;
    let user_id: Uuid = row.try_get("user_id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let description: String = row.try_get("description").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let tags: Vec<String> = row.try_get("tags").map_err(decode)?;
    let weekdays: Vec<i16> = row.try_get("weekdays").map_err(decode)?;

    let weekdays = weekdays
        .into_iter()
        .map(|d| Weekday::from_number(i64::from(d)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Storage(format!("stored weekday out of range: {e}")))?;

    Ok(Goal {
        id: GoalId::new(goal_id),
        user_id: UserId::from_uuid(user_id),
        name,
        description,
        tags,
        weekdays,
        created_at,
    })
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn create_user(&self, user: &NewUser) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (user_id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.name)
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT user_id, name, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let decode = |e| map_sqlx_error("decode_user", e);
        Ok(Some(User {
            id: UserId::from_uuid(row.try_get("user_id").map_err(decode)?),
            name: row.try_get("name").map_err(decode)?,
            email: row.try_get("email").map_err(decode)?,
            password_hash: row.try_get("password_hash").map_err(decode)?,
        }))
    }

    async fn profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT u.name, u.email, COALESCE(p.profile_image, '') AS profile_image
            FROM users u
            LEFT JOIN profiles p ON p.user_id = u.user_id
            WHERE u.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("profile", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let decode = |e| map_sqlx_error("decode_profile", e);
        Ok(Some(Profile {
            name: row.try_get("name").map_err(decode)?,
            email: row.try_get("email").map_err(decode)?,
            profile_image: row.try_get("profile_image").map_err(decode)?,
        }))
    }

    #[instrument(skip(self, url), fields(user_id = %user_id), err)]
    async fn set_profile_image(&self, user_id: UserId, url: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, profile_image)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET
                profile_image = EXCLUDED.profile_image,
                updated_at = NOW()
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(url)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_profile_image", e))?;
        Ok(())
    }
}

#[async_trait]
impl GoalStore for PostgresStore {
    #[instrument(skip(self, draft), fields(user_id = %user_id), err)]
    async fn create_goal(&self, user_id: UserId, draft: &GoalDraft) -> Result<GoalId, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_goal", e))?;

        let row = sqlx::query(
            "INSERT INTO goals (user_id, name, description) VALUES ($1, $2, $3) RETURNING goal_id",
        )
        .bind(user_id.as_uuid())
        .bind(draft.name())
        .bind(draft.description())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_goal", e))?;
        let goal_id: i64 = row
            .try_get("goal_id")
            .map_err(|e| map_sqlx_error("create_goal", e))?;

        insert_schedule(&mut tx, goal_id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_goal", e))?;
        Ok(GoalId::new(goal_id))
    }

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<Goal>, StoreError> {
        let sql = format!("{GOAL_SELECT} WHERE g.user_id = $1 GROUP BY g.goal_id ORDER BY g.created_at, g.goal_id");
        let rows = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_goals", e))?;

        rows.iter().map(goal_from_row).collect()
    }

    async fn get_goal(&self, goal_id: GoalId) -> Result<Option<Goal>, StoreError> {
        let sql = format!("{GOAL_SELECT} WHERE g.goal_id = $1 GROUP BY g.goal_id");
        let row = sqlx::query(&sql)
            .bind(goal_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_goal", e))?;

        row.as_ref().map(goal_from_row).transpose()
    }

    #[instrument(skip(self, draft), fields(user_id = %user_id, goal_id = %goal_id), err)]
    async fn update_goal(&self, user_id: UserId, goal_id: GoalId, draft: &GoalDraft) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_goal", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE goals
            SET name = $1, description = $2, updated_at = NOW()
            WHERE goal_id = $3 AND user_id = $4
            "#,
        )
        .bind(draft.name())
        .bind(draft.description())
        .bind(goal_id.get())
        .bind(user_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_goal", e))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        for table in ["goal_days", "goal_tags"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE goal_id = $1"))
                .bind(goal_id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_goal", e))?;
        }

        insert_schedule(&mut tx, goal_id.get(), draft).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_goal", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id, goal_id = %goal_id), err)]
    async fn delete_goal(&self, user_id: UserId, goal_id: GoalId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM goals WHERE goal_id = $1 AND user_id = $2")
            .bind(goal_id.get())
            .bind(user_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_goal", e))?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for PostgresStore {
    #[instrument(skip(self, activity), fields(goal_id = %activity.goal_id, date = %activity.date), err)]
    async fn record_activity(&self, activity: &NewActivity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO activities (goal_id, activity_date, image_url, note, completed_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(activity.goal_id.get())
        .bind(activity.date)
        .bind(&activity.image_url)
        .bind(activity.note.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_activity", e))?;
        Ok(())
    }

    async fn list_activities(&self, user_id: UserId) -> Result<Vec<ActivityEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT g.name, a.activity_date, a.image_url, COALESCE(a.note, '') AS note
            FROM activities a
            JOIN goals g ON a.goal_id = g.goal_id
            WHERE g.user_id = $1 AND a.completed_at IS NOT NULL
            ORDER BY a.activity_date, a.activity_id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_activities", e))?;

        let decode = |e| map_sqlx_error("decode_activity", e);
        rows.iter()
            .map(|row| -> Result<ActivityEntry, StoreError> {
                let date: NaiveDate = row.try_get("activity_date").map_err(decode)?;
                Ok(ActivityEntry {
                    name: row.try_get("name").map_err(decode)?,
                    date,
                    image: row.try_get("image_url").map_err(decode)?,
                    note: row.try_get("note").map_err(decode)?,
                })
            })
            .collect()
    }
}

/// Map an SQLx error to a `StoreError`, tagging it with the operation name.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") | Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Storage(format!("database error in {operation}: {msg}")),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => StoreError::Storage(format!("connection pool closed in {operation}")),
        _ => StoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}
