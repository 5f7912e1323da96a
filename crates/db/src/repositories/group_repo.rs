//! Repository for the `groups` and `group_members` tables.

use memex_core::types::DbId;
use sqlx::PgPool;

use crate::models::group::{CreateGroup, Group};

const COLUMNS: &str = "g.id, g.pubid, g.name, g.creator_id, g.created_at, g.updated_at";

/// Provides group and membership operations.
pub struct GroupRepo;

impl GroupRepo {
    /// Create a group and enrol its creator as the first member, atomically.
    pub async fn create(pool: &PgPool, input: &CreateGroup) -> Result<Group, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (pubid, name, creator_id)
             VALUES ($1, $2, $3)
             RETURNING id, pubid, name, creator_id, created_at, updated_at",
        )
        .bind(&input.pubid)
        .bind(&input.name)
        .bind(input.creator_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(group.id)
            .bind(input.creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(group)
    }

    /// Find a group by its public id.
    pub async fn find_by_pubid(pool: &PgPool, pubid: &str) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups g WHERE g.pubid = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(pubid)
            .fetch_optional(pool)
            .await
    }

    /// List the groups a user belongs to, ordered by name.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM groups g
             JOIN group_members m ON m.group_id = g.id
             WHERE m.user_id = $1
             ORDER BY g.name ASC, g.id ASC"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Public ids of every group a user belongs to.
    pub async fn pubids_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT g.pubid FROM groups g
             JOIN group_members m ON m.group_id = g.id
             WHERE m.user_id = $1
             ORDER BY g.pubid",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(pubid,)| pubid).collect())
    }

    /// Whether `user_id` is a member of `group_id`.
    pub async fn is_member(pool: &PgPool, group_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2
             )",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Add a member. Returns `false` if the user already belonged to the group.
    pub async fn add_member(pool: &PgPool, group_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
