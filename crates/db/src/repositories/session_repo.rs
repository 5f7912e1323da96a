//! Repository for the `refresh_sessions` table.

use memex_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::session::{NewRefreshSession, RefreshSession};

const COLUMNS: &str = "id, user_id, expires_at, revoked_at, created_at";

/// Issues, rotates and revokes refresh-token sessions.
pub struct SessionRepo;

impl SessionRepo {
    pub async fn issue(
        pool: &PgPool,
        input: &NewRefreshSession,
    ) -> Result<RefreshSession, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, input).await
    }

    /// The live session behind a token hash, if any.
    pub async fn find_live(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_sessions
             WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke session `old_id` and issue `next` in its place.
    ///
    /// Returns `None`, and issues nothing, when `old_id` was already revoked,
    /// so each refresh token can be exchanged at most once even under
    /// concurrent requests.
    pub async fn rotate(
        pool: &PgPool,
        old_id: DbId,
        next: &NewRefreshSession,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revoked = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await?;
        if revoked.rows_affected() == 0 {
            return Ok(None);
        }

        let session = Self::insert(&mut tx, next).await?;
        tx.commit().await?;
        Ok(Some(session))
    }

    /// Revoke every live session of a user, returning how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert(
        conn: &mut PgConnection,
        input: &NewRefreshSession,
    ) -> Result<RefreshSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_sessions (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(conn)
            .await
    }
}
