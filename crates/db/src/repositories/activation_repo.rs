//! Repository for the `activations` table.

use memex_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::activation::Activation;

const COLUMNS: &str = "id, user_id, code, activated_at, created_at, updated_at";

/// Provides operations on account activation codes.
pub struct ActivationRepo;

impl ActivationRepo {
    /// Create the activation code for a freshly registered user.
    ///
    /// Runs on `conn` so signup can insert the user and its code atomically.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: DbId,
        code: &str,
    ) -> Result<Activation, sqlx::Error> {
        let query = format!(
            "INSERT INTO activations (user_id, code)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activation>(&query)
            .bind(user_id)
            .bind(code)
            .fetch_one(conn)
            .await
    }

    /// Find the activation for a user.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Activation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM activations WHERE user_id = $1");
        sqlx::query_as::<_, Activation>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Consume an unused activation code, returning the activation it
    /// belonged to. Already used or unknown codes yield `None`.
    pub async fn redeem(pool: &PgPool, code: &str) -> Result<Option<Activation>, sqlx::Error> {
        let query = format!(
            "UPDATE activations SET activated_at = NOW()
             WHERE code = $1 AND activated_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Activation>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }
}
