//! Repository for the `subscriptions` table.

use sqlx::{PgConnection, PgPool};

use crate::models::subscription::{CreateSubscription, Subscription};

const COLUMNS: &str = "id, uri, type, active, created_at, updated_at";

/// Provides notification subscription operations.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Insert a subscription on `conn`.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateSubscription,
    ) -> Result<Subscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO subscriptions (uri, type, active)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(&input.uri)
            .bind(&input.kind)
            .bind(input.active)
            .fetch_one(conn)
            .await
    }

    /// Find the subscription of `kind` held by `uri`.
    pub async fn find(
        pool: &PgPool,
        uri: &str,
        kind: &str,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscriptions WHERE uri = $1 AND type = $2");
        sqlx::query_as::<_, Subscription>(&query)
            .bind(uri)
            .bind(kind)
            .fetch_optional(pool)
            .await
    }
}
