//! Notification subscription model.

use memex_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Subscription type for notifications about replies to a user's annotations.
pub const REPLY: &str = "reply";

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub id: DbId,
    /// Userid of the subscriber.
    pub uri: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub struct CreateSubscription {
    pub uri: String,
    pub kind: String,
    pub active: bool,
}
