//! Outbound account mail.

use async_trait::async_trait;
use memex_core::error::CoreError;
use memex_core::types::DbId;

/// Delivers account mail. Implementations must be cheap to share across
/// requests.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the activation code for a freshly registered account.
    async fn send_signup(
        &self,
        user_id: DbId,
        email: &str,
        activation_code: &str,
    ) -> Result<(), CoreError>;
}

/// Mailer that writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_signup(
        &self,
        user_id: DbId,
        email: &str,
        activation_code: &str,
    ) -> Result<(), CoreError> {
        tracing::info!(
            user_id,
            email = %email,
            activation_code = %activation_code,
            "Signup activation mail (log only)"
        );
        Ok(())
    }
}
