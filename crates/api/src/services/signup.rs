//! Account registration.

use memex_core::error::CoreError;
use memex_core::registration::RegistrationForm;
use memex_db::models::subscription::{self, CreateSubscription};
use memex_db::models::user::{CreateUser, User};
use memex_db::repositories::{ActivationRepo, SubscriptionRepo, UserRepo};
use memex_db::DbPool;
use metrics::counter;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::mailer::Mailer;

/// Length of generated activation codes.
pub const ACTIVATION_CODE_LEN: usize = 32;

/// Creates inactive accounts and hands their activation code to a [`Mailer`].
pub struct SignupService<'a> {
    pool: &'a DbPool,
    mailer: &'a dyn Mailer,
    authority: &'a str,
    password_min_length: usize,
}

impl<'a> SignupService<'a> {
    pub fn new(
        pool: &'a DbPool,
        mailer: &'a dyn Mailer,
        authority: &'a str,
        password_min_length: usize,
    ) -> Self {
        Self {
            pool,
            mailer,
            authority,
            password_min_length,
        }
    }

    /// Validate `form`, then create the user, its activation code and its
    /// reply subscription, and hand the code to the mailer.
    pub async fn signup(&self, form: &RegistrationForm) -> AppResult<User> {
        form.check()?;
        validate_password_strength(&form.password, self.password_min_length)
            .map_err(CoreError::Validation)?;

        if UserRepo::find_by_username(self.pool, &form.username, self.authority)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict("This username is already taken.".into()).into());
        }
        if UserRepo::find_by_email(self.pool, &form.email).await?.is_some() {
            return Err(
                CoreError::Conflict("This email address is already registered.".into()).into(),
            );
        }

        let password_hash = hash_password(&form.password)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

        // Nothing commits unless the mailer accepts the activation code.
        let mut tx = self.pool.begin().await?;

        let user = UserRepo::create_in(
            &mut *tx,
            &CreateUser {
                username: form.username.clone(),
                email: form.email.clone(),
                password_hash,
                authority: self.authority.to_string(),
            },
        )
        .await?;

        let code = generate_activation_code();
        ActivationRepo::create(&mut *tx, user.id, &code).await?;

        SubscriptionRepo::create(
            &mut *tx,
            &CreateSubscription {
                uri: user.userid(),
                kind: subscription::REPLY.to_string(),
                active: true,
            },
        )
        .await?;

        self.mailer.send_signup(user.id, &user.email, &code).await?;

        tx.commit().await?;

        counter!("auth.local.register").increment(1);
        tracing::info!(user_id = user.id, userid = %user.userid(), "User registered");

        Ok(user)
    }
}

/// Random alphanumeric code.
pub fn generate_activation_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ACTIVATION_CODE_LEN)
        .map(char::from)
        .collect()
}
