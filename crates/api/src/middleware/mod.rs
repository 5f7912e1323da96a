//! Request extractors for authentication.
//!
//! - [`auth::AuthUser`] -- requires a valid JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- accepts anonymous callers, rejects bad tokens.

pub mod auth;
