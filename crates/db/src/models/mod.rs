//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Create*` DTOs for inserts, and filter structs for queries where needed

pub mod activation;
pub mod annotation;
pub mod document;
pub mod group;
pub mod session;
pub mod subscription;
pub mod user;
