//! Domain logic for the memex annotation service.
//!
//! Everything here is free of IO so it can be shared by the repository layer,
//! the HTTP API and tests alike.

pub mod acl;
pub mod annotation;
pub mod error;
pub mod ids;
pub mod markdown;
pub mod registration;
pub mod types;
pub mod uri;
pub mod userid;
