//! Multi-step operations that span several repositories.

pub mod signup;
