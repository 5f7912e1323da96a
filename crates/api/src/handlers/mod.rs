pub mod annotations;
pub mod auth;
pub mod embed;
pub mod groups;
