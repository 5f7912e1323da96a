//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Inserts that take part in a
//! larger unit of work accept `&mut PgConnection` instead.

pub mod activation_repo;
pub mod annotation_repo;
pub mod document_repo;
pub mod group_repo;
pub mod session_repo;
pub mod subscription_repo;
pub mod user_repo;

pub use activation_repo::ActivationRepo;
pub use annotation_repo::AnnotationRepo;
pub use document_repo::DocumentRepo;
pub use group_repo::GroupRepo;
pub use session_repo::SessionRepo;
pub use subscription_repo::SubscriptionRepo;
pub use user_repo::UserRepo;
