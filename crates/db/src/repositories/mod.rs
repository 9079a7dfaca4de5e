//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod moderator_repo;
pub mod project_repo;
pub mod vote_repo;

pub use moderator_repo::ModeratorRepo;
pub use project_repo::ProjectRepo;
pub use vote_repo::{VoteOutcome, VoteRepo};
