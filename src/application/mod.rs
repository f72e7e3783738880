//! Application services orchestrating domain logic and repositories.

pub mod error;
pub mod pagination;
pub mod posts;
pub mod repos;
