#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

pub use repo::{PgUserStore, StoreError, UserStore};
pub use repo_types::{NewUser, User};
