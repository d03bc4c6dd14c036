//! Github API object models.
//!
//! Only the fields this workspace reads are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

pub mod commits;
pub mod repos;

pub use commits::Commit;
pub use repos::Repository;

/// A Github user or organization, as embedded in other objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: u64,

    /// Account login.
    pub login: String,
}
