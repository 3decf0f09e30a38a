//! User reference record.

use common::UserId;
use serde::{Deserialize, Serialize};

/// A registered user, as seen by the order/payment core.
///
/// Authentication and the rest of user management live outside this core;
/// the workflow only needs a stable reference to the ordering user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    /// Creates a user record.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
