//! Customer accounts as listed by the back office.

use serde::{Deserialize, Serialize};

use super::{UserId, UserRole};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}
