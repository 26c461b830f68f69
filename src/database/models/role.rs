use serde::{Deserialize, Serialize};

use super::RoleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub role_name: String,
}

impl Role {
    /// Role names are compared case-insensitively everywhere.
    pub fn is_named(&self, name: &str) -> bool {
        self.role_name.eq_ignore_ascii_case(name.trim())
    }
}
