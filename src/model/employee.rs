use serde::{Deserialize, Serialize};

/// Reserved employee ID for the administrator account.
pub const ADMIN_ID: &str = "admin";

/// Row of the employee master table. `password_hash` is an argon2 PHC string;
/// an empty hash means the employee signs in with their ID alone. The admin
/// row must carry a hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub password_hash: String,
}

impl Employee {
    pub fn is_admin(&self) -> bool {
        self.employee_id == ADMIN_ID
    }
}
