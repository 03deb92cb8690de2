//! Employee role enumeration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Manager,
    Accountant,
    Maintenance,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Manager => "manager",
            Role::Accountant => "accountant",
            Role::Maintenance => "maintenance",
            Role::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "administrator" => Some(Role::Administrator),
            "manager" => Some(Role::Manager),
            "accountant" => Some(Role::Accountant),
            "maintenance" => Some(Role::Maintenance),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Viewer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::Administrator,
            Role::Manager,
            Role::Accountant,
            Role::Maintenance,
            Role::Viewer,
        ] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!(Role::from_str("superuser"), None);
    }
}
