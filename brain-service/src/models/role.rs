//! Named, stored permission lists referenced by human users.

use super::permission::Permission;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(name: &str, permissions: Vec<Permission>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            permissions,
        }
    }

    /// Order-insensitive comparison used when reconciling seeded roles.
    pub fn has_same_permissions(&self, other: &[Permission]) -> bool {
        let mine: BTreeSet<&Permission> = self.permissions.iter().collect();
        let theirs: BTreeSet<&Permission> = other.iter().collect();
        mine == theirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_comparison_ignores_order_and_duplicates() {
        let role = Role::new("clientUser", vec!["A.X".into(), "A.Y".into()]);
        assert!(role.has_same_permissions(&["A.Y".into(), "A.X".into(), "A.X".into()]));
        assert!(!role.has_same_permissions(&["A.X".into()]));
    }
}
