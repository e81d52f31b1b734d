//! Human and API user accounts.

use super::party::PartyType;
use super::permission::Permission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanUser {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email_address: String,
    /// Argon2 PHC string; empty until the user has registered.
    #[serde(default)]
    pub password_hash: String,
    pub roles: Vec<String>,
    pub party_type: PartyType,
    pub party_id: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
    #[serde(default)]
    pub registered: bool,
}

impl HumanUser {
    /// Convert to response without the password hash.
    pub fn sanitized(&self) -> SanitizedHumanUser {
        SanitizedHumanUser::from(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedHumanUser {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email_address: String,
    pub roles: Vec<String>,
    pub party_type: PartyType,
    pub party_id: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
    pub registered: bool,
}

impl From<HumanUser> for SanitizedHumanUser {
    fn from(u: HumanUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            surname: u.surname,
            username: u.username,
            email_address: u.email_address,
            roles: u.roles,
            party_type: u.party_type,
            party_id: u.party_id,
            parent_party_type: u.parent_party_type,
            parent_id: u.parent_id,
            registered: u.registered,
        }
    }
}

/// Machine principal with a directly stored permission list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub id: String,
    pub name: String,
    pub username: String,
    /// Argon2 PHC string checked by the API user login.
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub description: String,
    pub permissions: Vec<Permission>,
    pub party_type: PartyType,
    pub party_id: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_user_has_no_password_hash() {
        let user = HumanUser {
            id: "u-1".to_string(),
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            username: "ada".to_string(),
            email_address: "ada@acme.test".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec!["companyAdmin".to_string()],
            party_type: PartyType::Company,
            party_id: "A".to_string(),
            parent_party_type: PartyType::System,
            parent_id: "S".to_string(),
            registered: true,
        };

        let json = serde_json::to_string(&user.sanitized()).unwrap();
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("secret"));
    }
}
