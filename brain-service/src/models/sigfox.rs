//! Registered Sigfox backends allowed to post device callbacks.

use super::party::PartyType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigfoxBackend {
    pub id: String,
    pub name: String,
    pub owner_party_type: PartyType,
    pub owner_id: String,
    /// Long-lived `SigfoxBackend` token handed to the backend operator.
    #[serde(default)]
    pub token: String,
}
