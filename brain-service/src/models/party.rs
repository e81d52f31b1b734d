//! Tenant nodes: the single System root, Companies and Clients.

use crate::envelope::{self, enveloped_serde, Enveloped};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyType {
    System,
    Company,
    Client,
}

impl PartyType {
    pub const ALL: [PartyType; 3] = [PartyType::System, PartyType::Company, PartyType::Client];

    pub fn as_str(self) -> &'static str {
        match self {
            PartyType::System => "System",
            PartyType::Company => "Company",
            PartyType::Client => "Client",
        }
    }

    /// Storage collection holding records of this party type.
    pub fn collection(self) -> &'static str {
        match self {
            PartyType::System => "system",
            PartyType::Company => "company",
            PartyType::Client => "client",
        }
    }
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        envelope::parse_tag(&Self::ALL, Self::as_str, s)
            .ok_or_else(|| format!("invalid party type: {}", s))
    }
}

/// Where a principal or record sits in the tenant tree. Unresolved fields
/// are left at their zero values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantLocation {
    pub party_type: Option<PartyType>,
    pub party_id: String,
    pub parent_party_type: Option<PartyType>,
    pub parent_id: String,
}

impl TenantLocation {
    pub fn is_system(&self) -> bool {
        self.party_type == Some(PartyType::System)
    }
}

/// Fields shared by every party record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRecord {
    pub id: String,
    pub name: String,
    pub admin_email_address: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Party {
    System(PartyRecord),
    Company(PartyRecord),
    Client(PartyRecord),
}

impl Party {
    pub fn new(party_type: PartyType, record: PartyRecord) -> Self {
        match party_type {
            PartyType::System => Party::System(record),
            PartyType::Company => Party::Company(record),
            PartyType::Client => Party::Client(record),
        }
    }

    pub fn party_type(&self) -> PartyType {
        match self {
            Party::System(_) => PartyType::System,
            Party::Company(_) => PartyType::Company,
            Party::Client(_) => PartyType::Client,
        }
    }

    pub fn record(&self) -> &PartyRecord {
        match self {
            Party::System(r) | Party::Company(r) | Party::Client(r) => r,
        }
    }

    pub fn into_record(self) -> PartyRecord {
        match self {
            Party::System(r) | Party::Company(r) | Party::Client(r) => r,
        }
    }

    pub fn details(&self) -> TenantLocation {
        let record = self.record();
        TenantLocation {
            party_type: Some(self.party_type()),
            party_id: record.id.clone(),
            parent_party_type: Some(record.parent_party_type),
            parent_id: record.parent_id.clone(),
        }
    }
}

impl Enveloped for Party {
    const CAPABILITY: &'static str = "party";

    type Kind = PartyType;

    fn kind(&self) -> PartyType {
        self.party_type()
    }

    fn payload(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.record())
    }

    fn from_payload(kind: PartyType, payload: Value) -> serde_json::Result<Self> {
        serde_json::from_value(payload).map(|record| Party::new(kind, record))
    }
}

enveloped_serde!(Party);

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> Party {
        Party::Company(PartyRecord {
            id: "company-a".to_string(),
            name: "Acme".to_string(),
            admin_email_address: "admin@acme.test".to_string(),
            parent_party_type: PartyType::System,
            parent_id: "system-1".to_string(),
        })
    }

    #[test]
    fn party_round_trips_through_envelope() {
        let party = company();
        let json = serde_json::to_string(&party).unwrap();
        let back: Party = serde_json::from_str(&json).unwrap();
        assert_eq!(back, party);
    }

    #[test]
    fn party_record_fields_are_camel_case() {
        let json = serde_json::to_value(company()).unwrap();
        assert_eq!(json["type"], "Company");
        assert_eq!(json["value"]["adminEmailAddress"], "admin@acme.test");
        assert_eq!(json["value"]["parentPartyType"], "System");
    }

    #[test]
    fn details_reports_own_and_parent_location() {
        let details = company().details();
        assert_eq!(details.party_type, Some(PartyType::Company));
        assert_eq!(details.party_id, "company-a");
        assert_eq!(details.parent_id, "system-1");
        assert!(!details.is_system());
    }

    #[test]
    fn party_type_parse_rejects_unknown() {
        assert_eq!("Client".parse::<PartyType>(), Ok(PartyType::Client));
        assert!("Individual".parse::<PartyType>().is_err());
    }
}
