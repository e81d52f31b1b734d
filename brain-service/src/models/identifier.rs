//! Lookup keys for any stored entity.

use super::filter::Filter;
use super::party::PartyType;
use crate::envelope::{self, enveloped_serde, Enveloped};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("{0} identifier field is blank")]
    Blank(&'static str),

    #[error("party identifier must wrap an Id identifier, got {0}")]
    InvalidPartyIdentifier(IdentifierKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Id,
    Name,
    Username,
    EmailAddress,
    AdminEmailAddress,
    DeviceTk102,
    DeviceZx303,
    Party,
}

impl IdentifierKind {
    pub const ALL: [IdentifierKind; 8] = [
        IdentifierKind::Id,
        IdentifierKind::Name,
        IdentifierKind::Username,
        IdentifierKind::EmailAddress,
        IdentifierKind::AdminEmailAddress,
        IdentifierKind::DeviceTk102,
        IdentifierKind::DeviceZx303,
        IdentifierKind::Party,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Id => "Id",
            IdentifierKind::Name => "Name",
            IdentifierKind::Username => "Username",
            IdentifierKind::EmailAddress => "EmailAddress",
            IdentifierKind::AdminEmailAddress => "AdminEmailAddress",
            IdentifierKind::DeviceTk102 => "DeviceTK102",
            IdentifierKind::DeviceZx303 => "DeviceZX303",
            IdentifierKind::Party => "Party",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        envelope::parse_tag(&Self::ALL, Self::as_str, s)
            .ok_or_else(|| format!("invalid identifier type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Id {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEmailAddress {
    pub admin_email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTk102 {
    pub manufacturer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceZx303 {
    pub imei: String,
}

/// Identifies a record by the party that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyIdentifier {
    pub party_type: PartyType,
    pub party_id_identifier: Box<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Id(Id),
    Name(Name),
    Username(Username),
    EmailAddress(EmailAddress),
    AdminEmailAddress(AdminEmailAddress),
    DeviceTk102(DeviceTk102),
    DeviceZx303(DeviceZx303),
    Party(PartyIdentifier),
}

impl Identifier {
    pub fn id(id: impl Into<String>) -> Self {
        Identifier::Id(Id { id: id.into() })
    }

    pub fn name(name: impl Into<String>) -> Self {
        Identifier::Name(Name { name: name.into() })
    }

    pub fn username(username: impl Into<String>) -> Self {
        Identifier::Username(Username {
            username: username.into(),
        })
    }

    pub fn email_address(email_address: impl Into<String>) -> Self {
        Identifier::EmailAddress(EmailAddress {
            email_address: email_address.into(),
        })
    }

    pub fn party(party_type: PartyType, party_id: impl Into<String>) -> Self {
        Identifier::Party(PartyIdentifier {
            party_type,
            party_id_identifier: Box::new(Identifier::id(party_id)),
        })
    }

    pub fn validate(&self) -> Result<(), IdentifierError> {
        fn not_blank(field: &'static str, value: &str) -> Result<(), IdentifierError> {
            if value.trim().is_empty() {
                Err(IdentifierError::Blank(field))
            } else {
                Ok(())
            }
        }

        match self {
            Identifier::Id(i) => not_blank("id", &i.id),
            Identifier::Name(i) => not_blank("name", &i.name),
            Identifier::Username(i) => not_blank("username", &i.username),
            Identifier::EmailAddress(i) => not_blank("emailAddress", &i.email_address),
            Identifier::AdminEmailAddress(i) => {
                not_blank("adminEmailAddress", &i.admin_email_address)
            }
            Identifier::DeviceTk102(i) => not_blank("manufacturerId", &i.manufacturer_id),
            Identifier::DeviceZx303(i) => not_blank("imei", &i.imei),
            Identifier::Party(i) => match i.party_id_identifier.as_ref() {
                Identifier::Id(inner) => not_blank("partyIdIdentifier", &inner.id),
                other => Err(IdentifierError::InvalidPartyIdentifier(other.kind())),
            },
        }
    }

    /// Equality predicate on the record field this identifier names.
    pub fn to_filter(&self) -> Filter {
        match self {
            Identifier::Id(i) => Filter::eq("id", i.id.as_str()),
            Identifier::Name(i) => Filter::eq("name", i.name.as_str()),
            Identifier::Username(i) => Filter::eq("username", i.username.as_str()),
            Identifier::EmailAddress(i) => Filter::eq("emailAddress", i.email_address.as_str()),
            Identifier::AdminEmailAddress(i) => {
                Filter::eq("adminEmailAddress", i.admin_email_address.as_str())
            }
            Identifier::DeviceTk102(i) => Filter::eq("manufacturerId", i.manufacturer_id.as_str()),
            Identifier::DeviceZx303(i) => Filter::eq("imei", i.imei.as_str()),
            Identifier::Party(i) => {
                let party_id = match i.party_id_identifier.as_ref() {
                    Identifier::Id(inner) => inner.id.as_str(),
                    // rejected by validate(); never match anything
                    _ => return Filter::Or(vec![]),
                };
                Filter::And(vec![
                    Filter::eq("partyType", i.party_type.as_str()),
                    Filter::eq("partyId", party_id),
                ])
            }
        }
    }
}

impl Enveloped for Identifier {
    const CAPABILITY: &'static str = "identifier";

    type Kind = IdentifierKind;

    fn kind(&self) -> IdentifierKind {
        match self {
            Identifier::Id(_) => IdentifierKind::Id,
            Identifier::Name(_) => IdentifierKind::Name,
            Identifier::Username(_) => IdentifierKind::Username,
            Identifier::EmailAddress(_) => IdentifierKind::EmailAddress,
            Identifier::AdminEmailAddress(_) => IdentifierKind::AdminEmailAddress,
            Identifier::DeviceTk102(_) => IdentifierKind::DeviceTk102,
            Identifier::DeviceZx303(_) => IdentifierKind::DeviceZx303,
            Identifier::Party(_) => IdentifierKind::Party,
        }
    }

    fn payload(&self) -> serde_json::Result<Value> {
        match self {
            Identifier::Id(i) => serde_json::to_value(i),
            Identifier::Name(i) => serde_json::to_value(i),
            Identifier::Username(i) => serde_json::to_value(i),
            Identifier::EmailAddress(i) => serde_json::to_value(i),
            Identifier::AdminEmailAddress(i) => serde_json::to_value(i),
            Identifier::DeviceTk102(i) => serde_json::to_value(i),
            Identifier::DeviceZx303(i) => serde_json::to_value(i),
            Identifier::Party(i) => serde_json::to_value(i),
        }
    }

    fn from_payload(kind: IdentifierKind, payload: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            IdentifierKind::Id => Identifier::Id(serde_json::from_value(payload)?),
            IdentifierKind::Name => Identifier::Name(serde_json::from_value(payload)?),
            IdentifierKind::Username => Identifier::Username(serde_json::from_value(payload)?),
            IdentifierKind::EmailAddress => {
                Identifier::EmailAddress(serde_json::from_value(payload)?)
            }
            IdentifierKind::AdminEmailAddress => {
                Identifier::AdminEmailAddress(serde_json::from_value(payload)?)
            }
            IdentifierKind::DeviceTk102 => {
                Identifier::DeviceTk102(serde_json::from_value(payload)?)
            }
            IdentifierKind::DeviceZx303 => {
                Identifier::DeviceZx303(serde_json::from_value(payload)?)
            }
            IdentifierKind::Party => Identifier::Party(serde_json::from_value(payload)?),
        })
    }
}

enveloped_serde!(Identifier);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_variant_round_trips() {
        let identifiers = vec![
            Identifier::id("1"),
            Identifier::name("root"),
            Identifier::username("root"),
            Identifier::email_address("root@root.com"),
            Identifier::AdminEmailAddress(AdminEmailAddress {
                admin_email_address: "admin@acme.test".to_string(),
            }),
            Identifier::DeviceTk102(DeviceTk102 {
                manufacturer_id: "tk-1".to_string(),
            }),
            Identifier::DeviceZx303(DeviceZx303 {
                imei: "356938035643809".to_string(),
            }),
            Identifier::party(PartyType::Client, "client-1"),
        ];

        for identifier in identifiers {
            let json = serde_json::to_string(&identifier).unwrap();
            let back: Identifier = serde_json::from_str(&json).unwrap();
            assert_eq!(back, identifier);
        }
    }

    #[test]
    fn party_identifier_nests_a_wrapped_identifier() {
        let json = serde_json::to_value(Identifier::party(PartyType::Company, "c-1")).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "Party",
                "value": {
                    "partyType": "Company",
                    "partyIdIdentifier": { "type": "Id", "value": { "id": "c-1" } }
                }
            })
        );
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert_eq!(
            Identifier::username("  ").validate(),
            Err(IdentifierError::Blank("username"))
        );
        assert!(Identifier::username("root").validate().is_ok());
    }

    #[test]
    fn party_identifier_must_wrap_an_id() {
        let identifier = Identifier::Party(PartyIdentifier {
            party_type: PartyType::Client,
            party_id_identifier: Box::new(Identifier::name("Acme")),
        });
        assert_eq!(
            identifier.validate(),
            Err(IdentifierError::InvalidPartyIdentifier(IdentifierKind::Name))
        );
    }

    #[test]
    fn party_identifier_filters_on_owner() {
        let filter = Identifier::party(PartyType::Client, "client-1").to_filter();
        let owned = bson::doc! { "partyType": "Client", "partyId": "client-1" };
        let other = bson::doc! { "partyType": "Company", "partyId": "client-1" };
        assert!(filter.matches(&owned));
        assert!(!filter.matches(&other));
    }
}
