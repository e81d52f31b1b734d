//! Who is making a call, and on behalf of which tenant.

use super::party::{PartyType, TenantLocation};
use crate::envelope::{self, enveloped_serde, Enveloped};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimsKind {
    HumanUserLogin,
    ApiUserLogin,
    RegisterCompanyAdminUser,
    RegisterCompanyUser,
    RegisterClientAdminUser,
    RegisterClientUser,
    ResetPassword,
    SigfoxBackend,
}

impl ClaimsKind {
    pub const ALL: [ClaimsKind; 8] = [
        ClaimsKind::HumanUserLogin,
        ClaimsKind::ApiUserLogin,
        ClaimsKind::RegisterCompanyAdminUser,
        ClaimsKind::RegisterCompanyUser,
        ClaimsKind::RegisterClientAdminUser,
        ClaimsKind::RegisterClientUser,
        ClaimsKind::ResetPassword,
        ClaimsKind::SigfoxBackend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimsKind::HumanUserLogin => "HumanUserLogin",
            ClaimsKind::ApiUserLogin => "APIUserLogin",
            ClaimsKind::RegisterCompanyAdminUser => "RegisterCompanyAdminUser",
            ClaimsKind::RegisterCompanyUser => "RegisterCompanyUser",
            ClaimsKind::RegisterClientAdminUser => "RegisterClientAdminUser",
            ClaimsKind::RegisterClientUser => "RegisterClientUser",
            ClaimsKind::ResetPassword => "ResetPassword",
            ClaimsKind::SigfoxBackend => "SigfoxBackend",
        }
    }
}

impl fmt::Display for ClaimsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        envelope::parse_tag(&Self::ALL, Self::as_str, s)
            .ok_or_else(|| format!("invalid claims type: {}", s))
    }
}

/// Issued to a human user at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginClaims {
    pub user_id: String,
    pub issue_time: i64,
    pub expiration_time: i64,
    pub party_type: PartyType,
    pub party_id: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
}

/// Carried by an invitation to register a user under a party that may not
/// exist yet, so the location is only the target party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationClaims {
    pub issue_time: i64,
    pub expiration_time: i64,
    pub email_address: String,
    pub party_type: PartyType,
    pub party_id: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordClaims {
    pub user_id: String,
    pub issue_time: i64,
    pub expiration_time: i64,
    pub party_type: PartyType,
    pub party_id: String,
    pub parent_party_type: PartyType,
    pub parent_id: String,
}

/// A trusted callback source bound to one registered backend. Never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigfoxBackendClaims {
    pub backend_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claims {
    HumanUserLogin(LoginClaims),
    ApiUserLogin(LoginClaims),
    RegisterCompanyAdminUser(RegistrationClaims),
    RegisterCompanyUser(RegistrationClaims),
    RegisterClientAdminUser(RegistrationClaims),
    RegisterClientUser(RegistrationClaims),
    ResetPassword(ResetPasswordClaims),
    SigfoxBackend(SigfoxBackendClaims),
}

// Longest span chrono can represent as a Duration.
const MAX_DURATION_SECS: i64 = i64::MAX / 1000;

impl Claims {
    pub fn kind(&self) -> ClaimsKind {
        match self {
            Claims::HumanUserLogin(_) => ClaimsKind::HumanUserLogin,
            Claims::ApiUserLogin(_) => ClaimsKind::ApiUserLogin,
            Claims::RegisterCompanyAdminUser(_) => ClaimsKind::RegisterCompanyAdminUser,
            Claims::RegisterCompanyUser(_) => ClaimsKind::RegisterCompanyUser,
            Claims::RegisterClientAdminUser(_) => ClaimsKind::RegisterClientAdminUser,
            Claims::RegisterClientUser(_) => ClaimsKind::RegisterClientUser,
            Claims::ResetPassword(_) => ClaimsKind::ResetPassword,
            Claims::SigfoxBackend(_) => ClaimsKind::SigfoxBackend,
        }
    }

    /// Unix seconds, or `None` for claims that never expire.
    pub fn expiration_time(&self) -> Option<i64> {
        match self {
            Claims::HumanUserLogin(c) | Claims::ApiUserLogin(c) => Some(c.expiration_time),
            Claims::RegisterCompanyAdminUser(c)
            | Claims::RegisterCompanyUser(c)
            | Claims::RegisterClientAdminUser(c)
            | Claims::RegisterClientUser(c) => Some(c.expiration_time),
            Claims::ResetPassword(c) => Some(c.expiration_time),
            Claims::SigfoxBackend(_) => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiration_time().is_some_and(|exp| now > exp)
    }

    /// Negative once expired; saturates for claims that never expire.
    pub fn time_to_expiry(&self) -> Duration {
        let secs = match self.expiration_time() {
            Some(exp) => exp.saturating_sub(Utc::now().timestamp()),
            None => MAX_DURATION_SECS,
        };
        Duration::seconds(secs.clamp(-MAX_DURATION_SECS, MAX_DURATION_SECS))
    }

    pub fn tenant_location(&self) -> TenantLocation {
        let located = |party_type, party_id: &str, parent_party_type, parent_id: &str| {
            TenantLocation {
                party_type: Some(party_type),
                party_id: party_id.to_string(),
                parent_party_type: Some(parent_party_type),
                parent_id: parent_id.to_string(),
            }
        };

        match self {
            Claims::HumanUserLogin(c) | Claims::ApiUserLogin(c) => {
                located(c.party_type, &c.party_id, c.parent_party_type, &c.parent_id)
            }
            Claims::RegisterCompanyAdminUser(c)
            | Claims::RegisterCompanyUser(c)
            | Claims::RegisterClientAdminUser(c)
            | Claims::RegisterClientUser(c) => {
                located(c.party_type, &c.party_id, c.parent_party_type, &c.parent_id)
            }
            Claims::ResetPassword(c) => {
                located(c.party_type, &c.party_id, c.parent_party_type, &c.parent_id)
            }
            Claims::SigfoxBackend(_) => TenantLocation::default(),
        }
    }

    /// The user these claims speak for, when there is one.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Claims::HumanUserLogin(c) | Claims::ApiUserLogin(c) => Some(&c.user_id),
            Claims::ResetPassword(c) => Some(&c.user_id),
            _ => None,
        }
    }
}

impl Enveloped for Claims {
    const CAPABILITY: &'static str = "claims";

    type Kind = ClaimsKind;

    fn kind(&self) -> ClaimsKind {
        Claims::kind(self)
    }

    fn payload(&self) -> serde_json::Result<Value> {
        match self {
            Claims::HumanUserLogin(c) | Claims::ApiUserLogin(c) => serde_json::to_value(c),
            Claims::RegisterCompanyAdminUser(c)
            | Claims::RegisterCompanyUser(c)
            | Claims::RegisterClientAdminUser(c)
            | Claims::RegisterClientUser(c) => serde_json::to_value(c),
            Claims::ResetPassword(c) => serde_json::to_value(c),
            Claims::SigfoxBackend(c) => serde_json::to_value(c),
        }
    }

    fn from_payload(kind: ClaimsKind, payload: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            ClaimsKind::HumanUserLogin => Claims::HumanUserLogin(serde_json::from_value(payload)?),
            ClaimsKind::ApiUserLogin => Claims::ApiUserLogin(serde_json::from_value(payload)?),
            ClaimsKind::RegisterCompanyAdminUser => {
                Claims::RegisterCompanyAdminUser(serde_json::from_value(payload)?)
            }
            ClaimsKind::RegisterCompanyUser => {
                Claims::RegisterCompanyUser(serde_json::from_value(payload)?)
            }
            ClaimsKind::RegisterClientAdminUser => {
                Claims::RegisterClientAdminUser(serde_json::from_value(payload)?)
            }
            ClaimsKind::RegisterClientUser => {
                Claims::RegisterClientUser(serde_json::from_value(payload)?)
            }
            ClaimsKind::ResetPassword => Claims::ResetPassword(serde_json::from_value(payload)?),
            ClaimsKind::SigfoxBackend => Claims::SigfoxBackend(serde_json::from_value(payload)?),
        })
    }
}

enveloped_serde!(Claims);
