//! Invitation and self-registration of company and client users.
//!
//! An administrator invites a user, which issues a registration token bound
//! to the target party. The invitee presents that token to the matching
//! `Register*` method, which is granted by the token's claims kind alone.

use crate::models::{
    Claims, ClaimsKind, HumanUser, Identifier, Party, PartyType, RegistrationClaims,
    ServicePermissions, TenantRole,
};
use crate::rpc::{decode_params, encode_result, CallContext, RpcError, RpcProvider};
use crate::services::store::{BrainStore, HumanUserStore, PartyStore};
use crate::services::tenant_filter;
use crate::services::token::TokenService;
use crate::utils::password::{hash_password_blocking, Password};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

pub const NAME: &str = "PartyRegistrar";

const METHODS: &[&str] = &[
    "InviteCompanyAdminUser",
    "InviteCompanyUser",
    "InviteClientAdminUser",
    "InviteClientUser",
    "RegisterCompanyAdminUser",
    "RegisterCompanyUser",
    "RegisterClientAdminUser",
    "RegisterClientUser",
];

pub fn permissions() -> ServicePermissions {
    ServicePermissions::new(NAME)
        .system(&[
            "InviteCompanyAdminUser",
            "InviteCompanyUser",
            "InviteClientAdminUser",
            "InviteClientUser",
        ])
        .company_admin(&["InviteCompanyUser"])
        .client_admin(&["InviteClientUser"])
        .claims_grant(
            ClaimsKind::RegisterCompanyAdminUser,
            &["RegisterCompanyAdminUser"],
        )
        .claims_grant(ClaimsKind::RegisterCompanyUser, &["RegisterCompanyUser"])
        .claims_grant(
            ClaimsKind::RegisterClientAdminUser,
            &["RegisterClientAdminUser"],
        )
        .claims_grant(ClaimsKind::RegisterClientUser, &["RegisterClientUser"])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteAdminUserRequest {
    #[serde(alias = "companyIdentifier", alias = "clientIdentifier")]
    pub party_identifier: Identifier,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteUserRequest {
    #[serde(alias = "companyIdentifier", alias = "clientIdentifier")]
    pub party_identifier: Identifier,

    #[validate(email(message = "Invalid email address"))]
    pub email_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub registration_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Surname is required"))]
    pub surname: String,

    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user: NewUser,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: crate::models::SanitizedHumanUser,
}

pub struct PartyRegistrar {
    store: Arc<dyn BrainStore>,
    tokens: TokenService,
    registration_expiry: Duration,
}

impl PartyRegistrar {
    pub fn new(
        store: Arc<dyn BrainStore>,
        tokens: TokenService,
        registration_expiry: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            registration_expiry,
        }
    }

    /// Issues registration claims of `kind` bound to the identified party.
    /// `email_address` of `None` invites the party's administrator.
    async fn invite(
        &self,
        claims: &Claims,
        kind: ClaimsKind,
        party_type: PartyType,
        identifier: &Identifier,
        email_address: Option<String>,
    ) -> Result<InviteResponse, RpcError> {
        identifier.validate()?;
        let filter = tenant_filter::scope(identifier.to_filter(), claims);
        let party = self
            .store
            .find_one_party(party_type, &filter)
            .await?
            .ok_or_else(|| RpcError::Service(format!("{} not found", party_type)))?;

        let email_address =
            email_address.unwrap_or_else(|| party.record().admin_email_address.clone());
        let registration = self.registration_claims(&party, email_address);
        let invitation = match kind {
            ClaimsKind::RegisterCompanyAdminUser => Claims::RegisterCompanyAdminUser(registration),
            ClaimsKind::RegisterCompanyUser => Claims::RegisterCompanyUser(registration),
            ClaimsKind::RegisterClientAdminUser => Claims::RegisterClientAdminUser(registration),
            ClaimsKind::RegisterClientUser => Claims::RegisterClientUser(registration),
            other => {
                return Err(RpcError::Service(format!(
                    "{} is not a registration claims kind",
                    other
                )))
            }
        };

        let registration_token = self.tokens.issue(&invitation)?;
        tracing::info!(
            claims_kind = %kind,
            party_id = %party.record().id,
            "Registration invitation issued"
        );
        Ok(InviteResponse { registration_token })
    }

    fn registration_claims(&self, party: &Party, email_address: String) -> RegistrationClaims {
        let now = Utc::now();
        let location = party.details();
        RegistrationClaims {
            issue_time: now.timestamp(),
            expiration_time: (now + self.registration_expiry).timestamp(),
            email_address,
            party_type: party.party_type(),
            party_id: location.party_id,
            parent_party_type: party.record().parent_party_type,
            parent_id: location.parent_id,
        }
    }

    async fn register(
        &self,
        claims: &Claims,
        expected: ClaimsKind,
        role: TenantRole,
        request: RegisterRequest,
    ) -> Result<RegisterResponse, RpcError> {
        let registration = match claims {
            Claims::RegisterCompanyAdminUser(c)
            | Claims::RegisterCompanyUser(c)
            | Claims::RegisterClientAdminUser(c)
            | Claims::RegisterClientUser(c)
                if claims.kind() == expected =>
            {
                c
            }
            _ => return Err(RpcError::Forbidden),
        };
        request.user.validate()?;

        let party = Identifier::id(registration.party_id.clone()).to_filter();
        if self
            .store
            .find_one_party(registration.party_type, &party)
            .await?
            .is_none()
        {
            return Err(RpcError::Service(format!(
                "{} not found",
                registration.party_type
            )));
        }

        let by_username = Identifier::username(request.user.username.clone()).to_filter();
        if self.store.find_one_user(&by_username).await?.is_some() {
            return Err(RpcError::Service("username already taken".to_string()));
        }
        let by_email = Identifier::email_address(registration.email_address.clone()).to_filter();
        if self.store.find_one_user(&by_email).await?.is_some() {
            return Err(RpcError::Service(
                "email address already registered".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(Password::new(request.user.password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to hash password during registration");
                RpcError::Service("internal error".to_string())
            })?;

        let user = HumanUser {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.user.name,
            surname: request.user.surname,
            username: request.user.username,
            email_address: registration.email_address.clone(),
            password_hash,
            roles: vec![role.role_name().to_string()],
            party_type: registration.party_type,
            party_id: registration.party_id.clone(),
            parent_party_type: registration.parent_party_type,
            parent_id: registration.parent_id.clone(),
            registered: true,
        };
        self.store.create_user(&user).await?;

        tracing::info!(
            user_id = %user.id,
            party_id = %user.party_id,
            claims_kind = %expected,
            "User registered"
        );
        Ok(RegisterResponse {
            user: user.sanitized(),
        })
    }
}

#[async_trait]
impl RpcProvider for PartyRegistrar {
    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    fn permissions(&self) -> ServicePermissions {
        permissions()
    }

    async fn call(
        &self,
        ctx: &CallContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        let claims = ctx.claims()?;
        match method {
            "InviteCompanyAdminUser" | "InviteClientAdminUser" => {
                let (kind, party_type) = if method == "InviteCompanyAdminUser" {
                    (ClaimsKind::RegisterCompanyAdminUser, PartyType::Company)
                } else {
                    (ClaimsKind::RegisterClientAdminUser, PartyType::Client)
                };
                let request: InviteAdminUserRequest = decode_params(params)?;
                let response = self
                    .invite(claims, kind, party_type, &request.party_identifier, None)
                    .await?;
                encode_result(&response)
            }
            "InviteCompanyUser" | "InviteClientUser" => {
                let (kind, party_type) = if method == "InviteCompanyUser" {
                    (ClaimsKind::RegisterCompanyUser, PartyType::Company)
                } else {
                    (ClaimsKind::RegisterClientUser, PartyType::Client)
                };
                let request: InviteUserRequest = decode_params(params)?;
                request.validate()?;
                let response = self
                    .invite(
                        claims,
                        kind,
                        party_type,
                        &request.party_identifier,
                        Some(request.email_address),
                    )
                    .await?;
                encode_result(&response)
            }
            "RegisterCompanyAdminUser" => {
                let response = self
                    .register(
                        claims,
                        ClaimsKind::RegisterCompanyAdminUser,
                        TenantRole::CompanyAdmin,
                        decode_params(params)?,
                    )
                    .await?;
                encode_result(&response)
            }
            "RegisterCompanyUser" => {
                let response = self
                    .register(
                        claims,
                        ClaimsKind::RegisterCompanyUser,
                        TenantRole::CompanyUser,
                        decode_params(params)?,
                    )
                    .await?;
                encode_result(&response)
            }
            "RegisterClientAdminUser" => {
                let response = self
                    .register(
                        claims,
                        ClaimsKind::RegisterClientAdminUser,
                        TenantRole::ClientAdmin,
                        decode_params(params)?,
                    )
                    .await?;
                encode_result(&response)
            }
            "RegisterClientUser" => {
                let response = self
                    .register(
                        claims,
                        ClaimsKind::RegisterClientUser,
                        TenantRole::ClientUser,
                        decode_params(params)?,
                    )
                    .await?;
                encode_result(&response)
            }
            other => Err(RpcError::MethodNotFound(format!("{}.{}", NAME, other))),
        }
    }
}
