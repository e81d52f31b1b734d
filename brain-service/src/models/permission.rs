use super::claims::ClaimsKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `"<Service>.<Method>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    pub fn new(service: &str, method: &str) -> Self {
        Permission(format!("{}.{}", service, method))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(s: &str) -> Self {
        Permission(s.to_string())
    }
}

/// The five compiled-in tenant tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenantRole {
    System,
    CompanyAdmin,
    CompanyUser,
    ClientAdmin,
    ClientUser,
}

impl TenantRole {
    pub const ALL: [TenantRole; 5] = [
        TenantRole::System,
        TenantRole::CompanyAdmin,
        TenantRole::CompanyUser,
        TenantRole::ClientAdmin,
        TenantRole::ClientUser,
    ];

    /// Name of the role record seeded for this tier at startup.
    pub fn role_name(self) -> &'static str {
        match self {
            TenantRole::System => "root",
            TenantRole::CompanyAdmin => "companyAdmin",
            TenantRole::CompanyUser => "companyUser",
            TenantRole::ClientAdmin => "clientAdmin",
            TenantRole::ClientUser => "clientUser",
        }
    }
}

/// Permission lists one RPC service declares for itself: a method list per
/// tenant tier, plus grants carried by non-login claims.
#[derive(Debug, Clone, Default)]
pub struct ServicePermissions {
    service: String,
    tiers: Vec<(TenantRole, Vec<Permission>)>,
    claims_grants: Vec<(ClaimsKind, Vec<Permission>)>,
}

impl ServicePermissions {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            ..Default::default()
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn tier(mut self, role: TenantRole, methods: &[&str]) -> Self {
        let permissions = self.qualify(methods);
        self.tiers.push((role, permissions));
        self
    }

    pub fn system(self, methods: &[&str]) -> Self {
        self.tier(TenantRole::System, methods)
    }

    pub fn company_admin(self, methods: &[&str]) -> Self {
        self.tier(TenantRole::CompanyAdmin, methods)
    }

    pub fn company_user(self, methods: &[&str]) -> Self {
        self.tier(TenantRole::CompanyUser, methods)
    }

    pub fn client_admin(self, methods: &[&str]) -> Self {
        self.tier(TenantRole::ClientAdmin, methods)
    }

    pub fn client_user(self, methods: &[&str]) -> Self {
        self.tier(TenantRole::ClientUser, methods)
    }

    pub fn all_tiers(self, methods: &[&str]) -> Self {
        TenantRole::ALL
            .iter()
            .fold(self, |declared, role| declared.tier(*role, methods))
    }

    /// Methods callable by any holder of `kind` claims.
    pub fn claims_grant(mut self, kind: ClaimsKind, methods: &[&str]) -> Self {
        let permissions = self.qualify(methods);
        self.claims_grants.push((kind, permissions));
        self
    }

    pub fn tiers(&self) -> impl Iterator<Item = (TenantRole, &[Permission])> {
        self.tiers.iter().map(|(r, p)| (*r, p.as_slice()))
    }

    pub fn claims_grants(&self) -> impl Iterator<Item = (ClaimsKind, &[Permission])> {
        self.claims_grants.iter().map(|(k, p)| (*k, p.as_slice()))
    }

    fn qualify(&self, methods: &[&str]) -> Vec<Permission> {
        methods
            .iter()
            .map(|m| Permission::new(&self.service, m))
            .collect()
    }
}
