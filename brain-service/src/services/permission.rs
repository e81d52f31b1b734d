//! Evaluates which RPC methods a principal may call.
//!
//! Services own their permission lists; the registry is filled from them at
//! composition time and only answers membership questions afterwards.

use super::store::{ApiUserStore, BrainStore, HumanUserStore, RoleStore, StoreError};
use crate::models::{Claims, ClaimsKind, Filter, Permission, ServicePermissions, TenantRole};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PermissionRegistry {
    tiers: HashMap<TenantRole, BTreeSet<Permission>>,
    claims_grants: HashMap<ClaimsKind, BTreeSet<Permission>>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, declared: &ServicePermissions) {
        for (role, permissions) in declared.tiers() {
            self.tiers
                .entry(role)
                .or_default()
                .extend(permissions.iter().cloned());
        }
        for (kind, permissions) in declared.claims_grants() {
            self.claims_grants
                .entry(kind)
                .or_default()
                .extend(permissions.iter().cloned());
        }
    }

    /// Permissions of a compiled-in tier. The System tier also holds every
    /// permission any other tier holds.
    pub fn tier(&self, role: TenantRole) -> BTreeSet<Permission> {
        let mut permissions = self.tiers.get(&role).cloned().unwrap_or_default();
        if role == TenantRole::System {
            for granted in self.tiers.values() {
                permissions.extend(granted.iter().cloned());
            }
        }
        permissions
    }

    pub fn claims_grant(&self, kind: ClaimsKind) -> BTreeSet<Permission> {
        self.claims_grants.get(&kind).cloned().unwrap_or_default()
    }
}

/// Resolves effective permissions, reading stored roles and API users.
#[derive(Clone)]
pub struct PermissionService {
    registry: Arc<PermissionRegistry>,
    store: Arc<dyn BrainStore>,
}

impl PermissionService {
    pub fn new(registry: Arc<PermissionRegistry>, store: Arc<dyn BrainStore>) -> Self {
        Self { registry, store }
    }

    pub async fn effective_permissions(
        &self,
        claims: &Claims,
    ) -> Result<BTreeSet<Permission>, StoreError> {
        match claims {
            Claims::HumanUserLogin(login) => {
                let user = self
                    .store
                    .find_one_user(&Filter::eq("id", login.user_id.as_str()))
                    .await?
                    .ok_or(StoreError::NotFound("user"))?;

                self.role_permissions(&user.roles).await
            }
            Claims::ApiUserLogin(login) => {
                let api_user = self
                    .store
                    .retrieve_api_user(&login.user_id)
                    .await?
                    .ok_or(StoreError::NotFound("api user"))?;
                Ok(api_user.permissions.into_iter().collect())
            }
            other => Ok(self.registry.claims_grant(other.kind())),
        }
    }

    /// Union of the named roles' permissions. An unknown role name fails the
    /// whole lookup.
    pub async fn role_permissions(
        &self,
        roles: &[String],
    ) -> Result<BTreeSet<Permission>, StoreError> {
        let mut permissions = BTreeSet::new();
        for role_name in roles {
            let role = self
                .store
                .retrieve_role(role_name)
                .await?
                .ok_or(StoreError::NotFound("role"))?;
            permissions.extend(role.permissions);
        }
        Ok(permissions)
    }

    /// Any lookup failure denies.
    pub async fn is_allowed(&self, claims: &Claims, method: &str) -> bool {
        match self.effective_permissions(claims).await {
            Ok(permissions) => permissions.contains(&Permission::from(method)),
            Err(e) => {
                tracing::warn!(
                    claims_kind = %claims.kind(),
                    method = %method,
                    reason = %e,
                    "Permission lookup failed"
                );
                false
            }
        }
    }
}
