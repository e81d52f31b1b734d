use super::store::{
    ApiUserStore, BrainStore, HumanUserStore, PartyStore, RoleStore, SigfoxBackendStore, StoreError,
};
use crate::models::{ApiUser, Filter, HumanUser, Party, PartyType, Role, SigfoxBackend};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Store kept in process memory, used by tests and local runs without
/// MongoDB. Filters are evaluated against each record's BSON form.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    parties: Vec<Party>,
    roles: Vec<Role>,
    users: Vec<HumanUser>,
    api_users: Vec<ApiUser>,
    sigfox_backends: Vec<SigfoxBackend>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.users.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Database(anyhow::anyhow!("In-memory store poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Database(anyhow::anyhow!("In-memory store poisoned: {}", e)))
    }
}

fn matches<T: Serialize>(filter: &Filter, record: &T) -> Result<bool, StoreError> {
    Ok(filter.matches(&bson::to_document(record)?))
}

#[async_trait]
impl PartyStore for InMemoryStore {
    async fn find_parties(
        &self,
        party_type: PartyType,
        filter: &Filter,
    ) -> Result<Vec<Party>, StoreError> {
        let inner = self.read()?;
        let mut found = Vec::new();
        for party in inner.parties.iter().filter(|p| p.party_type() == party_type) {
            if matches(filter, party.record())? {
                found.push(party.clone());
            }
        }
        Ok(found)
    }

    async fn find_one_party(
        &self,
        party_type: PartyType,
        filter: &Filter,
    ) -> Result<Option<Party>, StoreError> {
        Ok(self.find_parties(party_type, filter).await?.into_iter().next())
    }

    async fn create_party(&self, party: &Party) -> Result<(), StoreError> {
        self.write()?.parties.push(party.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn retrieve_role(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.read()?.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn create_role(&self, role: &Role) -> Result<(), StoreError> {
        self.write()?.roles.push(role.clone());
        Ok(())
    }

    async fn update_role(&self, role: &Role) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let existing = inner
            .roles
            .iter_mut()
            .find(|r| r.name == role.name)
            .ok_or(StoreError::NotFound("role"))?;
        *existing = role.clone();
        Ok(())
    }
}

#[async_trait]
impl HumanUserStore for InMemoryStore {
    async fn find_one_user(&self, filter: &Filter) -> Result<Option<HumanUser>, StoreError> {
        let inner = self.read()?;
        for user in &inner.users {
            if matches(filter, user)? {
                return Ok(Some(user.clone()));
            }
        }
        Ok(None)
    }

    async fn create_user(&self, user: &HumanUser) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        // same constraint as the unique indexes on the Mongo collection
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email_address == user.email_address)
        {
            return Err(StoreError::Database(anyhow::anyhow!(
                "duplicate username or email address"
            )));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &HumanUser) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let existing = inner
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound("user"))?;
        *existing = user.clone();
        Ok(())
    }
}

#[async_trait]
impl ApiUserStore for InMemoryStore {
    async fn retrieve_api_user(&self, id: &str) -> Result<Option<ApiUser>, StoreError> {
        Ok(self.read()?.api_users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_one_api_user(&self, filter: &Filter) -> Result<Option<ApiUser>, StoreError> {
        let inner = self.read()?;
        for api_user in &inner.api_users {
            if matches(filter, api_user)? {
                return Ok(Some(api_user.clone()));
            }
        }
        Ok(None)
    }

    async fn create_api_user(&self, api_user: &ApiUser) -> Result<(), StoreError> {
        self.write()?.api_users.push(api_user.clone());
        Ok(())
    }
}

#[async_trait]
impl SigfoxBackendStore for InMemoryStore {
    async fn retrieve_sigfox_backend(
        &self,
        id: &str,
    ) -> Result<Option<SigfoxBackend>, StoreError> {
        Ok(self
            .read()?
            .sigfox_backends
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn create_sigfox_backend(&self, backend: &SigfoxBackend) -> Result<(), StoreError> {
        self.write()?.sigfox_backends.push(backend.clone());
        Ok(())
    }
}

#[async_trait]
impl BrainStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}
