//! Storage collaborators consumed by the core.
//!
//! Every query takes a [`Filter`]; callers that read tenant-owned data pass
//! a filter that has already been through [`crate::services::tenant_filter`].

use crate::models::{ApiUser, Filter, HumanUser, Party, PartyType, Role, SigfoxBackend};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(anyhow::Error::new(err))
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(err: bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => {
                AppError::NotFound(anyhow::anyhow!("{} not found", entity))
            }
            StoreError::Database(e) => AppError::DatabaseError(e),
            StoreError::Serialization(e) => AppError::InternalError(anyhow::anyhow!(e)),
        }
    }
}

#[async_trait]
pub trait PartyStore: Send + Sync {
    async fn find_parties(
        &self,
        party_type: PartyType,
        filter: &Filter,
    ) -> Result<Vec<Party>, StoreError>;

    async fn find_one_party(
        &self,
        party_type: PartyType,
        filter: &Filter,
    ) -> Result<Option<Party>, StoreError>;

    async fn create_party(&self, party: &Party) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn retrieve_role(&self, name: &str) -> Result<Option<Role>, StoreError>;

    async fn create_role(&self, role: &Role) -> Result<(), StoreError>;

    /// Replaces the stored role with the same name.
    async fn update_role(&self, role: &Role) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HumanUserStore: Send + Sync {
    async fn find_one_user(&self, filter: &Filter) -> Result<Option<HumanUser>, StoreError>;

    async fn create_user(&self, user: &HumanUser) -> Result<(), StoreError>;

    /// Replaces the stored user with the same id.
    async fn update_user(&self, user: &HumanUser) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ApiUserStore: Send + Sync {
    async fn retrieve_api_user(&self, id: &str) -> Result<Option<ApiUser>, StoreError>;

    async fn find_one_api_user(&self, filter: &Filter) -> Result<Option<ApiUser>, StoreError>;

    async fn create_api_user(&self, api_user: &ApiUser) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SigfoxBackendStore: Send + Sync {
    async fn retrieve_sigfox_backend(
        &self,
        id: &str,
    ) -> Result<Option<SigfoxBackend>, StoreError>;

    async fn create_sigfox_backend(&self, backend: &SigfoxBackend) -> Result<(), StoreError>;
}

/// Everything the service needs from storage, behind one trait object.
#[async_trait]
pub trait BrainStore:
    PartyStore + RoleStore + HumanUserStore + ApiUserStore + SigfoxBackendStore
{
    async fn health_check(&self) -> Result<(), StoreError>;
}
