use super::store::{
    ApiUserStore, BrainStore, HumanUserStore, PartyStore, RoleStore, SigfoxBackendStore, StoreError,
};
use crate::models::{
    ApiUser, Filter, HumanUser, Party, PartyRecord, PartyType, Role, SigfoxBackend,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for brain-service");

        for party_type in PartyType::ALL {
            create_unique_index(&self.parties(party_type), "id", "party_id_unique").await?;
        }
        create_unique_index(&self.roles(), "name", "role_name_unique").await?;
        create_unique_index(&self.users(), "id", "user_id_unique").await?;
        create_unique_index(&self.users(), "username", "user_username_unique").await?;
        create_unique_index(&self.users(), "emailAddress", "user_email_unique").await?;
        create_unique_index(&self.api_users(), "id", "api_user_id_unique").await?;
        create_unique_index(&self.api_users(), "username", "api_user_username_unique").await?;
        create_unique_index(&self.sigfox_backends(), "id", "sigfox_backend_id_unique").await?;

        Ok(())
    }

    pub fn parties(&self, party_type: PartyType) -> Collection<PartyRecord> {
        self.db.collection(party_type.collection())
    }

    pub fn roles(&self) -> Collection<Role> {
        self.db.collection("role")
    }

    pub fn users(&self) -> Collection<HumanUser> {
        self.db.collection("user")
    }

    pub fn api_users(&self) -> Collection<ApiUser> {
        self.db.collection("apiUser")
    }

    pub fn sigfox_backends(&self) -> Collection<SigfoxBackend> {
        self.db.collection("sigfoxBackend")
    }
}

async fn create_unique_index<T: Send + Sync>(
    collection: &Collection<T>,
    field: &str,
    name: &str,
) -> Result<(), AppError> {
    let mut keys = Document::new();
    keys.insert(field, 1);

    let index = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build(),
        )
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(
            "Failed to create {} index on {} collection: {}",
            name,
            collection.name(),
            e
        );
        AppError::from(e)
    })?;
    tracing::info!("Created index on {}.{}", collection.name(), field);
    Ok(())
}

#[async_trait]
impl PartyStore for MongoDb {
    async fn find_parties(
        &self,
        party_type: PartyType,
        filter: &Filter,
    ) -> Result<Vec<Party>, StoreError> {
        let records: Vec<PartyRecord> = self
            .parties(party_type)
            .find(filter.to_document(), None)
            .await?
            .try_collect()
            .await?;
        Ok(records
            .into_iter()
            .map(|r| Party::new(party_type, r))
            .collect())
    }

    async fn find_one_party(
        &self,
        party_type: PartyType,
        filter: &Filter,
    ) -> Result<Option<Party>, StoreError> {
        let record = self
            .parties(party_type)
            .find_one(filter.to_document(), None)
            .await?;
        Ok(record.map(|r| Party::new(party_type, r)))
    }

    async fn create_party(&self, party: &Party) -> Result<(), StoreError> {
        self.parties(party.party_type())
            .insert_one(party.record(), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MongoDb {
    async fn retrieve_role(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.roles().find_one(doc! { "name": name }, None).await?)
    }

    async fn create_role(&self, role: &Role) -> Result<(), StoreError> {
        self.roles().insert_one(role, None).await?;
        Ok(())
    }

    async fn update_role(&self, role: &Role) -> Result<(), StoreError> {
        let result = self
            .roles()
            .replace_one(doc! { "name": role.name.as_str() }, role, None)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("role"));
        }
        Ok(())
    }
}

#[async_trait]
impl HumanUserStore for MongoDb {
    async fn find_one_user(&self, filter: &Filter) -> Result<Option<HumanUser>, StoreError> {
        Ok(self.users().find_one(filter.to_document(), None).await?)
    }

    async fn create_user(&self, user: &HumanUser) -> Result<(), StoreError> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    async fn update_user(&self, user: &HumanUser) -> Result<(), StoreError> {
        let result = self
            .users()
            .replace_one(doc! { "id": user.id.as_str() }, user, None)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }
}

#[async_trait]
impl ApiUserStore for MongoDb {
    async fn retrieve_api_user(&self, id: &str) -> Result<Option<ApiUser>, StoreError> {
        Ok(self.api_users().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_one_api_user(&self, filter: &Filter) -> Result<Option<ApiUser>, StoreError> {
        Ok(self.api_users().find_one(filter.to_document(), None).await?)
    }

    async fn create_api_user(&self, api_user: &ApiUser) -> Result<(), StoreError> {
        self.api_users().insert_one(api_user, None).await?;
        Ok(())
    }
}

#[async_trait]
impl SigfoxBackendStore for MongoDb {
    async fn retrieve_sigfox_backend(
        &self,
        id: &str,
    ) -> Result<Option<SigfoxBackend>, StoreError> {
        Ok(self.sigfox_backends().find_one(doc! { "id": id }, None).await?)
    }

    async fn create_sigfox_backend(&self, backend: &SigfoxBackend) -> Result<(), StoreError> {
        self.sigfox_backends().insert_one(backend, None).await?;
        Ok(())
    }
}

#[async_trait]
impl BrainStore for MongoDb {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }
}
