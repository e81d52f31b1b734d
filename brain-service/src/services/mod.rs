//! Services layer: storage, tokens, permissions, tenant scoping and the
//! startup bootstrap.

mod database;
pub mod memory;
pub mod permission;
pub mod setup;
pub mod store;
pub mod tenant_filter;
pub mod token;

pub use database::MongoDb;
pub use memory::InMemoryStore;
pub use permission::{PermissionRegistry, PermissionService};
pub use store::{BrainStore, StoreError};
pub use token::{TokenError, TokenService};
