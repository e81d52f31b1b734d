//! Startup bootstrap: tier roles, the System party and the root user.
//!
//! Runs once before the server accepts traffic. Every step finds what is
//! already stored before creating anything, so repeated starts converge on
//! the same records.

use super::permission::PermissionRegistry;
use super::store::{BrainStore, HumanUserStore, PartyStore, RoleStore};
use crate::config::BootstrapConfig;
use crate::models::{
    Claims, HumanUser, Identifier, LoginClaims, Party, PartyRecord, PartyType, Role, TenantRole,
};
use crate::utils::password::{hash_password_blocking, Password};
use anyhow::Context;
use chrono::Utc;

pub const ROOT_PARTY_NAME: &str = "root";
pub const ROOT_USERNAME: &str = "root";
pub const ROOT_EMAIL_ADDRESS: &str = "root@root.com";

/// Seeds the tier roles and the root tenant, then returns the System
/// claims the process acts under for internal calls.
pub async fn setup(
    store: &dyn BrainStore,
    registry: &PermissionRegistry,
    bootstrap: &BootstrapConfig,
) -> Result<Claims, anyhow::Error> {
    setup_roles(store, registry).await?;
    let system = setup_system_party(store).await?;
    let root = setup_root_user(store, &system, bootstrap).await?;

    let record = system.record();
    Ok(Claims::HumanUserLogin(LoginClaims {
        user_id: root.id,
        issue_time: Utc::now().timestamp(),
        expiration_time: i64::MAX,
        party_type: PartyType::System,
        party_id: record.id.clone(),
        parent_party_type: PartyType::System,
        parent_id: record.id.clone(),
    }))
}

/// Creates missing tier roles and rewrites any whose permission list has
/// drifted from the registry.
pub async fn setup_roles(
    store: &dyn BrainStore,
    registry: &PermissionRegistry,
) -> Result<(), anyhow::Error> {
    for tier in TenantRole::ALL {
        let name = tier.role_name();
        let permissions: Vec<_> = registry.tier(tier).into_iter().collect();

        match store
            .retrieve_role(name)
            .await
            .with_context(|| format!("Failed to retrieve role {}", name))?
        {
            None => {
                store
                    .create_role(&Role::new(name, permissions))
                    .await
                    .with_context(|| format!("Failed to create role {}", name))?;
                tracing::info!(role = name, "Role created");
            }
            Some(mut role) if !role.has_same_permissions(&permissions) => {
                role.permissions = permissions;
                store
                    .update_role(&role)
                    .await
                    .with_context(|| format!("Failed to update role {}", name))?;
                tracing::info!(role = name, "Role permissions updated");
            }
            Some(_) => {}
        }
    }
    Ok(())
}

async fn setup_system_party(store: &dyn BrainStore) -> Result<Party, anyhow::Error> {
    let by_name = Identifier::name(ROOT_PARTY_NAME).to_filter();
    if let Some(system) = store
        .find_one_party(PartyType::System, &by_name)
        .await
        .context("Failed to retrieve System party")?
    {
        return Ok(system);
    }

    let id = uuid::Uuid::new_v4().to_string();
    let system = Party::System(PartyRecord {
        id: id.clone(),
        name: ROOT_PARTY_NAME.to_string(),
        admin_email_address: ROOT_EMAIL_ADDRESS.to_string(),
        parent_party_type: PartyType::System,
        parent_id: id,
    });
    store
        .create_party(&system)
        .await
        .context("Failed to create System party")?;

    tracing::info!(party_id = %system.record().id, "System party created");
    Ok(system)
}

async fn setup_root_user(
    store: &dyn BrainStore,
    system: &Party,
    bootstrap: &BootstrapConfig,
) -> Result<HumanUser, anyhow::Error> {
    let password = match &bootstrap.root_password_file {
        Some(path) => Some(read_password_file(path).await?),
        None => None,
    };

    let root = store_root_user(store, system, password).await?;

    // only once the password is stored, so a failed start can be retried
    if let Some(path) = &bootstrap.root_password_file {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove root password file {}", path))?;
    }
    Ok(root)
}

async fn store_root_user(
    store: &dyn BrainStore,
    system: &Party,
    password: Option<Password>,
) -> Result<HumanUser, anyhow::Error> {
    let by_username = Identifier::username(ROOT_USERNAME).to_filter();
    let existing = store
        .find_one_user(&by_username)
        .await
        .context("Failed to retrieve root user")?;

    match (existing, password) {
        (Some(root), None) => Ok(root),
        (Some(mut root), Some(password)) => {
            root.password_hash = hash_password_blocking(password).await?;
            store
                .update_user(&root)
                .await
                .context("Failed to update root user password")?;
            tracing::info!(user_id = %root.id, "Root user password replaced from file");
            Ok(root)
        }
        (None, password) => {
            let password = password.unwrap_or_else(|| {
                tracing::warn!(
                    "No root password file configured; root user created with a random \
                     password. Restart with ROOT_PASSWORD_FILE to set one"
                );
                Password::generate()
            });

            let record = system.record();
            let root = HumanUser {
                id: uuid::Uuid::new_v4().to_string(),
                name: ROOT_USERNAME.to_string(),
                surname: ROOT_USERNAME.to_string(),
                username: ROOT_USERNAME.to_string(),
                email_address: ROOT_EMAIL_ADDRESS.to_string(),
                password_hash: hash_password_blocking(password).await?,
                roles: vec![TenantRole::System.role_name().to_string()],
                party_type: PartyType::System,
                party_id: record.id.clone(),
                parent_party_type: PartyType::System,
                parent_id: record.id.clone(),
                registered: true,
            };
            store
                .create_user(&root)
                .await
                .context("Failed to create root user")?;

            tracing::info!(user_id = %root.id, "Root user created");
            Ok(root)
        }
    }
}

async fn read_password_file(path: &str) -> Result<Password, anyhow::Error> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read root password file {}", path))?;

    let password = Password::new(contents.trim_end_matches(['\r', '\n']).to_string());
    if password.is_blank() {
        anyhow::bail!("Root password file {} is empty", path);
    }
    Ok(password)
}
