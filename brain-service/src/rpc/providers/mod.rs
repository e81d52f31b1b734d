pub mod api_user_auth;
pub mod auth;
pub mod human_user_administrator;
pub mod party_record_handler;
pub mod party_registrar;
pub mod permission_administrator;
pub mod role_record_handler;
pub mod sigfox_backend_administrator;
pub mod sigfox_callback;

pub use api_user_auth::ApiUserAuthProvider;
pub use auth::AuthProvider;
pub use human_user_administrator::HumanUserAdministrator;
pub use party_record_handler::PartyRecordHandler;
pub use party_registrar::PartyRegistrar;
pub use permission_administrator::PermissionAdministrator;
pub use role_record_handler::RoleRecordHandler;
pub use sigfox_backend_administrator::SigfoxBackendAdministrator;
pub use sigfox_callback::SigfoxBackendCallbackServer;

use crate::models::{PartyType, ServicePermissions};

/// Permission lists of every built-in provider. Available before any
/// provider is constructed so the registry can be compiled first.
pub fn declared_permissions() -> Vec<ServicePermissions> {
    let mut declared = vec![
        auth::permissions(),
        api_user_auth::permissions(),
        permission_administrator::permissions(),
        role_record_handler::permissions(),
        party_registrar::permissions(),
        human_user_administrator::permissions(),
        sigfox_backend_administrator::permissions(),
        sigfox_callback::permissions(),
    ];
    declared.extend(PartyType::ALL.iter().map(|pt| party_record_handler::permissions(*pt)));
    declared
}
