pub mod claims;
pub mod filter;
pub mod identifier;
pub mod party;
pub mod permission;
pub mod role;
pub mod sigfox;
pub mod user;

pub use claims::{
    Claims, ClaimsKind, LoginClaims, RegistrationClaims, ResetPasswordClaims, SigfoxBackendClaims,
};
pub use filter::Filter;
pub use identifier::{Identifier, IdentifierError, IdentifierKind};
pub use party::{Party, PartyRecord, PartyType, TenantLocation};
pub use permission::{Permission, ServicePermissions, TenantRole};
pub use role::Role;
pub use sigfox::SigfoxBackend;
pub use user::{ApiUser, HumanUser, SanitizedHumanUser};
