pub mod authoriser;

pub use authoriser::{authorise_middleware, Authorised, AuthorisedCall, Authoriser};
